use chrono::{DateTime, Utc};

use crate::auth::AuthUser;
use crate::constants::ERR_USER_MISMATCH;
use crate::error::AppError;
use crate::models::Collection;

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Reject requests that name a user other than the authenticated one
pub fn ensure_same_user(user: &AuthUser, requested: &str) -> Result<(), AppError> {
    if requested != user.user_id {
        tracing::warn!(
            "User {} asked for data of user {}",
            user.user_id,
            requested
        );
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Parse a collection name from the URL
pub fn parse_collection(name: &str) -> Result<Collection, AppError> {
    name.parse()
}
