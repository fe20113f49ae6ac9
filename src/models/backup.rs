use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::BACKUP_FORMAT_JSON;
use crate::error::AppError;

/// Metadata row describing one stored backup blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: String,
    pub user_id: String,
    /// Display filename
    pub filename: String,
    pub format: String,
    /// Size of the stored document in bytes
    pub size: u64,
    /// Path of the blob in storage, unique across records
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}

impl BackupRecord {
    /// Build the metadata row for a document about to be stored
    pub fn new(user_id: &str, created_at: DateTime<Utc>, size: u64) -> Self {
        let filename = format!(
            "backup-{}.{}",
            created_at.format("%Y-%m-%dT%H-%M-%S%.3fZ"),
            BACKUP_FORMAT_JSON
        );
        let storage_path = format!("{}/{}", user_id, filename);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            filename,
            format: BACKUP_FORMAT_JSON.to_string(),
            size,
            storage_path,
            created_at,
        }
    }

    /// Reject any format other than the JSON document format
    pub fn validate_format(format: &str) -> Result<(), AppError> {
        if format.eq_ignore_ascii_case(BACKUP_FORMAT_JSON) {
            Ok(())
        } else {
            Err(AppError::UnsupportedFormat(format.to_string()))
        }
    }
}
