use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::constants::{ERR_MISSING_AUTH_CODE, ERR_MISSING_OAUTH_STATE, OAUTH_STATE_TTL_SECS};
use crate::error::{AppError, Result};
use crate::models::CalendarEvent;
use crate::routes::ensure_same_user;
use crate::security::{issue_oauth_state, verify_oauth_state};
use crate::services::CalendarBridge;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    #[serde(rename = "authUrl")]
    pub auth_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventsRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub message: String,
}

/// Start the Google OAuth flow
///
/// GET /api/calendar/auth -> `{ authUrl }`
pub async fn calendar_auth(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AuthUrlResponse>> {
    let oauth_state = issue_oauth_state(
        &user.user_id,
        Utc::now().timestamp() + OAUTH_STATE_TTL_SECS,
        &state.config.auth_secret,
    );
    let auth_url = CalendarBridge::from_state(&state).authorization_url(&oauth_state)?;
    tracing::info!("Calendar authorization started for user {}", user.user_id);
    Ok(Json(AuthUrlResponse { auth_url }))
}

/// OAuth redirect target
///
/// Stores the tokens for the user named in the signed `state`, provided the
/// Google account's email is that user's profile email, then sends the
/// browser back to the calendar page.
pub async fn calendar_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    if let Some(error) = params.error {
        tracing::warn!("Google authorization denied: {}", error);
        return Err(AppError::InvalidInput(format!(
            "Google authorization failed: {}",
            error
        )));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::InvalidInput(ERR_MISSING_AUTH_CODE.to_string()))?;

    let oauth_state = params
        .state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidInput(ERR_MISSING_OAUTH_STATE.to_string()))?;

    let user_id = verify_oauth_state(
        &oauth_state,
        &state.config.auth_secret,
        Utc::now().timestamp(),
        OAUTH_STATE_TTL_SECS,
    )
    .ok_or(AppError::Unauthorized)?;

    CalendarBridge::from_state(&state)
        .complete_authorization(&code, &user_id)
        .await?;

    let target = format!(
        "{}/calendar?google_auth_success=true",
        state.config.site_url.trim_end_matches('/')
    );
    Ok(Redirect::to(&target))
}

/// Fetch upcoming Google Calendar events
///
/// POST /api/calendar/events `{ user_id }`
pub async fn calendar_events(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<EventsRequest>,
) -> Result<Json<EventsResponse>> {
    if let Some(requested) = payload.user_id.as_deref() {
        ensure_same_user(&user, requested)?;
    }

    let events = CalendarBridge::from_state(&state)
        .fetch_events(&user.user_id)
        .await?;

    Ok(Json(EventsResponse { events }))
}

/// Drop the stored Google tokens
pub async fn calendar_disconnect(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DisconnectResponse>> {
    CalendarBridge::from_state(&state)
        .disconnect(&user.user_id)
        .await?;

    Ok(Json(DisconnectResponse {
        message: "Google Calendar disconnected".to_string(),
    }))
}
