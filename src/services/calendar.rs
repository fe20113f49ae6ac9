//! Google Calendar bridge: OAuth connection and event fetch.
//!
//! Per user the integration moves between disconnected (no tokens),
//! connected (tokens stored) and back to disconnected when a refresh fails
//! or the user disconnects.

use std::sync::Arc;

use crate::constants::DEFAULT_CALENDAR_ID;
use crate::error::{AppError, Result};
use crate::models::CalendarEvent;
use crate::repos::{CalendarProvider, IntegrationStore};
use crate::AppState;

pub struct CalendarBridge {
    integrations: Arc<dyn IntegrationStore>,
    provider: Arc<dyn CalendarProvider>,
}

impl CalendarBridge {
    pub fn new(integrations: Arc<dyn IntegrationStore>, provider: Arc<dyn CalendarProvider>) -> Self {
        Self {
            integrations,
            provider,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.integrations.clone(), state.calendar.clone())
    }

    pub fn authorization_url(&self, state: &str) -> Result<String> {
        self.provider.authorization_url(state)
    }

    /// Exchange an authorization code and store the tokens for `user_id`
    ///
    /// The Google account's email must be the email of `user_id`'s profile.
    pub async fn complete_authorization(&self, code: &str, user_id: &str) -> Result<()> {
        let tokens = self.provider.exchange_code(code).await?;
        let email = self.provider.account_email(&tokens.access_token).await?;

        let profile = self
            .integrations
            .find_profile_by_email(&email)
            .await?
            .ok_or_else(|| {
                tracing::warn!("No profile matches Google account {}", email);
                AppError::UserNotFound
            })?;

        if profile.id != user_id {
            tracing::warn!(
                "Google account {} belongs to user {}, not {}",
                email,
                profile.id,
                user_id
            );
            return Err(AppError::Conflict(
                "Google account does not match your profile email".to_string(),
            ));
        }

        if tokens.refresh_token.is_none() {
            tracing::warn!("Google issued no refresh token for user {}", profile.id);
        }

        self.integrations
            .store_tokens(
                &profile.id,
                &tokens.access_token,
                tokens.refresh_token.as_deref(),
            )
            .await?;

        tracing::info!("Google Calendar connected for user {}", profile.id);
        Ok(())
    }

    /// Upcoming events for `user_id`
    ///
    /// With a stored refresh token the access token is refreshed before every
    /// fetch. A failed refresh disconnects the integration.
    pub async fn fetch_events(&self, user_id: &str) -> Result<Vec<CalendarEvent>> {
        let integration = self
            .integrations
            .get(user_id)
            .await?
            .ok_or(AppError::IntegrationNotFound)?;

        let mut access_token = integration.google_access_token.clone();

        if let Some(refresh_token) = integration.google_refresh_token.as_deref() {
            match self.provider.refresh_access_token(refresh_token).await {
                Ok(tokens) => {
                    self.integrations
                        .update_access_token(user_id, &tokens.access_token)
                        .await?;
                    access_token = Some(tokens.access_token);
                }
                Err(e) => {
                    tracing::warn!("Token refresh failed for user {}: {}", user_id, e);
                    if let Err(clear) = self.integrations.clear_tokens(user_id).await {
                        tracing::error!("Failed to clear tokens for user {}: {}", user_id, clear);
                    }
                    return Err(AppError::ReauthorizationRequired);
                }
            }
        }

        let access_token = access_token.ok_or(AppError::IntegrationNotFound)?;
        let calendar_id = integration
            .google_calendar_id
            .as_deref()
            .unwrap_or(DEFAULT_CALENDAR_ID);

        let events = self.provider.list_events(&access_token, calendar_id).await?;
        Ok(events.into_iter().map(CalendarEvent::from).collect())
    }

    /// Forget the stored tokens
    pub async fn disconnect(&self, user_id: &str) -> Result<()> {
        if !self.integrations.clear_tokens(user_id).await? {
            return Err(AppError::IntegrationNotFound);
        }
        tracing::info!("Google Calendar disconnected for user {}", user_id);
        Ok(())
    }
}
