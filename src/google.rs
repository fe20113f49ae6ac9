//! Google OAuth and Calendar over HTTP.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

use crate::config::GoogleConfig;
use crate::constants::{
    GOOGLE_AUTH_URL, GOOGLE_CALENDAR_API, GOOGLE_SCOPES, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL,
    MAX_CALENDAR_EVENTS,
};
use crate::error::{AppError, Result};
use crate::models::{OAuthTokens, ProviderEvent};
use crate::repos::CalendarProvider;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<ProviderEvent>,
}

/// [`CalendarProvider`] talking to Google's OAuth and Calendar v3 endpoints
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { http, config })
    }

    async fn token_request(&self, params: &[(&str, &str)], action: &str) -> Result<OAuthTokens> {
        let response = self.http.post(GOOGLE_TOKEN_URL).form(params).send().await?;
        read_json(response, action).await
    }
}

/// Decode a successful response, or turn the provider's error body into an
/// upstream error carrying its message
async fn read_json<T: DeserializeOwned>(response: reqwest::Response, action: &str) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Google {} failed with {}: {}", action, status, body);
        return Err(AppError::Upstream(format!(
            "Google {} failed ({}): {}",
            action, status, body
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AppError::Upstream(format!("Unexpected Google {} response: {}", action, e)))
}

fn invalid_url(e: impl std::fmt::Display) -> AppError {
    AppError::Upstream(format!("Invalid Google URL: {}", e))
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    fn authorization_url(&self, state: &str) -> Result<String> {
        let scope = GOOGLE_SCOPES.join(" ");
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                // offline + consent makes Google issue a refresh token every time
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(invalid_url)?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens> {
        self.token_request(
            &[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
            "token exchange",
        )
        .await
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        self.token_request(
            &[
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ],
            "token refresh",
        )
        .await
    }

    async fn account_email(&self, access_token: &str) -> Result<String> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        let info: UserInfo = read_json(response, "user info").await?;
        info.email
            .ok_or_else(|| AppError::Upstream("Google account has no email address".to_string()))
    }

    async fn list_events(&self, access_token: &str, calendar_id: &str) -> Result<Vec<ProviderEvent>> {
        let mut url = Url::parse(GOOGLE_CALENDAR_API).map_err(invalid_url)?;
        url.path_segments_mut()
            .map_err(|_| invalid_url(GOOGLE_CALENDAR_API))?
            .extend(["calendars", calendar_id, "events"]);

        let time_min = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = MAX_CALENDAR_EVENTS.to_string();

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await?;

        let list: EventList = read_json(response, "event fetch").await?;
        tracing::debug!("Fetched {} events from {}", list.items.len(), calendar_id);
        Ok(list.items)
    }
}
