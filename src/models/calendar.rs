use serde::{Deserialize, Serialize};

use crate::constants::{GOOGLE_EVENT_COLOR, GOOGLE_EVENT_TYPE};

/// Access/refresh token pair returned by the OAuth provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Start or end of a provider event: either a timestamp or an all-day date
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl EventTime {
    fn value(&self) -> Option<String> {
        self.date_time.clone().or_else(|| self.date.clone())
    }
}

/// Event as returned by the Google Calendar events endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub html_link: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventProps {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Event in the shape the calendar view consumes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub url: Option<String>,
    pub background_color: String,
    pub border_color: String,
    pub extended_props: EventProps,
}

impl From<ProviderEvent> for CalendarEvent {
    fn from(event: ProviderEvent) -> Self {
        let start = event.start.value();
        // All-day and point-in-time events may come without an end
        let end = event.end.value().or_else(|| start.clone());

        Self {
            id: format!("google-{}", event.id),
            title: event
                .summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "(No title)".to_string()),
            start,
            end,
            url: event.html_link,
            background_color: GOOGLE_EVENT_COLOR.to_string(),
            border_color: GOOGLE_EVENT_COLOR.to_string(),
            extended_props: EventProps {
                kind: GOOGLE_EVENT_TYPE.to_string(),
                description: event.description,
                location: event.location,
            },
        }
    }
}
