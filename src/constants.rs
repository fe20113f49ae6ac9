/// The only backup document format the server produces or accepts
pub const BACKUP_FORMAT_JSON: &str = "json";

/// Content type used when serving backup blobs
pub const BACKUP_CONTENT_TYPE: &str = "application/json";

/// Log when a backup document exceeds this size (10MB)
pub const WARN_BACKUP_SIZE_BYTES: usize = 10_485_760;

/// Default cap on the remaining lifetime of a bearer token (24 hours)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

/// Default lifetime of a signed download link (1 hour)
pub const DEFAULT_DOWNLOAD_LINK_TTL_SECS: i64 = 3600;

// =============================================================================
// Google OAuth / Calendar
// =============================================================================

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Scopes requested on every authorization
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Lifetime of the signed `state` tying an OAuth callback to its user (10 minutes)
pub const OAUTH_STATE_TTL_SECS: i64 = 600;

/// Calendar used when the integration has no explicit calendar id
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Upper bound on events returned by a single fetch
pub const MAX_CALENDAR_EVENTS: u32 = 250;

/// Colour applied to events coming from Google Calendar
pub const GOOGLE_EVENT_COLOR: &str = "#4285F4";

/// `extendedProps.type` tag for Google Calendar events
pub const GOOGLE_EVENT_TYPE: &str = "google";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message when the events request names another user
pub const ERR_USER_MISMATCH: &str = "Requested user does not match the authenticated user";

/// Error message when an OAuth callback arrives without a code
pub const ERR_MISSING_AUTH_CODE: &str = "Missing authorization code";

/// Error message when an OAuth callback arrives without its state
pub const ERR_MISSING_OAUTH_STATE: &str = "Missing OAuth state";
