use std::env;

use crate::constants::{DEFAULT_DOWNLOAD_LINK_TTL_SECS, DEFAULT_SESSION_TTL_SECS};

/// Google OAuth client settings
#[derive(Debug, Clone, Default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub blob_storage_dir: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// HMAC key for bearer session tokens and signed download links
    pub auth_secret: String,
    /// Externally reachable base URL of this server, used in download links
    pub public_base_url: String,
    /// Frontend URL the OAuth callback redirects back to
    pub site_url: String,
    pub google: GoogleConfig,
    /// Longest accepted remaining lifetime of a bearer token
    pub session_ttl_secs: i64,
    pub download_link_ttl_secs: i64,
    pub log_requests: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/lawdesk.db".to_string());

        let blob_storage_dir =
            env::var("BLOB_STORAGE_DIR").unwrap_or_else(|_| "./data/blobs".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let auth_secret = env::var("AUTH_SECRET")
            .map_err(|_| "AUTH_SECRET must be set for session token verification")?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port));

        let site_url =
            env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let google = GoogleConfig {
            client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: env::var("GOOGLE_REDIRECT_URI").unwrap_or_else(|_| {
                format!("{}/api/calendar/callback", public_base_url.trim_end_matches('/'))
            }),
        };

        if google.client_id.is_empty() {
            tracing::warn!("GOOGLE_CLIENT_ID not set, calendar integration will not work");
        }

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_SESSION_TTL_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid SESSION_TTL_SECS")?;

        let download_link_ttl_secs = env::var("DOWNLOAD_LINK_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_DOWNLOAD_LINK_TTL_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid DOWNLOAD_LINK_TTL_SECS")?;

        let log_requests = env::var("LOG_REQUESTS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Config {
            server_host,
            server_port,
            database_path,
            blob_storage_dir,
            allowed_origins,
            environment,
            auth_secret,
            public_base_url,
            site_url,
            google,
            session_ttl_secs,
            download_link_ttl_secs,
            log_requests,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
