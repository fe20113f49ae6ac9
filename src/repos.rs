//! Ports used by the services.
//!
//! Each trait is implemented once against the real backend (redb tables, the
//! blob directory, Google's HTTP APIs) and handed to the services through
//! [`crate::AppState`]. Tests substitute their own implementations.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    BackupRecord, Collection, CollectionRows, OAuthTokens, Profile, ProviderEvent, UserIntegration,
};

/// Counts from replacing one collection's rows for a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub deleted: usize,
    pub inserted: usize,
}

/// Per-collection row access, always scoped to one owner
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// All rows of `collection` owned by `user_id`
    async fn fetch_owned(&self, user_id: &str, collection: Collection) -> Result<CollectionRows>;

    /// Delete every row of the collection owned by `user_id`, then insert
    /// `rows`, as a single transaction
    async fn replace_owned(&self, user_id: &str, rows: CollectionRows) -> Result<ReplaceOutcome>;

    /// Insert or overwrite `rows` for `user_id`
    async fn upsert(&self, user_id: &str, rows: CollectionRows) -> Result<usize>;

    /// Remove one row, returning whether it existed
    async fn remove(&self, user_id: &str, collection: Collection, id: &str) -> Result<bool>;
}

/// Backup metadata rows
#[async_trait]
pub trait BackupCatalog: Send + Sync {
    /// Insert a new row; fails if the storage path is already taken
    async fn insert(&self, record: &BackupRecord) -> Result<()>;

    /// Look up a backup by id, only if owned by `user_id`
    async fn get_owned(&self, user_id: &str, backup_id: &str) -> Result<Option<BackupRecord>>;

    /// All backups of `user_id`, newest first
    async fn list_owned(&self, user_id: &str) -> Result<Vec<BackupRecord>>;

    /// Remove a row, returning whether it existed
    async fn remove(&self, user_id: &str, backup_id: &str) -> Result<bool>;
}

/// Object storage for backup documents
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a new blob; fails if `path` already exists
    async fn put_new(&self, path: &str, bytes: Vec<u8>) -> Result<()>;

    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Remove a blob; removing a missing blob is not an error
    async fn remove(&self, path: &str) -> Result<()>;
}

/// Calendar credentials and the user lookup the OAuth callback needs
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    /// Profile whose email matches exactly
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>>;

    async fn get(&self, user_id: &str) -> Result<Option<UserIntegration>>;

    /// Create or update the integration row with a fresh token pair; a
    /// missing refresh token keeps the stored one
    async fn store_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<UserIntegration>;

    async fn update_access_token(&self, user_id: &str, access_token: &str) -> Result<()>;

    /// Null out both tokens, returning whether a row existed
    async fn clear_tokens(&self, user_id: &str) -> Result<bool>;
}

/// External calendar provider (OAuth + events)
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// URL the user is sent to in order to grant access; `state` comes back
    /// unchanged on the callback
    fn authorization_url(&self, state: &str) -> Result<String>;

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens>;

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens>;

    /// Email address of the account that granted `access_token`
    async fn account_email(&self, access_token: &str) -> Result<String>;

    /// Upcoming events from `calendar_id`, starting now
    async fn list_events(&self, access_token: &str, calendar_id: &str) -> Result<Vec<ProviderEvent>>;
}
