//! Lawdesk Server Library
//!
//! Backup/restore of a practice's case data, per-collection record access
//! and the Google Calendar bridge, exported for the binary and for tests.

pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod google;
pub mod models;
pub mod repos;
pub mod routes;
pub mod security;
pub mod services;
pub mod storage;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use db::{RedbBackupCatalog, RedbCollectionStore, RedbIntegrationStore};
use repos::{BackupCatalog, BlobStore, CalendarProvider, CollectionStore, IntegrationStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub records: Arc<dyn CollectionStore>,
    pub catalog: Arc<dyn BackupCatalog>,
    pub integrations: Arc<dyn IntegrationStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub config: Config,
}

impl AppState {
    /// Create an AppState with the redb-backed stores over `db`
    pub fn new(
        db: Db,
        blobs: Arc<dyn BlobStore>,
        calendar: Arc<dyn CalendarProvider>,
        config: Config,
    ) -> Self {
        Self {
            records: Arc::new(RedbCollectionStore::new(db.clone())),
            catalog: Arc::new(RedbBackupCatalog::new(db.clone())),
            integrations: Arc::new(RedbIntegrationStore::new(db.clone())),
            db,
            blobs,
            calendar,
            config,
        }
    }
}

/// Build the API router over `state`
pub fn build_router(state: AppState) -> Router {
    use routes::*;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/backups", post(create_backup).get(list_backups))
        .route("/api/backups/restore", post(restore_backup))
        .route("/api/backups/download", get(download_backup))
        .route("/api/backups/:id", delete(delete_backup))
        .route("/api/backups/:id/link", post(create_download_link))
        .route("/api/calendar/auth", get(calendar_auth))
        .route("/api/calendar/callback", get(calendar_callback))
        .route("/api/calendar/events", post(calendar_events))
        .route("/api/calendar/integration", delete(calendar_disconnect))
        .route("/api/collections/:name", get(list_records).put(upsert_record))
        .route("/api/collections/:name/:id", delete(delete_record))
        .with_state(state)
}
