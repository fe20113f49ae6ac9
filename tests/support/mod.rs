//! Shared helpers for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use lawdesk_server::config::GoogleConfig;
use lawdesk_server::models::{BackupRecord, Collection, CollectionRows, OAuthTokens, ProviderEvent};
use lawdesk_server::repos::{
    BackupCatalog, BlobStore, CalendarProvider, CollectionStore, ReplaceOutcome,
};
use lawdesk_server::security::{issue_oauth_state, issue_session_token};
use lawdesk_server::storage::FsBlobStore;
use lawdesk_server::{build_router, open_database, AppError, AppState, Config, Db, Result};

pub const TEST_SECRET: &str = "test-secret-key";
pub const PUBLIC_BASE_URL: &str = "http://localhost:8080";
pub const SITE_URL: &str = "http://localhost:5173";

// =============================================================================
// Environment
// =============================================================================

/// Create a test configuration rooted in `temp_dir`
pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_path: temp_dir.path().join("test.db").display().to_string(),
        blob_storage_dir: temp_dir.path().join("blobs").display().to_string(),
        allowed_origins: vec![SITE_URL.to_string()],
        environment: "test".to_string(),
        auth_secret: TEST_SECRET.to_string(),
        public_base_url: PUBLIC_BASE_URL.to_string(),
        site_url: SITE_URL.to_string(),
        google: GoogleConfig::default(),
        session_ttl_secs: 86_400,
        download_link_ttl_secs: 3600,
        log_requests: false,
    }
}

/// A database, blob directory and fake calendar living in one temp dir
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config: Config,
    pub db: Db,
    pub blobs: Arc<FlakyBlobStore>,
    pub calendar: Arc<FakeCalendar>,
    pub record_faults: Arc<RecordFaults>,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let db = open_database(&config.database_path).expect("Failed to create test database");
        let blobs = Arc::new(FlakyBlobStore::new(
            FsBlobStore::open(&config.blob_storage_dir).unwrap(),
        ));

        Self {
            temp_dir,
            config,
            db,
            blobs,
            calendar: Arc::new(FakeCalendar::default()),
            record_faults: Arc::new(RecordFaults::default()),
        }
    }

    pub fn state(&self) -> AppState {
        let mut state = AppState::new(
            self.db.clone(),
            self.blobs.clone(),
            self.calendar.clone(),
            self.config.clone(),
        );
        state.records = Arc::new(FailingRecords {
            inner: state.records.clone(),
            faults: self.record_faults.clone(),
        });
        state
    }

    pub fn app(&self) -> Router {
        build_router(self.state())
    }

    /// Router whose backup catalog rejects every insert
    pub fn app_with_broken_catalog(&self) -> Router {
        let mut state = self.state();
        state.catalog = Arc::new(RejectingCatalog {
            inner: state.catalog.clone(),
        });
        build_router(state)
    }

    /// Files currently stored under `user_id` in the blob directory
    pub fn stored_blobs(&self, user_id: &str) -> usize {
        let dir = std::path::Path::new(&self.config.blob_storage_dir).join(user_id);
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Valid bearer token for `user_id`, good for an hour
pub fn token_for(user_id: &str) -> String {
    issue_session_token(user_id, chrono::Utc::now().timestamp() + 3600, TEST_SECRET)
}

/// Valid OAuth `state` for `user_id`, good for five minutes
pub fn oauth_state_for(user_id: &str) -> String {
    issue_oauth_state(user_id, chrono::Utc::now().timestamp() + 300, TEST_SECRET)
}

/// Build a request, optionally authenticated and with a JSON body
pub fn make_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Parse response body as JSON
pub async fn body_to_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a request and return status and JSON body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = body_to_json(response.into_body()).await;
    (status, body)
}

/// Turn an absolute download URL into a path+query the router accepts
pub fn local_uri(url: &str) -> String {
    let url = reqwest::Url::parse(url).unwrap();
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

// =============================================================================
// Rows
// =============================================================================

pub fn client_row(id: &str, owner: &str, name: &str) -> Value {
    json!({
        "id": id,
        "user_id": owner,
        "name": name,
        "email": format!("{}@clients.example", id),
        "phone": null,
        "address": null,
        "national_id": null,
        "notes": null,
        "created_at": "2024-02-01T09:00:00Z"
    })
}

pub fn case_row(id: &str, owner: &str, client_id: &str) -> Value {
    json!({
        "id": id,
        "user_id": owner,
        "client_id": client_id,
        "case_number": format!("{}/2024", id),
        "title": "Lease dispute",
        "court": "District Court",
        "case_type": "civil",
        "status": "open",
        "opened_on": "2024-02-03",
        "description": null,
        "created_at": "2024-02-03T09:00:00Z"
    })
}

pub fn note_row(id: &str, owner: &str) -> Value {
    json!({
        "id": id,
        "user_id": owner,
        "case_id": null,
        "client_id": null,
        "content": "File the appeal before Friday",
        "created_at": "2024-02-04T09:00:00Z"
    })
}

pub fn profile_row(user_id: &str, email: &str) -> Value {
    json!({
        "id": user_id,
        "email": email,
        "full_name": "Dana Advocate",
        "office_name": null,
        "phone": null,
        "created_at": "2024-01-01T00:00:00Z"
    })
}

/// PUT a row into a collection as `user_id`
pub async fn seed(app: &Router, user_id: &str, collection: &str, row: Value) {
    let token = token_for(user_id);
    let (status, body) = send(
        app,
        make_request(
            "PUT",
            &format!("/api/collections/{}", collection),
            Some(&token),
            Some(row),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "seeding {} failed: {}", collection, body);
}

/// Sorted ids of the caller's rows in a collection
pub async fn ids_in(app: &Router, user_id: &str, collection: &str) -> Vec<String> {
    let token = token_for(user_id);
    let (status, body) = send(
        app,
        make_request(
            "GET",
            &format!("/api/collections/{}", collection),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut ids: Vec<String> = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

// =============================================================================
// Test doubles
// =============================================================================

/// Filesystem blob store whose uploads and removals can be made to fail
pub struct FlakyBlobStore {
    inner: FsBlobStore,
    pub fail_put: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl FlakyBlobStore {
    pub fn new(inner: FsBlobStore) -> Self {
        Self {
            inner,
            fail_put: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put_new(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(AppError::Storage("upload rejected".to_string()));
        }
        self.inner.put_new(path, bytes).await
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.inner.get(path).await
    }

    async fn remove(&self, path: &str) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(AppError::Storage("storage unavailable".to_string()));
        }
        self.inner.remove(path).await
    }
}

/// Collections whose reads or whole-collection replaces fail
#[derive(Default)]
pub struct RecordFaults {
    pub fail_fetch: Mutex<Vec<Collection>>,
    pub fail_replace: Mutex<Vec<Collection>>,
}

impl RecordFaults {
    pub fn fail_fetch_of(&self, collection: Collection) {
        self.fail_fetch.lock().unwrap().push(collection);
    }

    pub fn fail_replace_of(&self, collection: Collection) {
        self.fail_replace.lock().unwrap().push(collection);
    }
}

/// Record store injecting the failures listed in [`RecordFaults`]
pub struct FailingRecords {
    inner: Arc<dyn CollectionStore>,
    faults: Arc<RecordFaults>,
}

#[async_trait]
impl CollectionStore for FailingRecords {
    async fn fetch_owned(&self, user_id: &str, collection: Collection) -> Result<CollectionRows> {
        let failing = self.faults.fail_fetch.lock().unwrap().contains(&collection);
        if failing {
            return Err(AppError::Storage(format!("{} unavailable", collection)));
        }
        self.inner.fetch_owned(user_id, collection).await
    }

    async fn replace_owned(&self, user_id: &str, rows: CollectionRows) -> Result<ReplaceOutcome> {
        let failing = self.faults.fail_replace.lock().unwrap().contains(&rows.collection());
        if failing {
            return Err(AppError::Storage(format!("{} unavailable", rows.collection())));
        }
        self.inner.replace_owned(user_id, rows).await
    }

    async fn upsert(&self, user_id: &str, rows: CollectionRows) -> Result<usize> {
        self.inner.upsert(user_id, rows).await
    }

    async fn remove(&self, user_id: &str, collection: Collection, id: &str) -> Result<bool> {
        self.inner.remove(user_id, collection, id).await
    }
}

/// Catalog that fails every insert and delegates everything else
pub struct RejectingCatalog {
    inner: Arc<dyn BackupCatalog>,
}

#[async_trait]
impl BackupCatalog for RejectingCatalog {
    async fn insert(&self, _record: &BackupRecord) -> Result<()> {
        Err(AppError::Storage("metadata table unavailable".to_string()))
    }

    async fn get_owned(&self, user_id: &str, backup_id: &str) -> Result<Option<BackupRecord>> {
        self.inner.get_owned(user_id, backup_id).await
    }

    async fn list_owned(&self, user_id: &str) -> Result<Vec<BackupRecord>> {
        self.inner.list_owned(user_id).await
    }

    async fn remove(&self, user_id: &str, backup_id: &str) -> Result<bool> {
        self.inner.remove(user_id, backup_id).await
    }
}

/// Calendar provider recording how it was called
#[derive(Default)]
pub struct FakeCalendar {
    pub account_email: Mutex<String>,
    pub fail_refresh: AtomicBool,
    pub refresh_calls: AtomicUsize,
    /// Access tokens `list_events` was called with
    pub listed_with: Mutex<Vec<String>>,
}

impl FakeCalendar {
    pub fn set_account_email(&self, email: &str) {
        *self.account_email.lock().unwrap() = email.to_string();
    }

    pub fn listed_with(&self) -> Vec<String> {
        self.listed_with.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    fn authorization_url(&self, state: &str) -> Result<String> {
        Ok(format!(
            "https://accounts.example/auth?access_type=offline&prompt=consent&state={}",
            state
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens> {
        if code == "bad-code" {
            return Err(AppError::Upstream("Google token exchange failed: invalid_grant".to_string()));
        }
        Ok(OAuthTokens {
            access_token: format!("access-{}", code),
            refresh_token: Some(format!("refresh-{}", code)),
            expires_in: Some(3600),
        })
    }

    async fn refresh_access_token(&self, _refresh_token: &str) -> Result<OAuthTokens> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("Google token refresh failed: invalid_grant".to_string()));
        }
        Ok(OAuthTokens {
            access_token: format!("refreshed-{}", n),
            refresh_token: None,
            expires_in: Some(3600),
        })
    }

    async fn account_email(&self, _access_token: &str) -> Result<String> {
        Ok(self.account_email.lock().unwrap().clone())
    }

    async fn list_events(&self, access_token: &str, _calendar_id: &str) -> Result<Vec<ProviderEvent>> {
        self.listed_with.lock().unwrap().push(access_token.to_string());

        let event: ProviderEvent = serde_json::from_value(json!({
            "id": "evt1",
            "summary": "Hearing: Smith v. Jones",
            "htmlLink": "https://calendar.google.com/event?eid=evt1",
            "start": { "dateTime": "2030-01-10T09:00:00Z" },
            "end": { "dateTime": "2030-01-10T10:00:00Z" }
        }))
        .unwrap();
        Ok(vec![event])
    }
}
