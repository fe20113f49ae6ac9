use axum::{
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::config::Config;
use crate::constants::BACKUP_CONTENT_TYPE;
use crate::error::{AppError, Result};
use crate::models::{BackupRecord, Collection};
use crate::routes::timestamp_to_rfc3339;
use crate::security::{sign_download, verify_download};
use crate::services::{BackupService, CollectionRestore};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBackupRequest {
    pub format: String,
    #[serde(default)]
    pub tables: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct CreateBackupResponse {
    pub id: String,
    pub filename: String,
    #[serde(rename = "publicUrl")]
    pub public_url: String,
    pub size: u64,
    pub tables: Vec<Collection>,
}

#[derive(Debug, Deserialize)]
pub struct RestoreBackupRequest {
    pub backup_id: String,
}

#[derive(Debug, Serialize)]
pub struct RestoreBackupResponse {
    pub message: String,
    pub restored: Vec<CollectionRestore>,
    pub failed: Vec<Collection>,
}

#[derive(Debug, Serialize)]
pub struct ListBackupsResponse {
    pub backups: Vec<BackupRecord>,
}

#[derive(Debug, Serialize)]
pub struct DownloadLinkResponse {
    pub url: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub path: String,
    pub expires: i64,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Build a signed, expiring download URL for a stored blob
pub fn download_link(config: &Config, storage_path: &str, now: i64) -> Result<(String, i64)> {
    let expires_at = now + config.download_link_ttl_secs;
    let signature = sign_download(storage_path, expires_at, &config.auth_secret);

    let base = format!(
        "{}/api/backups/download",
        config.public_base_url.trim_end_matches('/')
    );
    let url = Url::parse_with_params(
        &base,
        &[
            ("path", storage_path),
            ("expires", expires_at.to_string().as_str()),
            ("signature", signature.as_str()),
        ],
    )
    .map_err(|e| AppError::Storage(format!("Invalid PUBLIC_BASE_URL: {}", e)))?;

    Ok((url.to_string(), expires_at))
}

/// Create a backup of the caller's data
///
/// POST /api/backups `{ format: "json", tables?: string[] }`
pub async fn create_backup(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBackupRequest>,
) -> Result<Json<CreateBackupResponse>> {
    let tables = payload.tables.unwrap_or_default();
    let created = BackupService::from_state(&state)
        .create(&user.user_id, &payload.format, &tables)
        .await?;

    let (public_url, _) = download_link(
        &state.config,
        &created.record.storage_path,
        Utc::now().timestamp(),
    )?;

    Ok(Json(CreateBackupResponse {
        id: created.record.id,
        filename: created.record.filename,
        public_url,
        size: created.record.size,
        tables: created.tables,
    }))
}

/// Restore the caller's data from one of their backups
///
/// POST /api/backups/restore `{ backup_id }`
///
/// # Note
/// Destructive: every covered collection loses the caller's current rows.
/// Collections are replaced one at a time; `failed` lists those left as
/// they were.
pub async fn restore_backup(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RestoreBackupRequest>,
) -> Result<Json<RestoreBackupResponse>> {
    if payload.backup_id.trim().is_empty() {
        return Err(AppError::InvalidInput("backup_id is required".to_string()));
    }

    let report = BackupService::from_state(&state)
        .restore(&user.user_id, &payload.backup_id)
        .await?;

    let message = if report.failed.is_empty() {
        "Backup restored successfully".to_string()
    } else {
        format!(
            "Backup restored with {} collection(s) not restored",
            report.failed.len()
        )
    };

    Ok(Json(RestoreBackupResponse {
        message,
        restored: report.restored,
        failed: report.failed,
    }))
}

/// List the caller's backups, newest first
pub async fn list_backups(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ListBackupsResponse>> {
    let backups = BackupService::from_state(&state).list(&user.user_id).await?;
    Ok(Json(ListBackupsResponse { backups }))
}

/// Issue a fresh temporary download link for a backup
pub async fn create_download_link(
    State(state): State<AppState>,
    user: AuthUser,
    Path(backup_id): Path<String>,
) -> Result<Json<DownloadLinkResponse>> {
    let record = BackupService::from_state(&state)
        .get(&user.user_id, &backup_id)
        .await?;

    let (url, expires_at) = download_link(
        &state.config,
        &record.storage_path,
        Utc::now().timestamp(),
    )?;

    Ok(Json(DownloadLinkResponse {
        url,
        expires_at: timestamp_to_rfc3339(expires_at),
    }))
}

/// Serve a backup blob through a signed link
///
/// GET /api/backups/download?path=&expires=&signature=
pub async fn download_backup(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response> {
    if !verify_download(
        &params.path,
        params.expires,
        &params.signature,
        &state.config.auth_secret,
        Utc::now().timestamp(),
    ) {
        return Err(AppError::Unauthorized);
    }

    let bytes = BackupService::from_state(&state)
        .read_blob(&params.path)
        .await?;

    let filename = params
        .path
        .rsplit('/')
        .next()
        .unwrap_or("backup.json")
        .replace('"', "");

    tracing::info!("Backup {} downloaded: {} bytes", params.path, bytes.len());

    Ok((
        [
            (CONTENT_TYPE, BACKUP_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Delete a backup: blob first, then its metadata row
pub async fn delete_backup(
    State(state): State<AppState>,
    user: AuthUser,
    Path(backup_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    BackupService::from_state(&state)
        .delete(&user.user_id, &backup_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Backup deleted".to_string(),
    }))
}
