use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Backup not found")]
    BackupNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Calendar integration not found")]
    IntegrationNotFound,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unsupported backup format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid backup document: {0}")]
    InvalidDocument(String),

    #[error("Blob storage error: {0}")]
    Storage(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Calendar authorization expired, please reconnect")]
    ReauthorizationRequired,
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                internal()
            }
            AppError::Transaction(ref e) => {
                tracing::error!("Transaction error: {:?}", e);
                internal()
            }
            AppError::Table(ref e) => {
                tracing::error!("Table error: {:?}", e);
                internal()
            }
            AppError::RedbStorage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                internal()
            }
            AppError::Commit(ref e) => {
                tracing::error!("Commit error: {:?}", e);
                internal()
            }
            AppError::Encoding(ref e) => {
                tracing::error!("Encoding error: {:?}", e);
                internal()
            }
            AppError::Json(ref e) => {
                tracing::error!("JSON error: {:?}", e);
                internal()
            }
            AppError::Io(ref e) => {
                tracing::error!("I/O error: {:?}", e);
                internal()
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                internal()
            }
            AppError::Http(ref e) => {
                tracing::error!("HTTP client error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::BackupNotFound => (StatusCode::NOT_FOUND, "Backup not found".to_string()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::IntegrationNotFound => (
                StatusCode::NOT_FOUND,
                "Calendar integration not found".to_string(),
            ),
            AppError::RecordNotFound => (StatusCode::NOT_FOUND, "Record not found".to_string()),
            AppError::BlobNotFound(_) => {
                (StatusCode::NOT_FOUND, "Backup file not found".to_string())
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnsupportedFormat(format) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported backup format: {}", format),
            ),
            AppError::UnknownCollection(name) => (
                StatusCode::BAD_REQUEST,
                format!("Unknown collection: {}", name),
            ),
            AppError::InvalidDocument(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid backup document: {}", msg),
            ),
            AppError::Storage(msg) => {
                tracing::error!("Blob storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::ReauthorizationRequired => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Calendar authorization expired, please reconnect".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
