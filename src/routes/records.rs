use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::CollectionRows;
use crate::routes::parse_collection;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ListRecordsResponse {
    pub rows: CollectionRows,
}

#[derive(Debug, Serialize)]
pub struct UpsertRecordResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteRecordResponse {
    pub deleted: bool,
}

/// GET /api/collections/:name
pub async fn list_records(
    State(state): State<AppState>,
    user: AuthUser,
    Path(name): Path<String>,
) -> Result<Json<ListRecordsResponse>> {
    let collection = parse_collection(&name)?;
    let rows = state.records.fetch_owned(&user.user_id, collection).await?;
    Ok(Json(ListRecordsResponse { rows }))
}

/// Insert or replace one row
///
/// PUT /api/collections/:name
///
/// The row must pass the collection's schema and be owned by the caller.
pub async fn upsert_record(
    State(state): State<AppState>,
    user: AuthUser,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<UpsertRecordResponse>> {
    let collection = parse_collection(&name)?;

    if !body.is_object() {
        return Err(AppError::InvalidInput(
            "Request body must be a single row object".to_string(),
        ));
    }

    let rows = CollectionRows::from_json(collection, body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid {} row: {}", collection, e)))?;

    let id = rows.ids().into_iter().next().unwrap_or_default();
    state.records.upsert(&user.user_id, rows).await?;

    tracing::debug!("Upserted {} row {} for user {}", collection, id, user.user_id);
    Ok(Json(UpsertRecordResponse { id }))
}

/// DELETE /api/collections/:name/:id
pub async fn delete_record(
    State(state): State<AppState>,
    user: AuthUser,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<DeleteRecordResponse>> {
    let collection = parse_collection(&name)?;

    if !state.records.remove(&user.user_id, collection, &id).await? {
        return Err(AppError::RecordNotFound);
    }

    Ok(Json(DeleteRecordResponse { deleted: true }))
}
