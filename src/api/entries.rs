//! Entry endpoints, including batch sync

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Entry, EntryFields, EntryStatus, MediaType};
use crate::error::AppError;
use crate::service::SyncItem;

/// Create entry request
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub media_id: String,
    #[serde(flatten)]
    pub fields: EntryFields,
}

/// List filters
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<EntryStatus>,
    #[serde(rename = "type")]
    pub media_type: Option<MediaType>,
}

/// Sync request
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub entries: Vec<SyncItem>,
}

/// Sync response
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub synced_entries: Vec<Entry>,
    pub count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub message: String,
}

/// GET /api/entries?status=&type=
pub async fn list_entries(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Entry>>, AppError> {
    let entries = state
        .entries()
        .list(&ctx, params.status, params.media_type)
        .await?;
    Ok(Json(entries))
}

/// POST /api/entries
pub async fn create_entry(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<Entry>), AppError> {
    let entry = state
        .entries()
        .create(&ctx, &req.media_id, &req.fields)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/entries/:id
pub async fn get_entry(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Entry>, AppError> {
    Ok(Json(state.entries().get(&ctx, &id).await?))
}

/// PATCH /api/entries/:id
/// Replace the editable fields of an entry
pub async fn update_entry(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
    Json(fields): Json<EntryFields>,
) -> Result<Json<Entry>, AppError> {
    Ok(Json(state.entries().update(&ctx, &id, &fields).await?))
}

/// DELETE /api/entries/:id
pub async fn delete_entry(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.entries().delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/entries/sync
/// Reconcile a client batch; per-item failures are reported, not raised
pub async fn sync_entries(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(req): Json<SyncRequest>,
) -> Json<SyncResponse> {
    let report = state.reconciler().sync(&ctx, req.entries).await;

    let errors = report.errors();
    let message = report.message();
    let synced_entries = report.into_synced_entries();

    Json(SyncResponse {
        count: synced_entries.len(),
        synced_entries,
        errors,
        message,
    })
}
