//! Collection endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::ShareResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Collection, CollectionWithEntries};
use crate::error::AppError;
use crate::service::CollectionUpdate;

/// Create collection request
#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub title: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub entry_ids: Vec<String>,
}

/// Add or remove members request
#[derive(Debug, Deserialize)]
pub struct EntryIdsRequest {
    pub entry_ids: Vec<String>,
}

/// GET /api/collections
/// Collections owned by the caller
pub async fn list_collections(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<Vec<Collection>>, AppError> {
    Ok(Json(state.collections().list(&ctx).await?))
}

/// POST /api/collections
pub async fn create_collection(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(req): Json<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<CollectionWithEntries>), AppError> {
    let collection = state
        .collections()
        .create(&ctx, &req.title, req.is_public, &req.entry_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

/// GET /api/collections/:id
pub async fn get_collection(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CollectionWithEntries>, AppError> {
    Ok(Json(state.collections().get(&ctx, &id).await?))
}

/// PATCH /api/collections/:id
pub async fn update_collection(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<CollectionUpdate>,
) -> Result<Json<CollectionWithEntries>, AppError> {
    Ok(Json(state.collections().update(&ctx, &id, update).await?))
}

/// DELETE /api/collections/:id
pub async fn delete_collection(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.collections().delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/collections/:id/entries
pub async fn add_entries(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<EntryIdsRequest>,
) -> Result<Json<CollectionWithEntries>, AppError> {
    let collection = state
        .collections()
        .add_entries(&ctx, &id, &req.entry_ids)
        .await?;
    Ok(Json(collection))
}

/// DELETE /api/collections/:id/entries
pub async fn remove_entries(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<EntryIdsRequest>,
) -> Result<Json<CollectionWithEntries>, AppError> {
    let collection = state
        .collections()
        .remove_entries(&ctx, &id, &req.entry_ids)
        .await?;
    Ok(Json(collection))
}

/// POST /api/collections/:id/share
pub async fn share_collection(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ShareResponse>, AppError> {
    let share = state.shares().share_collection(&ctx, &id).await?;
    Ok(Json(ShareResponse::from(share)))
}
