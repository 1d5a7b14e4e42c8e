//! Media catalog endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{MediaItem, MediaSpec, MediaType};
use crate::error::AppError;

/// Search parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<MediaType>,
}

/// POST /api/media
pub async fn create_media(
    State(state): State<AppState>,
    CurrentUser(_ctx): CurrentUser,
    Json(spec): Json<MediaSpec>,
) -> Result<Json<MediaItem>, AppError> {
    if spec.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    Ok(Json(state.catalog().create(spec).await?))
}

/// GET /api/media/search?q=&type=
/// Open to guests; the catalog is shared and read-only here
pub async fn search_media(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<MediaItem>>, AppError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Query parameter 'q' is required".to_string()))?;

    Ok(Json(state.catalog().search(query, params.media_type).await?))
}

/// GET /api/media/:id
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaItem>, AppError> {
    Ok(Json(state.catalog().get(&id).await?))
}

/// PUT /api/media/:id
/// Replace every descriptive field of an item
pub async fn update_media(
    State(state): State<AppState>,
    CurrentUser(_ctx): CurrentUser,
    Path(id): Path<String>,
    Json(spec): Json<MediaSpec>,
) -> Result<Json<MediaItem>, AppError> {
    if spec.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    Ok(Json(state.catalog().update(&id, spec).await?))
}
