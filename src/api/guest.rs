//! Guest endpoints

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use super::ShareResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::GuestEntry;

/// Snapshot request
///
/// Both lists are required but their contents are not stored.
#[derive(Debug, Deserialize)]
pub struct SnapshotRequest {
    pub entries: Vec<serde_json::Value>,
    pub media: Vec<serde_json::Value>,
}

/// Merge request
#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub guest_entries: Vec<GuestEntry>,
}

/// Merge response
#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub message: String,
    pub count: usize,
}

/// POST /api/guest/snapshot
pub async fn create_snapshot(
    State(state): State<AppState>,
    Json(req): Json<SnapshotRequest>,
) -> Result<Json<ShareResponse>, AppError> {
    tracing::debug!(
        entries = req.entries.len(),
        media = req.media.len(),
        "Guest snapshot requested"
    );

    let share = state.guests().create_snapshot().await?;
    Ok(Json(ShareResponse::from(share)))
}

/// POST /api/guest/merge
/// Copy guest-held entries into the caller's account
pub async fn merge_into_account(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeResponse>, AppError> {
    let merged = state
        .guests()
        .merge_into_account(&ctx, &req.guest_entries)
        .await?;

    Ok(Json(MergeResponse {
        message: "Guest data merged successfully".to_string(),
        count: merged.len(),
    }))
}
