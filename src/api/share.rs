//! Share token endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};

use super::ShareResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::SharedContent;

/// POST /api/share/profile
/// Share the caller's whole entry list
pub async fn share_profile(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ShareResponse>, AppError> {
    let share = state.shares().share_profile(&ctx).await?;
    Ok(Json(ShareResponse::from(share)))
}

/// GET /s/:token and /api/s/:token
/// Public, read-only view of the shared content
pub async fn resolve_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SharedContent>, AppError> {
    Ok(Json(state.shares().resolve(&token).await?))
}
