//! API layer
//!
//! HTTP handlers for:
//! - Auth (password-less login)
//! - Media catalog, entries and sync
//! - Collections and share tokens
//! - Guest snapshot and merge
//! - Metrics (Prometheus)

mod auth;
mod collections;
mod entries;
mod guest;
mod media;
pub mod metrics;
mod share;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;
use crate::data::ShareToken;

pub use metrics::metrics_router;

/// Generic `{ "message": ... }` body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Issued share token as returned to clients
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub token: String,
    pub share_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ShareToken> for ShareResponse {
    fn from(share: ShareToken) -> Self {
        Self {
            share_url: format!("/s/{}", share.token),
            token: share.token,
            expires_at: share.expires_at,
        }
    }
}

/// Create the `/api` router
///
/// Authentication is enforced per handler by the `CurrentUser` extractor;
/// login, guest snapshot and share resolution are public.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Media catalog
        .route("/media", post(media::create_media))
        .route("/media/search", get(media::search_media))
        .route(
            "/media/:id",
            get(media::get_media).put(media::update_media),
        )
        // Entries
        .route(
            "/entries",
            get(entries::list_entries).post(entries::create_entry),
        )
        .route("/entries/sync", post(entries::sync_entries))
        .route(
            "/entries/:id",
            get(entries::get_entry)
                .patch(entries::update_entry)
                .delete(entries::delete_entry),
        )
        // Collections
        .route(
            "/collections",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/collections/:id",
            get(collections::get_collection)
                .patch(collections::update_collection)
                .delete(collections::delete_collection),
        )
        .route(
            "/collections/:id/entries",
            post(collections::add_entries).delete(collections::remove_entries),
        )
        .route("/collections/:id/share", post(collections::share_collection))
        // Sharing
        .route("/share/profile", post(share::share_profile))
        .route("/s/:token", get(share::resolve_share))
        // Guests
        .route("/guest/snapshot", post(guest::create_snapshot))
        .route("/guest/merge", post(guest::merge_into_account))
}

/// Public share links (`/s/:token`) outside the `/api` prefix
pub fn share_link_router() -> Router<AppState> {
    Router::new().route("/s/:token", get(share::resolve_share))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_response_points_at_public_link() {
        let share = ShareToken::issue(
            "ab".repeat(16),
            crate::data::ShareKind::Collection,
            "c1",
            Utc::now(),
        );
        let expires_at = share.expires_at;

        let response = ShareResponse::from(share);
        assert_eq!(response.share_url, format!("/s/{}", "ab".repeat(16)));
        assert_eq!(response.token.len(), 32);
        assert_eq!(response.expires_at, expires_at);
    }
}
