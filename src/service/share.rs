//! Share token service
//!
//! Issues opaque read-only tokens and resolves them back to content.
//! Tokens carry an expiry which is only checked when
//! `share.enforce_expiry` is on.

use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;
use serde::Serialize;

use super::{CollectionService, UserContext};
use crate::data::{CollectionWithEntries, Database, EntityId, Entry, ShareKind, ShareToken};
use crate::error::AppError;
use crate::metrics::{SHARE_RESOLUTIONS_TOTAL, SHARE_TOKENS_ISSUED};

const TOKEN_BYTES: usize = 16;

/// Content behind a resolved share token
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SharedContent {
    Collection(CollectionWithEntries),
    Profile(Vec<Entry>),
}

/// Share token service
#[derive(Clone)]
pub struct ShareService {
    db: Arc<Database>,
    collections: CollectionService,
    enforce_expiry: bool,
}

impl ShareService {
    pub fn new(db: Arc<Database>, enforce_expiry: bool) -> Self {
        Self {
            collections: CollectionService::new(db.clone()),
            db,
            enforce_expiry,
        }
    }

    /// Issue and persist a token for `kind`/`target_id`
    ///
    /// A token collision is not retried; it surfaces as a database error.
    pub async fn issue(&self, kind: ShareKind, target_id: &str) -> Result<ShareToken, AppError> {
        let share = ShareToken::issue(generate_token(), kind, target_id, Utc::now());
        self.db.insert_share_token(&share).await?;

        SHARE_TOKENS_ISSUED.with_label_values(&[kind.as_str()]).inc();
        tracing::info!(%kind, target_id, expires_at = ?share.expires_at, "Share token issued");
        Ok(share)
    }

    /// Share one of the caller's collections
    pub async fn share_collection(
        &self,
        ctx: &UserContext,
        collection_id: &str,
    ) -> Result<ShareToken, AppError> {
        let collection = self.collections.find_owned(ctx, collection_id).await?;
        self.issue(ShareKind::Collection, &collection.id).await
    }

    /// Share the caller's whole entry list
    pub async fn share_profile(&self, ctx: &UserContext) -> Result<ShareToken, AppError> {
        self.issue(ShareKind::Profile, &ctx.user_id).await
    }

    /// Issue a guest snapshot token
    ///
    /// The submitted payload is not stored, so the token resolves to
    /// `UnknownShareKind`.
    pub async fn issue_guest_snapshot(&self) -> Result<ShareToken, AppError> {
        self.issue(ShareKind::Snapshot, &EntityId::new().0).await
    }

    /// Resolve a token to the content it currently points at
    pub async fn resolve(&self, token: &str) -> Result<SharedContent, AppError> {
        let result = self.resolve_inner(token).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(AppError::NotFound) => "not_found",
            Err(AppError::UnknownShareKind(_)) => "unknown_kind",
            Err(_) => "error",
        };
        SHARE_RESOLUTIONS_TOTAL.with_label_values(&[outcome]).inc();

        result
    }

    async fn resolve_inner(&self, token: &str) -> Result<SharedContent, AppError> {
        let share = self
            .db
            .get_share_token(token)
            .await?
            .ok_or(AppError::NotFound)?;

        if self.enforce_expiry && share.is_expired_at(Utc::now()) {
            tracing::debug!(kind = %share.kind, "Expired share token rejected");
            return Err(AppError::NotFound);
        }

        match share.share_kind() {
            Some(ShareKind::Collection) => Ok(SharedContent::Collection(
                self.collections.get_with_entries(&share.target_id).await?,
            )),
            Some(ShareKind::Profile) => Ok(SharedContent::Profile(
                self.db
                    .list_entries_by_user(&share.target_id, None, None)
                    .await?,
            )),
            Some(ShareKind::Snapshot) | None => Err(AppError::UnknownShareKind(share.kind)),
        }
    }
}

/// 16 random bytes from the OS-seeded thread RNG, lowercase hex
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
