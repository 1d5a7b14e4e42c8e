//! Guest service
//!
//! Guests keep their entries client-side. They can take a share snapshot
//! (payload is not stored) and merge their entries into an account after
//! logging in.

use serde::Deserialize;

use super::{EntryService, ShareService, UserContext};
use crate::data::{Entry, EntryFields, ShareToken};
use crate::error::AppError;

/// Entry held by a guest client, referencing an existing media item
#[derive(Debug, Clone, Deserialize)]
pub struct GuestEntry {
    pub media_id: String,
    #[serde(flatten)]
    pub fields: EntryFields,
}

/// Guest service
#[derive(Clone)]
pub struct GuestService {
    entries: EntryService,
    shares: ShareService,
}

impl GuestService {
    pub fn new(entries: EntryService, shares: ShareService) -> Self {
        Self { entries, shares }
    }

    /// Issue a snapshot share token for a guest
    pub async fn create_snapshot(&self) -> Result<ShareToken, AppError> {
        self.shares.issue_guest_snapshot().await
    }

    /// Copy guest entries into the caller's account, in order
    ///
    /// Stops at the first failure; entries created before it are kept.
    pub async fn merge_into_account(
        &self,
        ctx: &UserContext,
        guest_entries: &[GuestEntry],
    ) -> Result<Vec<Entry>, AppError> {
        let mut merged = Vec::with_capacity(guest_entries.len());
        for guest_entry in guest_entries {
            let entry = self
                .entries
                .create(ctx, &guest_entry.media_id, &guest_entry.fields)
                .await?;
            merged.push(entry);
        }

        tracing::info!(user_id = %ctx.user_id, merged = merged.len(), "Guest entries merged");
        Ok(merged)
    }
}
