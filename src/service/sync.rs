//! Sync reconciler
//!
//! Merges a client-submitted batch of (media, entry) pairs into a user's
//! records. Items are processed one at a time in submission order; a
//! failing item is recorded and the batch moves on.

use std::future::Future;

use serde::Deserialize;

use super::{EntryService, MediaResolver, UserContext};
use crate::data::{Entry, EntryFields, MediaSpec};
use crate::error::AppError;
use crate::metrics::{SYNC_BATCHES_TOTAL, SYNC_ITEMS_TOTAL};

/// One submitted item: a media description plus the entry fields to apply
#[derive(Debug, Clone, Deserialize)]
pub struct SyncItem {
    pub media: MediaSpec,
    #[serde(flatten)]
    pub fields: EntryFields,
}

/// Outcome of a single item
///
/// `warnings` are recorded even when the item itself succeeds.
#[derive(Debug, Clone)]
pub struct SyncItemResult {
    pub outcome: Result<Entry, String>,
    pub warnings: Vec<String>,
}

impl SyncItemResult {
    fn failed(message: String, warnings: Vec<String>) -> Self {
        Self {
            outcome: Err(message),
            warnings,
        }
    }
}

/// Per-item results of a batch, in submission order
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub items: Vec<SyncItemResult>,
}

impl SyncReport {
    pub fn synced_count(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.is_ok()).count()
    }

    /// Warnings and failure messages, in the order they occurred
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for item in &self.items {
            errors.extend(item.warnings.iter().cloned());
            if let Err(message) = &item.outcome {
                errors.push(message.clone());
            }
        }
        errors
    }

    pub fn message(&self) -> String {
        let errors = self.errors().len();
        if errors == 0 {
            "Entries synced successfully".to_string()
        } else {
            format!("Synced {} entries with {} errors", self.synced_count(), errors)
        }
    }

    pub fn into_synced_entries(self) -> Vec<Entry> {
        self.items
            .into_iter()
            .filter_map(|item| item.outcome.ok())
            .collect()
    }
}

/// Entry operations the reconciler needs, scoped to one user
pub trait EntryRepository {
    /// Existing entries for (user, media), most recently updated first
    fn list_for_media(
        &self,
        ctx: &UserContext,
        media_id: &str,
    ) -> impl Future<Output = Result<Vec<Entry>, AppError>> + Send;

    fn create(
        &self,
        ctx: &UserContext,
        media_id: &str,
        fields: &EntryFields,
    ) -> impl Future<Output = Result<Entry, AppError>> + Send;

    fn update(
        &self,
        ctx: &UserContext,
        entry_id: &str,
        fields: &EntryFields,
    ) -> impl Future<Output = Result<Entry, AppError>> + Send;
}

impl EntryRepository for EntryService {
    async fn list_for_media(
        &self,
        ctx: &UserContext,
        media_id: &str,
    ) -> Result<Vec<Entry>, AppError> {
        EntryService::list_for_media(self, ctx, media_id).await
    }

    async fn create(
        &self,
        ctx: &UserContext,
        media_id: &str,
        fields: &EntryFields,
    ) -> Result<Entry, AppError> {
        EntryService::create(self, ctx, media_id, fields).await
    }

    async fn update(
        &self,
        ctx: &UserContext,
        entry_id: &str,
        fields: &EntryFields,
    ) -> Result<Entry, AppError> {
        EntryService::update(self, ctx, entry_id, fields).await
    }
}

/// Batch reconciler over a media resolver and an entry repository
pub struct SyncReconciler<R, E> {
    resolver: R,
    entries: E,
}

impl<R, E> SyncReconciler<R, E>
where
    R: MediaResolver + Sync,
    E: EntryRepository + Sync,
{
    pub fn new(resolver: R, entries: E) -> Self {
        Self { resolver, entries }
    }

    /// Reconcile a batch for the caller; never fails as a whole
    pub async fn sync(&self, ctx: &UserContext, items: Vec<SyncItem>) -> SyncReport {
        let mut report = SyncReport::default();

        for item in items {
            let result = self.sync_item(ctx, item).await;
            let outcome = if result.outcome.is_ok() { "synced" } else { "failed" };
            SYNC_ITEMS_TOTAL.with_label_values(&[outcome]).inc();
            report.items.push(result);
        }

        let failed = report.items.len() - report.synced_count();
        SYNC_BATCHES_TOTAL
            .with_label_values(&[if failed == 0 { "clean" } else { "partial" }])
            .inc();
        tracing::info!(
            user_id = %ctx.user_id,
            items = report.items.len(),
            synced = report.synced_count(),
            failed,
            "Sync batch processed"
        );

        report
    }

    async fn sync_item(&self, ctx: &UserContext, item: SyncItem) -> SyncItemResult {
        let SyncItem { media, fields } = item;
        let title = media.title.clone();
        let mut warnings = Vec::new();

        if title.trim().is_empty() {
            return SyncItemResult::failed(
                "Error creating media : title cannot be empty".to_string(),
                warnings,
            );
        }

        let media = match self.resolver.resolve_or_create(&media).await {
            Ok(media) => media,
            Err(error) => {
                return SyncItemResult::failed(
                    format!("Error creating media {title}: {error}"),
                    warnings,
                );
            }
        };

        let existing = match self.entries.list_for_media(ctx, &media.id).await {
            Ok(existing) => existing,
            Err(error) => {
                warnings.push(format!(
                    "Error checking existing entries for media {title}: {error}"
                ));
                Vec::new()
            }
        };

        let outcome = match existing.first() {
            Some(current) => self
                .entries
                .update(ctx, &current.id, &fields)
                .await
                .map_err(|error| format!("Error updating entry {}: {error}", current.id)),
            None => self
                .entries
                .create(ctx, &media.id, &fields)
                .await
                .map_err(|error| format!("Error creating entry for media {title}: {error}")),
        };

        if let Err(message) = &outcome {
            tracing::warn!(user_id = %ctx.user_id, %message, "Sync item failed");
        }

        SyncItemResult { outcome, warnings }
    }
}
