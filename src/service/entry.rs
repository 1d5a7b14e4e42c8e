//! Entry service
//!
//! Per-user consumption records. Ownership is enforced here, not in storage.

use std::sync::Arc;

use super::UserContext;
use crate::data::{Database, Entry, EntryFields, EntryStatus, MediaType};
use crate::error::AppError;

/// Entry service
#[derive(Clone)]
pub struct EntryService {
    db: Arc<Database>,
}

impl EntryService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create an entry for the caller
    ///
    /// # Errors
    /// `NotFound` if the referenced media item does not exist
    pub async fn create(
        &self,
        ctx: &UserContext,
        media_id: &str,
        fields: &EntryFields,
    ) -> Result<Entry, AppError> {
        if self.db.get_media(media_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let entry = self.db.insert_entry(&ctx.user_id, media_id, fields).await?;
        tracing::debug!(entry_id = %entry.id, media_id, "Entry created");
        Ok(entry)
    }

    /// Get one of the caller's entries
    pub async fn get(&self, ctx: &UserContext, id: &str) -> Result<Entry, AppError> {
        let entry = self.db.get_entry(id).await?.ok_or(AppError::NotFound)?;
        if entry.user_id != ctx.user_id {
            return Err(AppError::Forbidden);
        }
        Ok(entry)
    }

    /// List the caller's entries, most recently updated first
    pub async fn list(
        &self,
        ctx: &UserContext,
        status: Option<EntryStatus>,
        media_type: Option<MediaType>,
    ) -> Result<Vec<Entry>, AppError> {
        self.db
            .list_entries_by_user(&ctx.user_id, status, media_type)
            .await
    }

    /// The caller's entries for one media item, most recently updated first
    pub async fn list_for_media(
        &self,
        ctx: &UserContext,
        media_id: &str,
    ) -> Result<Vec<Entry>, AppError> {
        self.db
            .list_entries_by_user_and_media(&ctx.user_id, media_id)
            .await
    }

    /// Replace the editable fields of one of the caller's entries
    pub async fn update(
        &self,
        ctx: &UserContext,
        id: &str,
        fields: &EntryFields,
    ) -> Result<Entry, AppError> {
        self.get(ctx, id).await?;
        self.db
            .update_entry(id, fields)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete(&self, ctx: &UserContext, id: &str) -> Result<(), AppError> {
        self.get(ctx, id).await?;
        if !self.db.delete_entry(id).await? {
            return Err(AppError::NotFound);
        }

        tracing::debug!(entry_id = %id, "Entry deleted");
        Ok(())
    }
}
