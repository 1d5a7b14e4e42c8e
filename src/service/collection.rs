//! Collection service
//!
//! Named, ordered groupings of a user's entries.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use super::UserContext;
use crate::data::{Collection, CollectionWithEntries, Database, EntityId};
use crate::error::AppError;

/// Partial update of a collection; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    /// Replaces the whole membership, in this order
    #[serde(default)]
    pub entry_ids: Option<Vec<String>>,
}

/// Collection service
#[derive(Clone)]
pub struct CollectionService {
    db: Arc<Database>,
}

impl CollectionService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a collection, optionally seeded with entries in the given order
    pub async fn create(
        &self,
        ctx: &UserContext,
        title: &str,
        is_public: bool,
        entry_ids: &[String],
    ) -> Result<CollectionWithEntries, AppError> {
        let title = require_title(title)?;
        self.check_entries_owned(ctx, entry_ids).await?;

        let collection = Collection {
            id: EntityId::new().0,
            user_id: ctx.user_id.clone(),
            title,
            is_public,
            created_at: Utc::now(),
        };
        self.db.insert_collection(&collection, entry_ids).await?;

        tracing::debug!(collection_id = %collection.id, entries = entry_ids.len(), "Collection created");
        self.with_entries(collection).await
    }

    /// Get a collection with its members
    ///
    /// Public collections are readable by any user; private ones only by
    /// their owner.
    pub async fn get(
        &self,
        ctx: &UserContext,
        id: &str,
    ) -> Result<CollectionWithEntries, AppError> {
        let collection = self.find(id).await?;
        if collection.user_id != ctx.user_id && !collection.is_public {
            return Err(AppError::Forbidden);
        }
        self.with_entries(collection).await
    }

    /// List the caller's collections, newest first (members not included)
    pub async fn list(&self, ctx: &UserContext) -> Result<Vec<Collection>, AppError> {
        self.db.list_collections_by_user(&ctx.user_id).await
    }

    pub async fn update(
        &self,
        ctx: &UserContext,
        id: &str,
        update: CollectionUpdate,
    ) -> Result<CollectionWithEntries, AppError> {
        let mut collection = self.find_owned(ctx, id).await?;

        if let Some(title) = update.title {
            collection.title = require_title(&title)?;
        }
        if let Some(is_public) = update.is_public {
            collection.is_public = is_public;
        }

        if let Some(entry_ids) = &update.entry_ids {
            self.check_entries_owned(ctx, entry_ids).await?;
        }

        if !self
            .db
            .update_collection(&collection.id, &collection.title, collection.is_public)
            .await?
        {
            return Err(AppError::NotFound);
        }

        if let Some(entry_ids) = &update.entry_ids {
            self.db
                .replace_collection_entries(&collection.id, entry_ids)
                .await?;
        }

        self.with_entries(collection).await
    }

    pub async fn delete(&self, ctx: &UserContext, id: &str) -> Result<(), AppError> {
        self.find_owned(ctx, id).await?;
        if !self.db.delete_collection(id).await? {
            return Err(AppError::NotFound);
        }

        tracing::debug!(collection_id = %id, "Collection deleted");
        Ok(())
    }

    /// Append entries after the current last position; existing members are kept in place
    pub async fn add_entries(
        &self,
        ctx: &UserContext,
        id: &str,
        entry_ids: &[String],
    ) -> Result<CollectionWithEntries, AppError> {
        let collection = self.find_owned(ctx, id).await?;
        self.check_entries_owned(ctx, entry_ids).await?;
        self.db
            .add_collection_entries(&collection.id, entry_ids)
            .await?;

        self.with_entries(collection).await
    }

    pub async fn remove_entries(
        &self,
        ctx: &UserContext,
        id: &str,
        entry_ids: &[String],
    ) -> Result<CollectionWithEntries, AppError> {
        let collection = self.find_owned(ctx, id).await?;
        self.db
            .remove_collection_entries(&collection.id, entry_ids)
            .await?;

        self.with_entries(collection).await
    }

    /// Collection with members resolved now, without any access check
    pub(crate) async fn get_with_entries(
        &self,
        id: &str,
    ) -> Result<CollectionWithEntries, AppError> {
        let collection = self.find(id).await?;
        self.with_entries(collection).await
    }

    /// Owned collection, `Forbidden` for anyone else
    pub(crate) async fn find_owned(
        &self,
        ctx: &UserContext,
        id: &str,
    ) -> Result<Collection, AppError> {
        let collection = self.find(id).await?;
        if collection.user_id != ctx.user_id {
            return Err(AppError::Forbidden);
        }
        Ok(collection)
    }

    async fn find(&self, id: &str) -> Result<Collection, AppError> {
        self.db.get_collection(id).await?.ok_or(AppError::NotFound)
    }

    async fn with_entries(
        &self,
        collection: Collection,
    ) -> Result<CollectionWithEntries, AppError> {
        let entries = self.db.get_collection_entries(&collection.id).await?;
        Ok(CollectionWithEntries {
            collection,
            entries,
        })
    }

    async fn check_entries_owned(
        &self,
        ctx: &UserContext,
        entry_ids: &[String],
    ) -> Result<(), AppError> {
        for entry_id in entry_ids {
            let entry = self
                .db
                .get_entry(entry_id)
                .await?
                .ok_or(AppError::NotFound)?;
            if entry.user_id != ctx.user_id {
                return Err(AppError::Forbidden);
            }
        }
        Ok(())
    }
}

fn require_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    Ok(title.to_string())
}
