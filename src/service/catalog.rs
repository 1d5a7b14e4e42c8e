//! Media catalog service
//!
//! Global, user-independent store of media items, plus the pluggable
//! de-duplication used by sync.

use std::future::Future;
use std::sync::Arc;

use crate::config::MediaMatchPolicy;
use crate::data::{Database, MediaItem, MediaSpec, MediaType};
use crate::error::AppError;

/// Media catalog service
#[derive(Clone)]
pub struct MediaCatalog {
    db: Arc<Database>,
}

impl MediaCatalog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new media item from a client spec
    pub async fn create(&self, spec: MediaSpec) -> Result<MediaItem, AppError> {
        let media = MediaItem::from_spec(spec);
        self.db.insert_media(&media).await?;

        tracing::debug!(media_id = %media.id, title = %media.title, "Media item created");
        Ok(media)
    }

    pub async fn get(&self, id: &str) -> Result<MediaItem, AppError> {
        self.db.get_media(id).await?.ok_or(AppError::NotFound)
    }

    /// Replace all descriptive fields of an existing item
    pub async fn update(&self, id: &str, spec: MediaSpec) -> Result<MediaItem, AppError> {
        let mut media = self.get(id).await?;
        media.apply_spec(spec);

        if !self.db.update_media(&media).await? {
            return Err(AppError::NotFound);
        }

        Ok(media)
    }

    /// Case-insensitive title substring search, optionally limited to a type
    pub async fn search(
        &self,
        query: &str,
        media_type: Option<MediaType>,
    ) -> Result<Vec<MediaItem>, AppError> {
        self.db.search_media(query, media_type).await
    }
}

/// Maps a submitted media spec onto a catalog item
///
/// Sync depends on this seam instead of the catalog directly, so the
/// de-duplication rule can change without touching the reconciler.
pub trait MediaResolver {
    /// Find the catalog item the spec denotes, creating it when none matches
    fn resolve_or_create(
        &self,
        spec: &MediaSpec,
    ) -> impl Future<Output = Result<MediaItem, AppError>> + Send;
}

/// Catalog-backed resolver applying a [`MediaMatchPolicy`]
#[derive(Clone)]
pub struct CatalogResolver {
    catalog: MediaCatalog,
    policy: MediaMatchPolicy,
}

impl CatalogResolver {
    pub fn new(catalog: MediaCatalog, policy: MediaMatchPolicy) -> Self {
        Self { catalog, policy }
    }

    fn pick(&self, spec: &MediaSpec, hits: Vec<MediaItem>) -> Option<MediaItem> {
        match self.policy {
            MediaMatchPolicy::Substring => hits.into_iter().next(),
            MediaMatchPolicy::Exact => hits.into_iter().find(|item| item.title == spec.title),
        }
    }
}

impl MediaResolver for CatalogResolver {
    async fn resolve_or_create(&self, spec: &MediaSpec) -> Result<MediaItem, AppError> {
        // A failed search is treated like an empty one: fall through to create.
        match self.catalog.search(&spec.title, Some(spec.media_type)).await {
            Ok(hits) => {
                if let Some(existing) = self.pick(spec, hits) {
                    return Ok(existing);
                }
            }
            Err(error) => {
                tracing::warn!(%error, title = %spec.title, "Media search failed during resolve");
            }
        }

        self.catalog.create(spec.clone()).await
    }
}
