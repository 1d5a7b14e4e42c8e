//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with embedded migrations.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};

use super::models::*;
use crate::error::AppError;

/// Maximum rows returned by a catalog search
pub const MEDIA_SEARCH_LIMIT: i64 = 20;

const MEDIA_COLUMNS: &str = "id, type, title, original_title, year, cover_url, creators, genres, \
     duration, metadata, created_at";

/// Entry columns plus the joined media item, prefixed with `m_`.
///
/// Media is LEFT JOINed so a dangling `media_id` surfaces as an error
/// instead of silently dropping the entry.
const ENTRY_COLUMNS: &str = r#"
    SELECT e.id, e.user_id, e.media_id, e.status, e.rating, e.review_md, e.progress,
           e.started_at, e.finished_at, e.updated_at,
           m.id AS m_id, m.type AS m_type, m.title AS m_title,
           m.original_title AS m_original_title, m.year AS m_year,
           m.cover_url AS m_cover_url, m.creators AS m_creators, m.genres AS m_genres,
           m.duration AS m_duration, m.metadata AS m_metadata, m.created_at AS m_created_at
"#;

const ENTRY_FROM: &str = "FROM entries e LEFT JOIN media_items m ON m.id = e.media_id";

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: String,
    #[sqlx(rename = "type")]
    media_type: String,
    title: String,
    original_title: Option<String>,
    year: Option<i32>,
    cover_url: Option<String>,
    creators: Option<String>,
    genres: Option<String>,
    duration: Option<i32>,
    metadata: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MediaRow> for MediaItem {
    type Error = AppError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        Ok(MediaItem {
            media_type: row
                .media_type
                .parse()
                .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?,
            creators: decode_json(row.creators, "media_items.creators")?,
            genres: decode_json(row.genres, "media_items.genres")?,
            metadata: decode_json(row.metadata, "media_items.metadata")?,
            id: row.id,
            title: row.title,
            original_title: row.original_title,
            year: row.year,
            cover_url: row.cover_url,
            duration: row.duration,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: String,
    user_id: String,
    media_id: String,
    status: String,
    rating: Option<f64>,
    review_md: Option<String>,
    progress: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    m_id: Option<String>,
    m_type: Option<String>,
    m_title: Option<String>,
    m_original_title: Option<String>,
    m_year: Option<i32>,
    m_cover_url: Option<String>,
    m_creators: Option<String>,
    m_genres: Option<String>,
    m_duration: Option<i32>,
    m_metadata: Option<String>,
    m_created_at: Option<DateTime<Utc>>,
}

impl TryFrom<EntryRow> for Entry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let (Some(m_id), Some(m_created_at)) = (row.m_id, row.m_created_at) else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "entry {} references missing media item {}",
                row.id,
                row.media_id
            )));
        };

        let media = MediaItem::try_from(MediaRow {
            id: m_id,
            media_type: row.m_type.unwrap_or_default(),
            title: row.m_title.unwrap_or_default(),
            original_title: row.m_original_title,
            year: row.m_year,
            cover_url: row.m_cover_url,
            creators: row.m_creators,
            genres: row.m_genres,
            duration: row.m_duration,
            metadata: row.m_metadata,
            created_at: m_created_at,
        })?;

        Ok(Entry {
            status: row
                .status
                .parse()
                .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?,
            progress: decode_json(row.progress, "entries.progress")?,
            id: row.id,
            user_id: row.user_id,
            media_id: row.media_id,
            rating: row.rating,
            review_md: row.review_md,
            started_at: row.started_at,
            finished_at: row.finished_at,
            updated_at: row.updated_at,
            media,
        })
    }
}

fn encode_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>, AppError> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| AppError::Internal(e.into()))
}

fn decode_json<T: DeserializeOwned>(
    raw: Option<String>,
    column: &str,
) -> Result<Option<T>, AppError> {
    raw.map(|raw| {
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid JSON in {column}: {e}")))
    })
    .transpose()
}

/// Build a LIKE pattern matching `query` as a literal substring
fn substring_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn collect_entries(rows: Vec<EntryRow>) -> Result<Vec<Entry>, AppError> {
    rows.into_iter().map(Entry::try_from).collect()
}

/// Append entries to a collection at sequential positions.
///
/// Existing members are skipped without consuming a position.
async fn append_collection_entries(
    conn: &mut SqliteConnection,
    collection_id: &str,
    entry_ids: &[String],
) -> Result<(), AppError> {
    let mut next_position: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM collection_entries WHERE collection_id = ?",
    )
    .bind(collection_id)
    .fetch_one(&mut *conn)
    .await?;

    for entry_id in entry_ids {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO collection_entries (collection_id, entry_id, position)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(collection_id)
        .bind(entry_id)
        .bind(next_position)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() > 0 {
            next_position += 1;
        }
    }

    Ok(())
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by e-mail address
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Insert user unless the e-mail is already registered
    ///
    /// Returns `true` if the row was inserted.
    pub async fn insert_user_if_absent(&self, user: &User) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Media catalog
    // =========================================================================

    /// Insert a new media item
    pub async fn insert_media(&self, media: &MediaItem) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO media_items (
                id, type, title, original_title, year, cover_url,
                creators, genres, duration, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&media.id)
        .bind(media.media_type.as_str())
        .bind(&media.title)
        .bind(&media.original_title)
        .bind(media.year)
        .bind(&media.cover_url)
        .bind(encode_json(&media.creators)?)
        .bind(encode_json(&media.genres)?)
        .bind(media.duration)
        .bind(encode_json(&media.metadata)?)
        .bind(media.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get media item by ID
    pub async fn get_media(&self, id: &str) -> Result<Option<MediaItem>, AppError> {
        let row = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media_items WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MediaItem::try_from).transpose()
    }

    /// Overwrite descriptive fields of a media item
    ///
    /// Returns `false` if no item has this ID.
    pub async fn update_media(&self, media: &MediaItem) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE media_items SET
                type = ?, title = ?, original_title = ?, year = ?, cover_url = ?,
                creators = ?, genres = ?, duration = ?, metadata = ?
            WHERE id = ?
            "#,
        )
        .bind(media.media_type.as_str())
        .bind(&media.title)
        .bind(&media.original_title)
        .bind(media.year)
        .bind(&media.cover_url)
        .bind(encode_json(&media.creators)?)
        .bind(encode_json(&media.genres)?)
        .bind(media.duration)
        .bind(encode_json(&media.metadata)?)
        .bind(&media.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Case-insensitive substring search on title
    ///
    /// Ordered by title ignoring case (ties by id), capped at
    /// [`MEDIA_SEARCH_LIMIT`]. Case folding is ASCII-only (SQLite `LIKE`).
    pub async fn search_media(
        &self,
        query: &str,
        media_type: Option<MediaType>,
    ) -> Result<Vec<MediaItem>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {MEDIA_COLUMNS} FROM media_items WHERE title LIKE "
        ));
        builder.push_bind(substring_pattern(query));
        builder.push(r" ESCAPE '\'");
        if let Some(media_type) = media_type {
            builder.push(" AND type = ").push_bind(media_type.as_str());
        }
        builder.push(" ORDER BY title COLLATE NOCASE, id LIMIT ");
        builder.push_bind(MEDIA_SEARCH_LIMIT);

        let rows = builder
            .build_query_as::<MediaRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MediaItem::try_from).collect()
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Insert a new entry and return it with its media joined
    pub async fn insert_entry(
        &self,
        user_id: &str,
        media_id: &str,
        fields: &EntryFields,
    ) -> Result<Entry, AppError> {
        let id = EntityId::new().0;
        sqlx::query(
            r#"
            INSERT INTO entries (
                id, user_id, media_id, status, rating, review_md, progress,
                started_at, finished_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(media_id)
        .bind(fields.status.as_str())
        .bind(fields.rating)
        .bind(&fields.review_md)
        .bind(encode_json(&fields.progress)?)
        .bind(fields.started_at)
        .bind(fields.finished_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_entry(&id).await?.ok_or(AppError::NotFound)
    }

    /// Get entry by ID with its media item
    pub async fn get_entry(&self, id: &str) -> Result<Option<Entry>, AppError> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "{ENTRY_COLUMNS} {ENTRY_FROM} WHERE e.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Entry::try_from).transpose()
    }

    /// List a user's entries, most recently updated first
    pub async fn list_entries_by_user(
        &self,
        user_id: &str,
        status: Option<EntryStatus>,
        media_type: Option<MediaType>,
    ) -> Result<Vec<Entry>, AppError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("{ENTRY_COLUMNS} {ENTRY_FROM} WHERE e.user_id = "));
        builder.push_bind(user_id);
        if let Some(status) = status {
            builder.push(" AND e.status = ").push_bind(status.as_str());
        }
        if let Some(media_type) = media_type {
            builder.push(" AND m.type = ").push_bind(media_type.as_str());
        }
        builder.push(" ORDER BY e.updated_at DESC, e.id DESC");

        let rows = builder
            .build_query_as::<EntryRow>()
            .fetch_all(&self.pool)
            .await?;

        collect_entries(rows)
    }

    /// List a user's entries for one media item, most recently updated first
    pub async fn list_entries_by_user_and_media(
        &self,
        user_id: &str,
        media_id: &str,
    ) -> Result<Vec<Entry>, AppError> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            "{ENTRY_COLUMNS} {ENTRY_FROM} WHERE e.user_id = ? AND e.media_id = ? \
             ORDER BY e.updated_at DESC, e.id DESC"
        ))
        .bind(user_id)
        .bind(media_id)
        .fetch_all(&self.pool)
        .await?;

        collect_entries(rows)
    }

    /// Replace the editable fields of an entry and bump `updated_at`
    ///
    /// Returns `None` if no entry has this ID.
    pub async fn update_entry(
        &self,
        id: &str,
        fields: &EntryFields,
    ) -> Result<Option<Entry>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE entries SET
                status = ?, rating = ?, review_md = ?, progress = ?,
                started_at = ?, finished_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.status.as_str())
        .bind(fields.rating)
        .bind(&fields.review_md)
        .bind(encode_json(&fields.progress)?)
        .bind(fields.started_at)
        .bind(fields.finished_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_entry(id).await
    }

    /// Delete entry (also removes it from every collection)
    pub async fn delete_entry(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Collections
    // =========================================================================

    /// Insert a new collection
    ///
    /// Seed members are appended in order within the same transaction, so a
    /// failed member insert leaves no collection behind.
    pub async fn insert_collection(
        &self,
        collection: &Collection,
        entry_ids: &[String],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO collections (id, user_id, title, is_public, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.user_id)
        .bind(&collection.title)
        .bind(collection.is_public)
        .bind(collection.created_at)
        .execute(&mut *tx)
        .await?;
        append_collection_entries(&mut *tx, &collection.id, entry_ids).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Get collection by ID (without members)
    pub async fn get_collection(&self, id: &str) -> Result<Option<Collection>, AppError> {
        let collection = sqlx::query_as::<_, Collection>(
            "SELECT id, user_id, title, is_public, created_at FROM collections WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(collection)
    }

    /// List a user's collections, newest first
    pub async fn list_collections_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Collection>, AppError> {
        let collections = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, user_id, title, is_public, created_at
            FROM collections WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(collections)
    }

    /// Update collection title and visibility
    pub async fn update_collection(
        &self,
        id: &str,
        title: &str,
        is_public: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE collections SET title = ?, is_public = ? WHERE id = ?")
            .bind(title)
            .bind(is_public)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete collection and its memberships
    pub async fn delete_collection(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Append entries to a collection atomically
    pub async fn add_collection_entries(
        &self,
        collection_id: &str,
        entry_ids: &[String],
    ) -> Result<(), AppError> {
        if entry_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        append_collection_entries(&mut *tx, collection_id, entry_ids).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Replace the whole membership list atomically
    pub async fn replace_collection_entries(
        &self,
        collection_id: &str,
        entry_ids: &[String],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM collection_entries WHERE collection_id = ?")
            .bind(collection_id)
            .execute(&mut *tx)
            .await?;
        append_collection_entries(&mut *tx, collection_id, entry_ids).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Remove entries from a collection
    ///
    /// Positions of remaining members are left as-is; ordering stays stable.
    pub async fn remove_collection_entries(
        &self,
        collection_id: &str,
        entry_ids: &[String],
    ) -> Result<u64, AppError> {
        if entry_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut removed = 0;
        for entry_id in entry_ids {
            let result = sqlx::query(
                "DELETE FROM collection_entries WHERE collection_id = ? AND entry_id = ?",
            )
            .bind(collection_id)
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;
            removed += result.rows_affected();
        }
        tx.commit().await?;

        Ok(removed)
    }

    /// Members of a collection in position order, media joined
    pub async fn get_collection_entries(
        &self,
        collection_id: &str,
    ) -> Result<Vec<Entry>, AppError> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            {ENTRY_COLUMNS}
            FROM collection_entries ce
            JOIN entries e ON e.id = ce.entry_id
            LEFT JOIN media_items m ON m.id = e.media_id
            WHERE ce.collection_id = ?
            ORDER BY ce.position ASC
            "#
        ))
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;

        collect_entries(rows)
    }

    // =========================================================================
    // Share tokens
    // =========================================================================

    /// Persist a share token
    pub async fn insert_share_token(&self, share: &ShareToken) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO share_tokens (token, kind, target_id, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&share.token)
        .bind(&share.kind)
        .bind(&share.target_id)
        .bind(share.created_at)
        .bind(share.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a share token
    pub async fn get_share_token(&self, token: &str) -> Result<Option<ShareToken>, AppError> {
        let share = sqlx::query_as::<_, ShareToken>(
            "SELECT token, kind, target_id, created_at, expires_at FROM share_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(share)
    }

    // =========================================================================
    // Test helpers
    // =========================================================================

    /// Delete a media row while bypassing foreign keys, leaving entries dangling
    #[cfg(test)]
    pub async fn delete_media_unchecked_for_test(&self, media_id: &str) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("PRAGMA foreign_keys = OFF")
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM media_items WHERE id = ?")
            .bind(media_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Store a share token with an arbitrary kind string
    #[cfg(test)]
    pub async fn set_share_kind_for_test(&self, token: &str, kind: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE share_tokens SET kind = ? WHERE token = ?")
            .bind(kind)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
