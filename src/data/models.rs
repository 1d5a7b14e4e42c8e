//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

/// Open key-value map for free-form fields (creators, metadata, progress)
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of media tracked by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Book,
    Anime,
    Game,
    Tv,
    Movie,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Book => "book",
            Self::Anime => "anime",
            Self::Game => "game",
            Self::Tv => "tv",
            Self::Movie => "movie",
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "video" => Ok(Self::Video),
            "book" => Ok(Self::Book),
            "anime" => Ok(Self::Anime),
            "game" => Ok(Self::Game),
            "tv" => Ok(Self::Tv),
            "movie" => Ok(Self::Movie),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}

/// Consumption status of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Planned,
    InProgress,
    Completed,
    OnHold,
    Dropped,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
            Self::Dropped => "dropped",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "on_hold" => Ok(Self::OnHold),
            "dropped" => Ok(Self::Dropped),
            other => Err(format!("unknown entry status: {other}")),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user (created on first login)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Media catalog
// =============================================================================

/// Descriptive fields of a media item as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSpec {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub creators: Option<JsonMap>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    /// Running time in minutes (or pages, hours played; client-defined)
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub metadata: Option<JsonMap>,
}

impl MediaSpec {
    /// Minimal spec with only the required fields set
    pub fn new(title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            media_type,
            title: title.into(),
            original_title: None,
            year: None,
            cover_url: None,
            creators: None,
            genres: None,
            duration: None,
            metadata: None,
        }
    }
}

/// A canonical catalog entry, shared by all users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<i32>,
    pub cover_url: Option<String>,
    pub creators: Option<JsonMap>,
    pub genres: Option<Vec<String>>,
    pub duration: Option<i32>,
    pub metadata: Option<JsonMap>,
    pub created_at: DateTime<Utc>,
}

impl MediaItem {
    /// Build a new item with a fresh id from a client spec
    pub fn from_spec(spec: MediaSpec) -> Self {
        Self {
            id: EntityId::new().0,
            media_type: spec.media_type,
            title: spec.title,
            original_title: spec.original_title,
            year: spec.year,
            cover_url: spec.cover_url,
            creators: spec.creators,
            genres: spec.genres,
            duration: spec.duration,
            metadata: spec.metadata,
            created_at: Utc::now(),
        }
    }

    /// Overwrite every descriptive field, keeping identity
    pub fn apply_spec(&mut self, spec: MediaSpec) {
        self.media_type = spec.media_type;
        self.title = spec.title;
        self.original_title = spec.original_title;
        self.year = spec.year;
        self.cover_url = spec.cover_url;
        self.creators = spec.creators;
        self.genres = spec.genres;
        self.duration = spec.duration;
        self.metadata = spec.metadata;
    }
}

// =============================================================================
// Entries
// =============================================================================

/// User-editable fields of an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFields {
    pub status: EntryStatus,
    #[serde(default)]
    pub rating: Option<f64>,
    /// Review body (markdown)
    #[serde(default)]
    pub review_md: Option<String>,
    #[serde(default)]
    pub progress: Option<JsonMap>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl EntryFields {
    pub fn with_status(status: EntryStatus) -> Self {
        Self {
            status,
            rating: None,
            review_md: None,
            progress: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// A user's record of consuming one media item
///
/// Always carries the joined media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub user_id: String,
    pub media_id: String,
    pub status: EntryStatus,
    pub rating: Option<f64>,
    pub review_md: Option<String>,
    pub progress: Option<JsonMap>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub media: MediaItem,
}

// =============================================================================
// Collections
// =============================================================================

/// A named grouping of a user's entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Collection {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Collection plus its members in position order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionWithEntries {
    #[serde(flatten)]
    pub collection: Collection,
    pub entries: Vec<Entry>,
}

// =============================================================================
// Share tokens
// =============================================================================

/// What a share token grants access to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    /// A single collection with its entries
    Collection,
    /// A user's whole entry list
    Profile,
    /// Guest snapshot (payload is not stored)
    Snapshot,
}

impl ShareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Profile => "profile",
            Self::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for ShareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque read-only credential
///
/// `kind` is kept as stored text so rows written with a kind this build
/// does not know still load and can be reported as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShareToken {
    pub token: String,
    pub kind: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShareToken {
    /// Validity period of a freshly issued token
    pub const VALIDITY_MONTHS: u32 = 1;

    /// Create a token for `kind`/`target_id`, valid for one calendar month
    pub fn issue(token: String, kind: ShareKind, target_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            token,
            kind: kind.as_str().to_string(),
            target_id: target_id.to_string(),
            created_at: now,
            expires_at: now.checked_add_months(Months::new(Self::VALIDITY_MONTHS)),
        }
    }

    /// Parsed kind, `None` when the stored value is not a known kind
    pub fn share_kind(&self) -> Option<ShareKind> {
        match self.kind.as_str() {
            "collection" => Some(ShareKind::Collection),
            "profile" => Some(ShareKind::Profile),
            "snapshot" => Some(ShareKind::Snapshot),
            _ => None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}
