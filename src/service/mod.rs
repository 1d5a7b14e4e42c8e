//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database access, ownership checks and share tokens.
//! Every user-scoped call takes an explicit [`UserContext`].

mod account;
mod catalog;
mod collection;
mod entry;
mod guest;
mod share;
mod sync;

pub use account::AccountService;
pub use catalog::{CatalogResolver, MediaCatalog, MediaResolver};
pub use collection::{CollectionService, CollectionUpdate};
pub use entry::EntryService;
pub use guest::{GuestEntry, GuestService};
pub use share::{ShareService, SharedContent};
pub use sync::{EntryRepository, SyncItem, SyncItemResult, SyncReconciler, SyncReport};

/// Identity of the caller, resolved once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
