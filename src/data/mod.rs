//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Token cache connectivity

mod cache;
mod database;
mod models;

pub use cache::TokenCache;
pub use database::{Database, MEDIA_SEARCH_LIMIT};
pub use models::*;

#[cfg(test)]
mod database_test;
