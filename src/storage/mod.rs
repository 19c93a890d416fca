//! Storage module for persisting aggregator data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Users, feeds and feed follows for the surrounding commands
//! - Feed rotation (least-recently-fetched selection, mark fetched)
//! - Idempotent post insertion keyed by URL

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{FeedStore, FollowStore, PostStore, StorageError, StorageResult, UserStore};

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(GatorError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> crate::Result<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Locks a shared store, mapping a poisoned mutex to a storage error
pub fn lock_storage<S>(storage: &Mutex<S>) -> StorageResult<MutexGuard<'_, S>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Represents a user in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents a registered feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set only by the aggregator; `None` until the feed is first polled
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// Represents a stored post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub feed_id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Outcome of an idempotent post insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this id
    Inserted(i64),

    /// A post with the same URL was already stored
    AlreadyExists,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// A feed follow joined with the names of its user and feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFollowRecord {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub user_name: String,
    pub feed_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A feed joined with the name of the user who added it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedWithOwner {
    pub feed: Feed,
    pub owner_name: String,
}
