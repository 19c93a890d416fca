//! Storage traits and error types
//!
//! This module defines the trait interfaces for storage backends and
//! associated error types.

use crate::aggregator::least_recently_fetched;
use crate::storage::{
    Feed, FeedFollowRecord, FeedWithOwner, InsertOutcome, NewPost, Post, User,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage lock poisoned by a panicked task")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Users of the aggregator
pub trait UserStore {
    /// Creates a user; fails with `ConstraintViolation` if the name is taken
    fn create_user(&mut self, name: &str) -> StorageResult<User>;

    fn get_user_by_name(&self, name: &str) -> StorageResult<Option<User>>;

    fn get_user(&self, user_id: i64) -> StorageResult<Option<User>>;

    fn list_users(&self) -> StorageResult<Vec<User>>;

    /// Deletes every user; feeds, follows and posts cascade
    fn delete_all_users(&mut self) -> StorageResult<u64>;
}

/// Feed records and their polling rotation
pub trait FeedStore {
    /// Creates a feed; fails with `ConstraintViolation` if the URL is taken
    fn create_feed(&mut self, name: &str, url: &str, user_id: i64) -> StorageResult<Feed>;

    fn get_feed_by_url(&self, url: &str) -> StorageResult<Option<Feed>>;

    fn list_feeds(&self) -> StorageResult<Vec<Feed>>;

    /// Lists every feed with the name of the user who added it
    fn list_feeds_with_owners(&self) -> StorageResult<Vec<FeedWithOwner>>;

    /// Records that a feed was polled at `at`
    ///
    /// Returns `None` when no feed has this id any more.
    fn mark_fetched(&mut self, feed_id: i64, at: DateTime<Utc>) -> StorageResult<Option<Feed>>;

    /// Picks the feed that has waited longest since it was last polled
    ///
    /// Feeds never polled come first. Returns `None` when no feeds exist.
    fn select_least_recently_fetched(&self) -> StorageResult<Option<Feed>> {
        let feeds = self.list_feeds()?;
        Ok(least_recently_fetched(&feeds).cloned())
    }
}

/// Posts collected from feeds
pub trait PostStore {
    /// Inserts a post unless one with the same URL is already stored
    fn insert_if_absent(&mut self, post: &NewPost) -> StorageResult<InsertOutcome>;

    fn count_posts_for_feed(&self, feed_id: i64) -> StorageResult<u64>;

    fn get_post_by_url(&self, url: &str) -> StorageResult<Option<Post>>;

    /// Most recent posts from the feeds a user follows
    fn posts_for_user(&self, user_id: i64, limit: u32) -> StorageResult<Vec<Post>>;
}

/// Associations between users and the feeds they follow
pub trait FollowStore {
    /// Creates a follow; fails with `ConstraintViolation` if it already exists
    fn create_feed_follow(&mut self, user_id: i64, feed_id: i64)
        -> StorageResult<FeedFollowRecord>;

    fn feed_follows_for_user(&self, user_id: i64) -> StorageResult<Vec<FeedFollowRecord>>;

    /// Removes a follow, returning whether one existed
    fn delete_feed_follow(&mut self, user_id: i64, feed_id: i64) -> StorageResult<bool>;
}
