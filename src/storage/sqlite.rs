//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    FeedStore, FollowStore, PostStore, StorageError, StorageResult, UserStore,
};
use crate::storage::{
    Feed, FeedFollowRecord, FeedWithOwner, InsertOutcome, NewPost, Post, User,
};
use crate::GatorError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const USER_COLUMNS: &str = "id, name, created_at, updated_at";

const FEED_COLUMNS: &str = "id, name, url, user_id, created_at, updated_at, last_fetched_at";

const POST_COLUMNS: &str =
    "id, feed_id, url, title, description, published_at, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(GatorError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, GatorError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, GatorError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn get_feed(&self, feed_id: i64) -> StorageResult<Option<Feed>> {
        let feed = self
            .conn
            .query_row(
                &format!("SELECT {} FROM feeds WHERE id = ?1", FEED_COLUMNS),
                params![feed_id],
                feed_from_row,
            )
            .optional()?;
        Ok(feed)
    }

    fn get_feed_follow(&self, follow_id: i64) -> StorageResult<FeedFollowRecord> {
        let follow = self.conn.query_row(
            "SELECT ff.id, ff.user_id, ff.feed_id, u.name, f.name, ff.created_at, ff.updated_at
             FROM feed_follows ff
             INNER JOIN users u ON u.id = ff.user_id
             INNER JOIN feeds f ON f.id = ff.feed_id
             WHERE ff.id = ?1",
            params![follow_id],
            follow_from_row,
        )?;
        Ok(follow)
    }
}

impl UserStore for SqliteStorage {
    fn create_user(&mut self, name: &str) -> StorageResult<User> {
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO users (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
                params![name, now],
            )
            .map_err(|e| unique_violation(e, || format!("user name already taken: {}", name)))?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_user_by_name(&self, name: &str) -> StorageResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE name = ?1", USER_COLUMNS),
                params![name],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user(&self, user_id: i64) -> StorageResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> StorageResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM users ORDER BY name", USER_COLUMNS))?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    fn delete_all_users(&mut self) -> StorageResult<u64> {
        let deleted = self.conn.execute("DELETE FROM users", [])?;
        Ok(deleted as u64)
    }
}

impl FeedStore for SqliteStorage {
    fn create_feed(&mut self, name: &str, url: &str, user_id: i64) -> StorageResult<Feed> {
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO feeds (name, url, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![name, url, user_id, now],
            )
            .map_err(|e| unique_violation(e, || format!("feed URL already registered: {}", url)))?;

        Ok(Feed {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            url: url.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
            last_fetched_at: None,
        })
    }

    fn get_feed_by_url(&self, url: &str) -> StorageResult<Option<Feed>> {
        let feed = self
            .conn
            .query_row(
                &format!("SELECT {} FROM feeds WHERE url = ?1", FEED_COLUMNS),
                params![url],
                feed_from_row,
            )
            .optional()?;
        Ok(feed)
    }

    fn list_feeds(&self) -> StorageResult<Vec<Feed>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM feeds ORDER BY id", FEED_COLUMNS))?;

        let feeds = stmt
            .query_map([], feed_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn list_feeds_with_owners(&self) -> StorageResult<Vec<FeedWithOwner>> {
        let mut stmt = self.conn.prepare(
            "SELECT f.id, f.name, f.url, f.user_id, f.created_at, f.updated_at, f.last_fetched_at,
             u.name
             FROM feeds f
             INNER JOIN users u ON u.id = f.user_id
             ORDER BY f.id",
        )?;

        let feeds = stmt
            .query_map([], |row| {
                Ok(FeedWithOwner {
                    feed: feed_from_row(row)?,
                    owner_name: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn mark_fetched(&mut self, feed_id: i64, at: DateTime<Utc>) -> StorageResult<Option<Feed>> {
        let updated = self.conn.execute(
            "UPDATE feeds SET last_fetched_at = ?1, updated_at = ?1 WHERE id = ?2",
            params![at, feed_id],
        )?;

        if updated == 0 {
            return Ok(None);
        }

        self.get_feed(feed_id)
    }
}

impl PostStore for SqliteStorage {
    fn insert_if_absent(&mut self, post: &NewPost) -> StorageResult<InsertOutcome> {
        let now = Utc::now();
        let inserted = self.conn.execute(
            "INSERT INTO posts (feed_id, url, title, description, published_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(url) DO NOTHING",
            params![
                post.feed_id,
                post.url,
                post.title,
                post.description,
                post.published_at,
                now
            ],
        )?;

        if inserted == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted(self.conn.last_insert_rowid()))
        }
    }

    fn count_posts_for_feed(&self, feed_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE feed_id = ?1",
            params![feed_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn get_post_by_url(&self, url: &str) -> StorageResult<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {} FROM posts WHERE url = ?1", POST_COLUMNS),
                params![url],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    fn posts_for_user(&self, user_id: i64, limit: u32) -> StorageResult<Vec<Post>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.feed_id, p.url, p.title, p.description, p.published_at,
             p.created_at, p.updated_at
             FROM posts p
             INNER JOIN feed_follows ff ON ff.feed_id = p.feed_id
             WHERE ff.user_id = ?1
             ORDER BY p.published_at IS NULL, p.published_at DESC, p.created_at DESC
             LIMIT ?2",
        )?;

        let posts = stmt
            .query_map(params![user_id, limit], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }
}

impl FollowStore for SqliteStorage {
    fn create_feed_follow(
        &mut self,
        user_id: i64,
        feed_id: i64,
    ) -> StorageResult<FeedFollowRecord> {
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![user_id, feed_id, now],
            )
            .map_err(|e| unique_violation(e, || "feed is already followed".to_string()))?;

        self.get_feed_follow(self.conn.last_insert_rowid())
    }

    fn feed_follows_for_user(&self, user_id: i64) -> StorageResult<Vec<FeedFollowRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT ff.id, ff.user_id, ff.feed_id, u.name, f.name, ff.created_at, ff.updated_at
             FROM feed_follows ff
             INNER JOIN users u ON u.id = ff.user_id
             INNER JOIN feeds f ON f.id = ff.feed_id
             WHERE ff.user_id = ?1
             ORDER BY ff.id",
        )?;

        let follows = stmt
            .query_map(params![user_id], follow_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(follows)
    }

    fn delete_feed_follow(&mut self, user_id: i64, feed_id: i64) -> StorageResult<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM feed_follows WHERE user_id = ?1 AND feed_id = ?2",
            params![user_id, feed_id],
        )?;
        Ok(deleted > 0)
    }
}

/// Turns a UNIQUE constraint failure into a typed conflict
fn unique_violation(err: rusqlite::Error, message: impl FnOnce() -> String) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StorageError::ConstraintViolation(message())
        }
        _ => StorageError::Sqlite(err),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        last_fetched_at: row.get(6)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        feed_id: row.get(1)?,
        url: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        published_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn follow_from_row(row: &Row<'_>) -> rusqlite::Result<FeedFollowRecord> {
    Ok(FeedFollowRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        feed_id: row.get(2)?,
        user_name: row.get(3)?,
        feed_name: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn storage_with_user() -> (SqliteStorage, User) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let user = storage.create_user("alice").unwrap();
        (storage, user)
    }

    fn new_post(feed_id: i64, url: &str) -> NewPost {
        NewPost {
            feed_id,
            url: url.to_string(),
            title: "A post".to_string(),
            description: Some("Body".to_string()),
            published_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStorage::new_in_memory().is_ok());
    }

    #[test]
    fn test_create_and_get_user() {
        let (storage, user) = storage_with_user();
        assert!(user.id > 0);

        let loaded = storage.get_user_by_name("alice").unwrap().unwrap();
        assert_eq!(loaded.id, user.id);
        assert!(storage.get_user_by_name("bob").unwrap().is_none());
        assert_eq!(storage.get_user(user.id).unwrap().unwrap().name, "alice");
    }

    #[test]
    fn test_duplicate_user_is_constraint_violation() {
        let (mut storage, _) = storage_with_user();
        let result = storage.create_user("alice");
        assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
    }

    #[test]
    fn test_duplicate_feed_url_is_constraint_violation() {
        let (mut storage, user) = storage_with_user();
        storage
            .create_feed("Blog", "https://example.com/rss", user.id)
            .unwrap();

        let result = storage.create_feed("Other", "https://example.com/rss", user.id);
        assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
    }

    #[test]
    fn test_feed_for_unknown_user_is_not_a_conflict() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let result = storage.create_feed("Blog", "https://example.com/rss", 999);
        assert!(matches!(result, Err(StorageError::Sqlite(_))));
    }

    #[test]
    fn test_mark_fetched_updates_timestamp() {
        let (mut storage, user) = storage_with_user();
        let feed = storage
            .create_feed("Blog", "https://example.com/rss", user.id)
            .unwrap();
        assert!(feed.last_fetched_at.is_none());

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let updated = storage.mark_fetched(feed.id, at).unwrap().unwrap();

        assert_eq!(updated.last_fetched_at, Some(at));
        assert_eq!(updated.updated_at, at);
    }

    #[test]
    fn test_mark_fetched_on_missing_feed_returns_none() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.mark_fetched(42, Utc::now()).unwrap().is_none());
    }

    #[test]
    fn test_select_least_recently_fetched_rotates() {
        let (mut storage, user) = storage_with_user();
        assert!(storage.select_least_recently_fetched().unwrap().is_none());

        let a = storage.create_feed("A", "https://a.example/rss", user.id).unwrap();
        let b = storage.create_feed("B", "https://b.example/rss", user.id).unwrap();
        let c = storage.create_feed("C", "https://c.example/rss", user.id).unwrap();

        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        storage.mark_fetched(a.id, base + Duration::hours(2)).unwrap();
        storage.mark_fetched(c.id, base + Duration::hours(1)).unwrap();

        // B has never been fetched
        assert_eq!(storage.select_least_recently_fetched().unwrap().unwrap().id, b.id);

        storage.mark_fetched(b.id, base + Duration::hours(3)).unwrap();
        assert_eq!(storage.select_least_recently_fetched().unwrap().unwrap().id, c.id);

        storage.mark_fetched(c.id, base + Duration::hours(4)).unwrap();
        assert_eq!(storage.select_least_recently_fetched().unwrap().unwrap().id, a.id);
    }

    #[test]
    fn test_insert_if_absent_is_idempotent() {
        let (mut storage, user) = storage_with_user();
        let feed = storage
            .create_feed("Blog", "https://example.com/rss", user.id)
            .unwrap();

        let post = new_post(feed.id, "https://example.com/1");
        let first = storage.insert_if_absent(&post).unwrap();
        let second = storage.insert_if_absent(&post).unwrap();

        assert!(first.is_inserted());
        assert_eq!(second, InsertOutcome::AlreadyExists);
        assert_eq!(storage.count_posts_for_feed(feed.id).unwrap(), 1);

        let stored = storage.get_post_by_url("https://example.com/1").unwrap().unwrap();
        assert_eq!(stored.title, "A post");
        assert_eq!(stored.published_at, post.published_at);
    }

    #[test]
    fn test_post_without_publish_date() {
        let (mut storage, user) = storage_with_user();
        let feed = storage
            .create_feed("Blog", "https://example.com/rss", user.id)
            .unwrap();

        let mut post = new_post(feed.id, "https://example.com/undated");
        post.published_at = None;
        storage.insert_if_absent(&post).unwrap();

        let stored = storage
            .get_post_by_url("https://example.com/undated")
            .unwrap()
            .unwrap();
        assert!(stored.published_at.is_none());
    }

    #[test]
    fn test_feed_follows() {
        let (mut storage, user) = storage_with_user();
        let feed = storage
            .create_feed("Blog", "https://example.com/rss", user.id)
            .unwrap();

        let follow = storage.create_feed_follow(user.id, feed.id).unwrap();
        assert_eq!(follow.user_name, "alice");
        assert_eq!(follow.feed_name, "Blog");

        let again = storage.create_feed_follow(user.id, feed.id);
        assert!(matches!(again, Err(StorageError::ConstraintViolation(_))));

        assert_eq!(storage.feed_follows_for_user(user.id).unwrap().len(), 1);
        assert!(storage.delete_feed_follow(user.id, feed.id).unwrap());
        assert!(!storage.delete_feed_follow(user.id, feed.id).unwrap());
        assert!(storage.feed_follows_for_user(user.id).unwrap().is_empty());
    }

    #[test]
    fn test_posts_for_user_only_followed_newest_first() {
        let (mut storage, user) = storage_with_user();
        let followed = storage
            .create_feed("Followed", "https://a.example/rss", user.id)
            .unwrap();
        let other = storage
            .create_feed("Other", "https://b.example/rss", user.id)
            .unwrap();
        storage.create_feed_follow(user.id, followed.id).unwrap();

        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (i, url) in ["https://a.example/1", "https://a.example/2", "https://a.example/3"]
            .iter()
            .enumerate()
        {
            let mut post = new_post(followed.id, url);
            post.published_at = Some(base + Duration::days(i as i64));
            storage.insert_if_absent(&post).unwrap();
        }
        storage
            .insert_if_absent(&new_post(other.id, "https://b.example/1"))
            .unwrap();

        let posts = storage.posts_for_user(user.id, 2).unwrap();
        let urls: Vec<&str> = posts.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example/3", "https://a.example/2"]);
    }

    #[test]
    fn test_delete_all_users_cascades() {
        let (mut storage, user) = storage_with_user();
        let feed = storage
            .create_feed("Blog", "https://example.com/rss", user.id)
            .unwrap();
        storage.create_feed_follow(user.id, feed.id).unwrap();
        storage
            .insert_if_absent(&new_post(feed.id, "https://example.com/1"))
            .unwrap();

        assert_eq!(storage.delete_all_users().unwrap(), 1);
        assert!(storage.list_users().unwrap().is_empty());
        assert!(storage.list_feeds().unwrap().is_empty());
        assert!(storage.get_post_by_url("https://example.com/1").unwrap().is_none());
    }

    #[test]
    fn test_list_feeds_with_owners() {
        let (mut storage, user) = storage_with_user();
        storage
            .create_feed("Blog", "https://example.com/rss", user.id)
            .unwrap();

        let feeds = storage.list_feeds_with_owners().unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].owner_name, "alice");
        assert_eq!(feeds[0].feed.name, "Blog");
    }
}
