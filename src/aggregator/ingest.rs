//! Ingestion step: one feed's document into posts
//!
//! The feed is rotated to the back of the polling order before the fetch so
//! a feed that hangs or fails cannot starve the others. Items are written
//! with an idempotent insert keyed by URL.

use crate::aggregator::fetcher::{Document, DocumentItem, FetchDocument, FetchError};
use crate::storage::{lock_storage, Feed, FeedStore, InsertOutcome, NewPost, PostStore};
use crate::Result;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// Counts from one successful ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub feed_name: String,
    /// Items in the document, whether or not they were new
    pub items_seen: usize,
    pub inserted: usize,
    pub already_known: usize,
    /// Items without a link, which cannot be keyed
    pub skipped: usize,
}

/// How an ingestion step ended
#[derive(Debug)]
pub enum IngestOutcome {
    /// The document was fetched and its items written
    Collected(IngestReport),

    /// The fetch failed; stored posts are untouched
    FetchFailed(FetchError),

    /// The feed disappeared between selection and fetch
    FeedMissing,
}

/// Runs the ingestion step for one feed
///
/// Fetch failures are logged here and reported as [`IngestOutcome::FetchFailed`];
/// only storage errors are returned as `Err`.
pub async fn ingest_feed<S, F>(
    storage: &Mutex<S>,
    fetcher: &F,
    feed: &Feed,
    fetch_timeout: Duration,
) -> Result<IngestOutcome>
where
    S: FeedStore + PostStore,
    F: FetchDocument,
{
    let marked = lock_storage(storage)?.mark_fetched(feed.id, Utc::now())?;
    let Some(feed) = marked else {
        tracing::warn!("Feed {} ({}) no longer exists, skipping", feed.name, feed.id);
        return Ok(IngestOutcome::FeedMissing);
    };

    let document = match tokio::time::timeout(fetch_timeout, fetcher.fetch(&feed.url)).await {
        Ok(Ok(document)) => document,
        Ok(Err(e)) => {
            tracing::warn!("Failed to fetch feed {} ({}): {}", feed.name, feed.url, e);
            return Ok(IngestOutcome::FetchFailed(e));
        }
        Err(_) => {
            let e = FetchError::Timeout {
                url: feed.url.clone(),
                timeout: fetch_timeout,
            };
            tracing::warn!("Failed to fetch feed {} ({}): {}", feed.name, feed.url, e);
            return Ok(IngestOutcome::FetchFailed(e));
        }
    };

    let report = store_items(storage, &feed, &document)?;

    tracing::info!(
        "Feed {} collected, {} posts found",
        report.feed_name,
        report.items_seen
    );
    tracing::debug!(
        "Feed {}: {} new, {} already known, {} without link",
        report.feed_name,
        report.inserted,
        report.already_known,
        report.skipped
    );

    Ok(IngestOutcome::Collected(report))
}

fn store_items<S: PostStore>(
    storage: &Mutex<S>,
    feed: &Feed,
    document: &Document,
) -> Result<IngestReport> {
    let mut report = IngestReport {
        feed_name: feed.name.clone(),
        items_seen: document.items.len(),
        inserted: 0,
        already_known: 0,
        skipped: 0,
    };

    let mut store = lock_storage(storage)?;
    for item in &document.items {
        let Some(post) = new_post(feed.id, item) else {
            tracing::debug!("Skipping item without link in feed {}", feed.name);
            report.skipped += 1;
            continue;
        };

        match store.insert_if_absent(&post)? {
            InsertOutcome::Inserted(_) => report.inserted += 1,
            InsertOutcome::AlreadyExists => report.already_known += 1,
        }
    }

    Ok(report)
}

fn new_post(feed_id: i64, item: &DocumentItem) -> Option<NewPost> {
    let url = item.link.as_deref().filter(|link| !link.is_empty())?;

    let published_at = item.published.as_deref().and_then(|raw| {
        let parsed = parse_published(raw);
        if parsed.is_none() {
            tracing::debug!("Unparseable publish date {:?} for {}", raw, url);
        }
        parsed
    });

    Some(NewPost {
        feed_id,
        url: url.to_string(),
        title: item.title.clone().unwrap_or_default(),
        description: item.description.clone(),
        published_at,
    })
}

/// Parses a feed item's publish date
///
/// RSS mandates RFC 2822 but RFC 3339 shows up often enough to accept.
/// Returns `None` when neither format matches.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
