//! Least-recently-fetched feed ordering
//!
//! The ordering is expressed as a plain comparator so every storage backend
//! selects the same feed without relying on database-specific NULL ordering.

use crate::storage::Feed;
use std::cmp::Ordering;

/// Orders feeds by how urgently they should be polled
///
/// Feeds that were never fetched come first (an absent timestamp sorts as
/// minus infinity), then the earliest `last_fetched_at`. Ties fall back to
/// creation time and id so the choice is deterministic.
pub fn fetch_order(a: &Feed, b: &Feed) -> Ordering {
    // `None < Some(_)` for Option, which is exactly "never fetched first"
    a.last_fetched_at
        .cmp(&b.last_fetched_at)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Returns the feed that has waited longest, or `None` for an empty set
pub fn least_recently_fetched<'a, I>(feeds: I) -> Option<&'a Feed>
where
    I: IntoIterator<Item = &'a Feed>,
{
    feeds.into_iter().min_by(|a, b| fetch_order(a, b))
}
