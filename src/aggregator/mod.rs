//! Aggregator module: the feed polling loop and its ingestion pipeline
//!
//! This module contains:
//! - Parsing of human-readable polling periods (`1h30m`, `500ms`)
//! - Least-recently-fetched feed selection
//! - HTTP fetching and RSS parsing of feed documents
//! - The ingestion step that turns one feed's document into posts
//! - The scheduler that runs ingestion cycles on a fixed cadence

mod duration;
mod fetcher;
mod ingest;
mod scheduler;
mod selection;

pub use duration::{parse_duration, InvalidDuration};
pub use fetcher::{
    build_http_client, parse_document, Document, DocumentItem, FetchDocument, FetchError,
    HttpFetcher,
};
pub use ingest::{ingest_feed, parse_published, IngestOutcome, IngestReport};
pub use scheduler::{run_cycle, CycleOutcome, Scheduler};
pub use selection::{fetch_order, least_recently_fetched};

#[cfg(test)]
pub(crate) mod test_support;
