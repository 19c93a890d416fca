//! Fakes shared by the aggregator tests

use crate::aggregator::fetcher::{Document, DocumentItem, FetchDocument, FetchError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Builds a document from `(link, raw publish date)` pairs
pub fn document(items: &[(&str, Option<&str>)]) -> Document {
    Document {
        title: "Stub Feed".to_string(),
        items: items
            .iter()
            .map(|(link, published)| DocumentItem {
                link: Some(link.to_string()),
                title: Some(format!("Post at {}", link)),
                description: Some("Body".to_string()),
                published: published.map(String::from),
            })
            .collect(),
    }
}

/// Serves canned documents by URL, optionally after a delay
#[derive(Debug, Default)]
pub struct StubFetcher {
    documents: HashMap<String, Document>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, document: Document) -> Self {
        self.documents.insert(url.to_string(), document);
        self
    }

    /// URLs without a document fail; this only documents intent at call sites
    pub fn with_failure(mut self, url: &str) -> Self {
        self.documents.remove(url);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of fetches started so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FetchDocument for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Parse {
                url: url.to_string(),
                message: "no stub document".to_string(),
            })
    }
}
