//! Feed document fetcher
//!
//! This module handles the HTTP side of polling a feed:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Downloading a feed document and classifying failures
//! - Parsing RSS into a format-neutral [`Document`]

use crate::config::AggregatorConfig;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that abort a single feed fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid feed URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed feed document at {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Request timeout for {url} after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

/// A parsed feed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub items: Vec<DocumentItem>,
}

/// One entry of a feed document, as published
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentItem {
    pub link: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw publish date; parsing is left to the ingestion step
    pub published: Option<String>,
}

/// Anything that can turn a feed URL into a [`Document`]
pub trait FetchDocument {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Document, FetchError>> + Send;
}

/// Builds an HTTP client for feed requests
///
/// # Arguments
///
/// * `config` - The aggregator configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &AggregatorConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.fetch_timeout())
        .connect_timeout(Duration::from_secs(10).min(config.fetch_timeout()))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches feed documents over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &AggregatorConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl FetchDocument for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        parse_document(url, &body)
    }
}

/// Parses an RSS document
///
/// This is a pure function (no I/O) so that parsing can be tested without a
/// server.
pub fn parse_document(url: &str, body: &[u8]) -> Result<Document, FetchError> {
    let channel = rss::Channel::read_from(body).map_err(|e| FetchError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let items = channel
        .items()
        .iter()
        .map(|item| DocumentItem {
            link: item.link().map(|s| s.trim().to_string()),
            title: item.title().map(String::from),
            description: item.description().map(String::from),
            published: item.pub_date().map(String::from),
        })
        .collect();

    Ok(Document {
        title: channel.title().to_string(),
        items,
    })
}
