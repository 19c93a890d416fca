//! Poll scheduler for the aggregation loop
//!
//! This module handles:
//! - Launching one ingestion cycle immediately and then every period
//! - Running cycles as independent tasks so a slow cycle never delays the
//!   next launch
//! - Containing cycle failures so they only ever reach the log
//! - Stopping on an injected shutdown trigger and draining in-flight cycles

use crate::aggregator::duration::InvalidDuration;
use crate::aggregator::fetcher::FetchDocument;
use crate::aggregator::ingest::{ingest_feed, IngestOutcome};
use crate::storage::{lock_storage, FeedStore, PostStore};
use crate::Result;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};

/// Default upper bound on a single fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// What one scheduler cycle did
#[derive(Debug)]
pub enum CycleOutcome {
    /// No feeds are registered
    NoFeeds,

    /// A feed was selected and the ingestion step ran
    Ingested(IngestOutcome),
}

/// Scheduler drives the ingestion step on a fixed cadence
///
/// Each tick spawns a cycle into a [`JoinSet`] without awaiting it, so cycles
/// may overlap. When the shutdown trigger resolves no further cycles are
/// launched, and `run` waits for the cycles already in flight before it
/// returns. Fetches are bounded by the fetch timeout, which bounds the wait.
pub struct Scheduler<S, F> {
    storage: Arc<Mutex<S>>,
    fetcher: Arc<F>,
    period: Duration,
    fetch_timeout: Duration,
}

impl<S, F> Scheduler<S, F>
where
    S: FeedStore + PostStore + Send + 'static,
    F: FetchDocument + Send + Sync + 'static,
{
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `storage` - The shared feed and post store
    /// * `fetcher` - The document fetcher used by every cycle
    /// * `period` - Time between cycle launches
    ///
    /// # Returns
    ///
    /// * `Ok(Scheduler)` - Ready to run
    /// * `Err(InvalidDuration)` - The period is zero
    pub fn new(
        storage: Arc<Mutex<S>>,
        fetcher: Arc<F>,
        period: Duration,
    ) -> std::result::Result<Self, InvalidDuration> {
        if period.is_zero() {
            return Err(InvalidDuration::new(
                &format!("{:?}", period),
                "duration must be positive",
            ));
        }

        Ok(Self {
            storage,
            fetcher,
            period,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        })
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Runs cycles until `shutdown` resolves, then waits for the ones in flight
    ///
    /// Nothing a cycle does can end the loop; only the trigger can.
    pub async fn run<Sig>(self, shutdown: Sig)
    where
        Sig: Future<Output = ()>,
    {
        self.run_with_abort(shutdown, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but cycles still in flight after `shutdown`
    /// are cancelled as soon as `abort` resolves
    ///
    /// `abort` is only polled once the loop has stopped launching cycles.
    pub async fn run_with_abort<Sig, Abort>(self, shutdown: Sig, abort: Abort)
    where
        Sig: Future<Output = ()>,
        Abort: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.period);
        let mut in_flight = JoinSet::new();
        let mut launched: u64 = 0;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Shutting down feed aggregator...");
                    break;
                }

                _ = ticker.tick() => {
                    launched += 1;
                    tracing::debug!("Launching cycle {}", launched);
                    in_flight.spawn(cycle_task(
                        self.storage.clone(),
                        self.fetcher.clone(),
                        self.fetch_timeout,
                    ));
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join(joined);
                }
            }
        }

        if !in_flight.is_empty() {
            tracing::info!("Waiting for {} in-flight cycle(s) to finish", in_flight.len());
        }

        tokio::pin!(abort);
        let mut aborted = false;
        loop {
            tokio::select! {
                biased;

                _ = &mut abort, if !aborted => {
                    tracing::warn!("Abandoning {} in-flight cycle(s)", in_flight.len());
                    in_flight.abort_all();
                    aborted = true;
                }

                joined = in_flight.join_next() => match joined {
                    Some(joined) => log_join(joined),
                    None => break,
                },
            }
        }

        tracing::info!("Feed aggregator stopped after {} cycle(s)", launched);
    }
}

async fn cycle_task<S, F>(storage: Arc<Mutex<S>>, fetcher: Arc<F>, fetch_timeout: Duration)
where
    S: FeedStore + PostStore,
    F: FetchDocument,
{
    if let Err(e) = run_cycle(&storage, fetcher.as_ref(), fetch_timeout).await {
        tracing::error!("Error scraping feeds: {}", e);
    }
}

/// Runs one cycle: select the least recently fetched feed and ingest it
pub async fn run_cycle<S, F>(
    storage: &Mutex<S>,
    fetcher: &F,
    fetch_timeout: Duration,
) -> Result<CycleOutcome>
where
    S: FeedStore + PostStore,
    F: FetchDocument,
{
    let next = lock_storage(storage)?.select_least_recently_fetched()?;
    let Some(feed) = next else {
        tracing::info!("No feeds to fetch.");
        return Ok(CycleOutcome::NoFeeds);
    };

    tracing::debug!("Found a feed to fetch: {} ({})", feed.name, feed.url);
    let outcome = ingest_feed(storage, fetcher, &feed, fetch_timeout).await?;
    Ok(CycleOutcome::Ingested(outcome))
}

fn log_join(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!("Aggregation cycle panicked: {}", e);
        } else {
            tracing::warn!("Aggregation cycle cancelled: {}", e);
        }
    }
}
