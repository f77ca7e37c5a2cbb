use crate::batch::Batch;
use crate::collector::{Collector, ResultCallback};
use crate::dedup::DistinctUrls;
use crate::error::Result;
use crate::limiter::ConcurrencyLimiter;
use crate::settings::BatchSettings;
use std::time::{Duration, Instant};
use tagtally_scanner::{FetchError, FetchResult, Fetcher, parse_target};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Batch entry point: deduplicates a URL list, fans one worker out per
/// distinct URL behind the shared limiter, and collects the results.
#[derive(Clone)]
pub struct BatchRunner {
    fetcher: Fetcher,
    limiter: ConcurrencyLimiter,
    deadline: Option<Duration>,
    result_callback: Option<ResultCallback>,
}

impl BatchRunner {
    /// Build a runner that gates its fetches on `limiter`.
    ///
    /// `settings.concurrency` is not consulted here; the limiter's own
    /// capacity is what bounds fetches.
    pub fn new(settings: &BatchSettings, limiter: ConcurrencyLimiter) -> Result<Self> {
        settings.validate()?;
        let fetcher = Fetcher::new(&settings.fetcher_config())?;

        Ok(Self {
            fetcher,
            limiter,
            deadline: settings.deadline(),
            result_callback: None,
        })
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub async fn run<I, S>(&self, urls: I) -> Batch
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run_with_cancel(urls, CancellationToken::new()).await
    }

    /// Like [`BatchRunner::run`], returning early once `cancel` fires.
    /// Workers still running at that point are aborted and their slots freed.
    pub async fn run_with_cancel<I, S>(&self, urls: I, cancel: CancellationToken) -> Batch
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct = DistinctUrls::from_requested(urls);
        if distinct.is_empty() {
            debug!("Empty batch, nothing to dispatch");
            return Batch::default();
        }

        info!(
            "Starting batch of {} distinct URLs ({}/{} slots free)",
            distinct.len(),
            self.limiter.available(),
            self.limiter.capacity()
        );
        let start = Instant::now();

        let (tx, rx) = mpsc::channel(distinct.len());
        let mut workers = JoinSet::new();

        for url in distinct.iter() {
            let url = url.to_string();
            let tx = tx.clone();
            let fetcher = self.fetcher.clone();
            let limiter = self.limiter.clone();

            workers.spawn(async move {
                let result = fetch_worker(&fetcher, &limiter, url).await;
                if let Err(unsent) = tx.send(result).await {
                    debug!("Collector finished before result for {} arrived", unsent.0.url);
                }
            });
        }
        drop(tx);

        let batch = Collector::new(distinct, rx)
            .with_result_callback(self.result_callback.clone())
            .collect(self.deadline, &cancel)
            .await;

        workers.abort_all();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined
                && e.is_panic()
            {
                warn!("Fetch worker panicked: {}", e);
            }
        }

        let summary = batch.summary();
        info!(
            "Batch complete in {:.2}s: {} ok, {} failed, {} timed out, {} cancelled",
            start.elapsed().as_secs_f64(),
            summary.succeeded,
            summary.failed,
            summary.timed_out,
            summary.cancelled
        );

        batch
    }
}

/// Produce exactly one result for `url`.
///
/// The slot is held for the network exchange only; tokenizing happens after
/// it has been returned to the pool.
async fn fetch_worker(fetcher: &Fetcher, limiter: &ConcurrencyLimiter, url: String) -> FetchResult {
    let target = match parse_target(&url) {
        Ok(target) => target,
        Err(e) => {
            warn!("Skipping {}: {}", url, e);
            return FetchResult::with_error(url, e);
        }
    };

    let download = {
        let Some(_slot) = limiter.acquire().await else {
            return FetchResult::with_error(url, FetchError::Cancelled);
        };
        fetcher.download(&target).await
    };

    match download {
        Ok(download) => download.into_result(url),
        Err(e) => {
            warn!("Fetch error for {}: {}", url, e);
            FetchResult::with_error(url, e)
        }
    }
}
