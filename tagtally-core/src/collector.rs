use crate::batch::Batch;
use crate::dedup::DistinctUrls;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tagtally_scanner::{FetchError, FetchResult};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Called with each result as the collector accepts it.
pub type ResultCallback = Arc<dyn Fn(&FetchResult) + Send + Sync>;

/// Fan-in side of a batch: receives worker results until every distinct URL
/// has exactly one.
pub struct Collector {
    expected: DistinctUrls,
    receiver: mpsc::Receiver<FetchResult>,
    result_callback: Option<ResultCallback>,
}

impl Collector {
    pub fn new(expected: DistinctUrls, receiver: mpsc::Receiver<FetchResult>) -> Self {
        Self {
            expected,
            receiver,
            result_callback: None,
        }
    }

    pub fn with_result_callback(mut self, callback: Option<ResultCallback>) -> Self {
        self.result_callback = callback;
        self
    }

    /// Wait for one result per expected URL.
    ///
    /// Stops early when `deadline` elapses, `cancel` fires, or every sender
    /// is gone. URLs still missing at that point get a placeholder result
    /// carrying [`FetchError::TimedOut`], [`FetchError::Cancelled`] or
    /// [`FetchError::Internal`] respectively, so the returned batch always
    /// has exactly one entry per expected URL.
    pub async fn collect(mut self, deadline: Option<Duration>, cancel: &CancellationToken) -> Batch {
        let expected_count = self.expected.len();
        let mut seen: HashSet<String> = HashSet::with_capacity(expected_count);
        let mut results = Vec::with_capacity(expected_count);

        let expiry = async {
            match deadline {
                Some(deadline) => tokio::time::sleep(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expiry);

        let shortfall = loop {
            if results.len() == expected_count {
                break None;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Batch cancelled with {}/{} results", results.len(), expected_count);
                    break Some(FetchError::Cancelled);
                }
                _ = &mut expiry => {
                    warn!(
                        "Batch deadline expired with {}/{} results",
                        results.len(),
                        expected_count
                    );
                    break Some(FetchError::TimedOut);
                }
                received = self.receiver.recv() => match received {
                    Some(result) => accept(
                        &self.expected,
                        self.result_callback.as_ref(),
                        &mut seen,
                        &mut results,
                        result,
                    ),
                    None => {
                        warn!(
                            "All workers exited with {}/{} results",
                            results.len(),
                            expected_count
                        );
                        break Some(FetchError::Internal(
                            "worker exited without reporting a result".to_string(),
                        ));
                    }
                },
            }
        };

        if let Some(error) = shortfall {
            // Results already buffered when the loop stopped are finished fetches
            while let Ok(result) = self.receiver.try_recv() {
                accept(
                    &self.expected,
                    self.result_callback.as_ref(),
                    &mut seen,
                    &mut results,
                    result,
                );
            }

            for url in self.expected.iter() {
                if !seen.contains(url) {
                    results.push(FetchResult::with_error(url.to_string(), error.clone()));
                }
            }
        }

        Batch::from_results(results)
    }
}

/// Keep `result` if it answers an expected URL that has no result yet.
fn accept(
    expected: &DistinctUrls,
    callback: Option<&ResultCallback>,
    seen: &mut HashSet<String>,
    results: &mut Vec<FetchResult>,
    result: FetchResult,
) {
    if !expected.contains(&result.url) {
        warn!("Ignoring result for unexpected URL {}", result.url);
        return;
    }
    if !seen.insert(result.url.clone()) {
        warn!("Ignoring duplicate result for {}", result.url);
        return;
    }
    if let Some(callback) = callback {
        callback(&result);
    }
    results.push(result);
}
