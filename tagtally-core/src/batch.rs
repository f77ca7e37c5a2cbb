use serde::Serialize;
use tagtally_scanner::{FetchError, FetchResult, TagCounts};

/// One result per distinct requested URL, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Batch {
    results: Vec<FetchResult>,
}

/// Aggregate view over a [`Batch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    pub bytes_read: u64,
    /// Tag counts summed over every result.
    pub tags: TagCounts,
}

impl Batch {
    pub(crate) fn from_results(results: Vec<FetchResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FetchResult> {
        self.results.iter()
    }

    pub fn get(&self, url: &str) -> Option<&FetchResult> {
        self.results.iter().find(|r| r.url == url)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.url.as_str())
    }

    /// Reorder by URL for callers that need stable output.
    pub fn sort_by_url(&mut self) {
        self.results.sort_by(|a, b| a.url.cmp(&b.url));
    }

    pub fn into_results(self) -> Vec<FetchResult> {
        self.results
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.results.len(),
            ..BatchSummary::default()
        };

        for result in &self.results {
            match result.error {
                None => summary.succeeded += 1,
                Some(FetchError::TimedOut) => summary.timed_out += 1,
                Some(FetchError::Cancelled) => summary.cancelled += 1,
                Some(_) => summary.failed += 1,
            }
            summary.bytes_read += result.content_length;
            summary.tags.merge(&result.tag_counts);
        }

        summary
    }
}

impl IntoIterator for Batch {
    type Item = FetchResult;
    type IntoIter = std::vec::IntoIter<FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a FetchResult;
    type IntoIter = std::slice::Iter<'a, FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
