use std::collections::HashSet;

/// The distinct URLs of one batch, in first-seen order.
///
/// Built once before any worker is spawned and never mutated afterwards.
/// URLs are compared byte for byte: no case folding, trailing-slash or
/// query-order normalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctUrls {
    urls: Vec<String>,
    index: HashSet<String>,
}

impl DistinctUrls {
    pub fn from_requested<I, S>(requested: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct = Self::default();
        for url in requested {
            let url = url.as_ref();
            if distinct.index.insert(url.to_string()) {
                distinct.urls.push(url.to_string());
            }
        }
        distinct
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }
}
