use crate::error::FetchError;
use crate::tags::TagCounts;
use serde::ser::{Serialize, Serializer};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub url: String,
    /// `0` when no HTTP response was received.
    pub status_code: u16,
    pub content_type: Option<String>,
    /// Bytes of body actually read, after any truncation.
    pub content_length: u64,
    pub response_time: Duration,
    pub tag_counts: TagCounts,
    pub error: Option<FetchError>,
}

impl FetchResult {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: 0,
            content_type: None,
            content_length: 0,
            response_time: Duration::from_secs(0),
            tag_counts: TagCounts::new(),
            error: None,
        }
    }

    pub fn with_error(url: String, error: FetchError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<&'static str> {
        self.error.as_ref().map(FetchError::kind)
    }
}

#[derive(serde::Serialize)]
struct WireMeta<'a> {
    status: u16,
    #[serde(rename = "content-type", skip_serializing_if = "Option::is_none")]
    content_type: Option<&'a str>,
    #[serde(rename = "content-length")]
    content_length: u64,
    #[serde(rename = "response-time-ms")]
    response_time_ms: u128,
}

#[derive(serde::Serialize)]
struct WireElement<'a> {
    #[serde(rename = "tag-name")]
    tag_name: &'a str,
    count: usize,
}

#[derive(serde::Serialize)]
struct WireDocument<'a> {
    url: &'a str,
    meta: WireMeta<'a>,
    elements: Vec<WireElement<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a FetchError>,
}

impl Serialize for FetchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireDocument {
            url: &self.url,
            meta: WireMeta {
                status: self.status_code,
                content_type: self.content_type.as_deref(),
                content_length: self.content_length,
                response_time_ms: self.response_time.as_millis(),
            },
            elements: self
                .tag_counts
                .sorted()
                .into_iter()
                .map(|(tag_name, count)| WireElement { tag_name, count })
                .collect(),
            error: self.error.as_ref(),
        }
        .serialize(serializer)
    }
}
