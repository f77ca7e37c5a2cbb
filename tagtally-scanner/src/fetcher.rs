use crate::error::{FetchError, Result};
use crate::result::FetchResult;
use crate::tags::count_tags_in_bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// HTTP client settings for a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    /// Bodies longer than this are truncated.
    pub max_body_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("tagtally/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_redirects: 10,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// The network half of a fetch: everything read off the wire for one URL.
#[derive(Debug, Clone)]
pub struct Download {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub response_time: Duration,
    /// Set when the body could not be read to the end.
    pub body_error: Option<FetchError>,
}

impl Download {
    /// Tokenize the body and build the result for `url`.
    ///
    /// Non-2xx statuses and partial bodies still get their tags counted; the
    /// result's error field records what went wrong.
    pub fn into_result(self, url: String) -> FetchResult {
        let tag_counts = count_tags_in_bytes(&self.body);
        let error = self.body_error.or_else(|| {
            if (200..300).contains(&self.status_code) {
                None
            } else {
                Some(FetchError::Status(self.status_code))
            }
        });

        FetchResult {
            url,
            status_code: self.status_code,
            content_type: self.content_type,
            content_length: self.body.len() as u64,
            response_time: self.response_time,
            tag_counts,
            error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_body_bytes: usize,
}

impl Fetcher {
    pub fn new(config: &FetcherConfig) -> std::result::Result<Self, reqwest::Error> {
        let redirect = if config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(config.max_redirects)
        };

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(redirect)
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Issue the GET and read the body into memory.
    ///
    /// Returns `Err` only when no response arrived at all. A failure part way
    /// through the body is reported in [`Download::body_error`] alongside the
    /// bytes read so far.
    pub async fn download(&self, url: &Url) -> Result<Download> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let mut response = self.client.get(url.clone()).send().await?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut body = Vec::new();
        let mut body_error = None;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = self.max_body_bytes.saturating_sub(body.len());
                    if chunk.len() > remaining {
                        body.extend_from_slice(&chunk[..remaining]);
                        warn!(
                            "Body of {} exceeded {} bytes, truncating",
                            url, self.max_body_bytes
                        );
                        body_error = Some(FetchError::BodyTooLarge(self.max_body_bytes));
                        break;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed reading body of {}: {}", url, e);
                    body_error = Some(FetchError::from(e));
                    break;
                }
            }
        }
        let response_time = start.elapsed();

        debug!(
            "Fetched {} ({} bytes, status {}) in {:?}",
            url,
            body.len(),
            status_code,
            response_time
        );

        Ok(Download {
            status_code,
            content_type,
            body,
            response_time,
            body_error,
        })
    }
}

/// Parse a requested URL, accepting only http and https.
pub fn parse_target(raw_url: &str) -> Result<Url> {
    let url = Url::parse(raw_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw_url, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FetchError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw_url, scheme
        ))),
    }
}
