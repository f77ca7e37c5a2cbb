use crate::error::{Result, TallyError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tagtally_scanner::FetcherConfig;

/// Settings for a [`crate::BatchRunner`].
///
/// Every field has a default, so a settings file only needs the keys it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Process-wide number of fetches allowed in flight.
    pub concurrency: usize,

    /// Per-request timeout, covering connect, headers and body.
    pub request_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// How long a batch waits for its workers. `None` waits forever.
    pub batch_deadline_secs: Option<u64>,

    pub max_redirects: usize,

    pub max_body_bytes: usize,

    pub user_agent: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency: 20,
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            batch_deadline_secs: Some(60),
            max_redirects: 10,
            max_body_bytes: 10 * 1024 * 1024,
            user_agent: format!("tagtally/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl BatchSettings {
    /// Load settings from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(TallyError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(TallyError::InvalidConfig(
                "request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(TallyError::InvalidConfig(
                "max body size must be at least 1 byte".to_string(),
            ));
        }
        Ok(())
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.batch_deadline_secs.map(Duration::from_secs)
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            user_agent: self.user_agent.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_redirects: self.max_redirects,
            max_body_bytes: self.max_body_bytes,
        }
    }
}
