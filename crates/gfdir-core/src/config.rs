//! Loader configuration

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Spreadsheet-backed Apps Script endpoint serving the approved submissions
pub const DEFAULT_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbxxARTHtrZB7r5cAxPM3pMOR4EJ0CYn9x0KdO-qYNJVYxnuWa4iQ2SLZ6sLrObculU_/exec";

/// Status partition requested from the endpoint
pub const DEFAULT_STATUS: &str = "approved";

/// Upper bound on one remote fetch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_ENDPOINT: &str = "GFDIR_ENDPOINT";
pub const ENV_STATUS: &str = "GFDIR_STATUS";
pub const ENV_TIMEOUT_SECS: &str = "GFDIR_TIMEOUT_SECS";

/// Remote fetch settings for a refresh cycle
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Endpoint URL, without query parameters
    pub endpoint: String,
    /// Value of the `status` query parameter
    pub status: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            status: DEFAULT_STATUS.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by `GFDIR_ENDPOINT`, `GFDIR_STATUS` and
    /// `GFDIR_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LoaderConfig::from_env`] with an injectable variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LoaderConfig::default();
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(status) = lookup(ENV_STATUS) {
            config.status = status.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    ENV_TIMEOUT_SECS, secs
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the endpoint is an absolute http(s) URL, the status is set and
    /// the timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        let url = self.endpoint_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "endpoint must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.status.is_empty() {
            return Err(Error::Config("status must not be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }

    /// Parsed endpoint URL
    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint {:?}: {}", self.endpoint, e)))
    }
}
