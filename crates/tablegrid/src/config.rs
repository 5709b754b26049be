//! Detector connection settings.

use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the detector base URL.
pub const ENV_DETECTOR_URL: &str = "TABLEGRID_DETECTOR_URL";
/// Environment variable holding the request timeout in seconds.
pub const ENV_DETECTOR_TIMEOUT: &str = "TABLEGRID_DETECTOR_TIMEOUT_SECS";

/// Where and how to reach the table detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Base URL; requests go to `<endpoint>/table_split`.
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Ask the detector for bordered tables.
    pub border_table: bool,
    /// Ask the detector for borderless tables.
    pub borderless_table: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".to_string(),
            timeout: Duration::from_secs(60),
            border_table: true,
            borderless_table: false,
        }
    }
}

impl DetectorConfig {
    /// Defaults overridden by `TABLEGRID_DETECTOR_URL` and
    /// `TABLEGRID_DETECTOR_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_DETECTOR_URL) {
            let url = url.trim();
            if url.is_empty() {
                return Err(Error::Config(format!("{ENV_DETECTOR_URL} is empty")));
            }
            config.endpoint = url.to_string();
        }
        if let Some(secs) = lookup(ENV_DETECTOR_TIMEOUT) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{ENV_DETECTOR_TIMEOUT} must be a whole number of seconds, got {secs:?}"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Full URL of the split endpoint.
    pub fn split_url(&self) -> String {
        format!("{}/table_split", self.endpoint.trim_end_matches('/'))
    }
}
