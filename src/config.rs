// src/config.rs

//! Crawl configuration.
//!
//! Built at construction time from CLI flags; nothing is read from or
//! persisted to disk.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Settings for a single crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Number of concurrent workers draining the frontier
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Maximum number of URLs buffered in the frontier at once
    #[serde(default = "defaults::frontier_capacity")]
    pub frontier_capacity: usize,

    /// Token bucket size for outbound fetches
    #[serde(default = "defaults::rate_burst")]
    pub rate_burst: u32,

    /// Tokens replenished per second
    #[serde(default = "defaults::rate_per_sec")]
    pub rate_per_sec: u32,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl CrawlConfig {
    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(AppError::validation("workers must be > 0"));
        }
        if self.frontier_capacity == 0 {
            return Err(AppError::validation("frontier_capacity must be > 0"));
        }
        if self.rate_burst == 0 {
            return Err(AppError::validation("rate_burst must be > 0"));
        }
        if self.rate_per_sec == 0 {
            return Err(AppError::validation("rate_per_sec must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::validation("timeout_secs must be > 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::validation("user_agent is empty"));
        }
        Ok(())
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: defaults::workers(),
            frontier_capacity: defaults::frontier_capacity(),
            rate_burst: defaults::rate_burst(),
            rate_per_sec: defaults::rate_per_sec(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

mod defaults {
    pub fn workers() -> usize {
        10
    }
    pub fn frontier_capacity() -> usize {
        1000
    }
    pub fn rate_burst() -> u32 {
        6
    }
    pub fn rate_per_sec() -> u32 {
        6
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; sitecrawl/0.1)".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(CrawlConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = CrawlConfig::default();
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_rate() {
        let mut config = CrawlConfig::default();
        config.rate_per_sec = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = CrawlConfig::default();
        config.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
