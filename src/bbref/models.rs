// src/bbref/models.rs
use std::time::Duration;

use reqwest::Url;
use serde::Serialize;

use crate::utils::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://www.basketball-reference.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/95.0.4638.69 Safari/537.36";
pub const DEFAULT_PARALLELISM: usize = 4;
// The site bans clients that hammer it; keep this generous.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 5000;

/// Knobs for one crawl over a season.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub season: String, // e.g. "2022" for the 2021-22 season
    pub base_url: Url,
    pub parallelism: usize,
    pub request_delay: Duration,
    pub user_agent: String,
}

impl CrawlSettings {
    pub fn new(season: &str, base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            season: season.to_string(),
            base_url,
            parallelism: DEFAULT_PARALLELISM,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Entry point of the crawl, e.g. `https://www.basketball-reference.com/teams/`
    pub fn teams_url(&self) -> Result<Url, FetchError> {
        self.base_url
            .join("/teams/")
            .map_err(|e| FetchError::InvalidUrl(format!("{}teams/: {}", self.base_url, e)))
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub gamelogs_written: usize,
    pub skipped: usize, // pages without a usable table or name
}
