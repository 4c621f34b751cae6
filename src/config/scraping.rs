//! Fetching, scheduling, and caption configuration

use serde::{Deserialize, Serialize};

use super::DEFAULT_USER_AGENT;

/// Scraping configuration shared by every site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// User agent string
    pub user_agent: String,
    /// Transport-level request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Upper bound for fetching and extracting one site (seconds)
    pub site_timeout_secs: u64,
    /// Time between two scheduled cycles (seconds)
    pub interval_secs: u64,
    /// Captions longer than this many words are shortened (0 = never)
    pub caption_max_words: usize,
    /// Maximum response size (bytes)
    pub max_content_size: usize,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            site_timeout_secs: 60,
            interval_secs: 3600, // hourly
            caption_max_words: 20,
            max_content_size: 10 * 1024 * 1024, // 10 MB
        }
    }
}
