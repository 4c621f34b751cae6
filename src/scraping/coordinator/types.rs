//! Coordinator types: configuration and cycle results

use std::time::Duration;

use crate::scraping::dedup::FilterStats;
use crate::types::LinkSet;

/// Configuration for the scrape coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Bound on one site's fetch and extraction
    pub site_timeout: Duration,
}

impl CoordinatorConfig {
    pub fn from_config(config: &crate::config::ScrapingConfig) -> Self {
        Self {
            site_timeout: Duration::from_secs(config.site_timeout_secs),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            site_timeout: Duration::from_secs(60),
        }
    }
}

/// Result of one full cycle across all sites
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Filtered sets, sorted by site name
    pub sets: Vec<LinkSet>,
    /// Ledger filtering outcome
    pub filter: FilterStats,
    /// Ledger entries expired during cleanup
    pub expired: usize,
    /// Wall-clock duration of the cycle
    pub duration: Duration,
}

impl CycleReport {
    /// New items across all sets
    pub fn item_count(&self) -> usize {
        self.sets.iter().map(LinkSet::len).sum()
    }

    /// Sites that reported a failure or extraction diagnostic
    pub fn failed_sites(&self) -> usize {
        self.sets.iter().filter(|s| !s.messages.is_empty()).count()
    }

    /// Whether any set carries items or messages
    pub fn has_content(&self) -> bool {
        self.sets.iter().any(LinkSet::has_content)
    }
}
