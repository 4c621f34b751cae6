//! Dedup ledger configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where previously reported items are remembered, and for how long
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory of the sled database
    pub path: PathBuf,
    /// Entries older than this are forgotten (hours)
    pub ttl_hours: u64,
}

impl LedgerConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 3600)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".linkwatch/ledger"),
            ttl_hours: 72,
        }
    }
}
