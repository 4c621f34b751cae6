//! linkwatch: watch link-list pages and report new entries
//!
//! Each cycle fetches every configured list page, extracts (URL, caption)
//! items, and reports the ones not seen before. Featuring:
//! - Manual extraction from item, caption, and link selectors
//! - Automatic detection of item wrappers from repeating DOM structure
//! - Caption selection by text concentration scoring
//! - Cross-cycle deduplication through a persistent TTL ledger
//! - One batched notification per cycle

pub mod config;
pub mod notify;
pub mod scheduler;
pub mod scraping;
pub mod types;
pub mod util;

pub use config::Config;
pub use types::*;
