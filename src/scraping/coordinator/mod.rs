//! Scrape coordinator running one cycle across all configured sites
//!
//! Every site gets its own task doing fetch then extract, bounded by a
//! per-site timeout. Finished sets are collected over a channel; once every
//! task has reported, the sets are filtered against the ledger by a single
//! consumer, so the ledger never sees concurrent writers.

mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::dedup::{FilterStats, Ledger, LedgerFilter};
use super::extractor::{LinkExtractor, SelectorConfig};
use super::fetcher::{FetchError, Fetcher};
use crate::types::{LinkSet, SetStatus};

/// Orchestrates fetch, extraction, and deduplication for one cycle
pub struct ScrapeCoordinator {
    config: CoordinatorConfig,
    /// Page source, shared by all site tasks
    fetcher: Arc<dyn Fetcher>,
    /// Link extractor (Arc for spawn_blocking sharing)
    extractor: Arc<LinkExtractor>,
    sites: Vec<SelectorConfig>,
}

impl ScrapeCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        fetcher: Arc<dyn Fetcher>,
        extractor: LinkExtractor,
        sites: Vec<SelectorConfig>,
    ) -> Self {
        Self {
            config,
            fetcher,
            extractor: Arc::new(extractor),
            sites,
        }
    }

    pub fn sites(&self) -> &[SelectorConfig] {
        &self.sites
    }

    /// Fetch and extract every site in parallel and wait for all of them.
    ///
    /// The returned order is completion order.
    pub async fn scrape_all(&self) -> Vec<LinkSet> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        for site in &self.sites {
            let tx = tx.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            let site = site.clone();
            let site_timeout = self.config.site_timeout;

            tokio::spawn(async move {
                let name = site.name.clone();
                let mut task = tokio::spawn(scrape_site(fetcher, extractor, site));
                let set = match tokio::time::timeout(site_timeout, &mut task).await {
                    Ok(Ok(set)) => set,
                    Ok(Err(e)) => {
                        warn!("{}: site task failed: {}", name, e);
                        unprocessed(name)
                    }
                    Err(_) => {
                        task.abort();
                        warn!("{}: no result within {:?}, discarding", name, site_timeout);
                        LinkSet::failed(name, SetStatus::Timeout, SetStatus::Timeout.message())
                    }
                };
                // The receiver only goes away if the cycle itself was dropped
                let _ = tx.send(set);
            });
        }
        // Every task owns a sender; the channel closes when the last one finishes
        drop(tx);

        let mut sets = Vec::with_capacity(self.sites.len());
        while let Some(set) = rx.recv().await {
            debug!("{}: {} items, {} messages", set.name, set.len(), set.messages.len());
            sets.push(set);
        }

        if sets.len() != self.sites.len() {
            warn!(
                "{} of {} site tasks ended without a result",
                self.sites.len() - sets.len(),
                self.sites.len()
            );
        }
        sets
    }

    /// Run a full cycle: scrape all sites, drop already-reported items, then
    /// expire and close the ledger.
    pub async fn run_cycle(&self, ledger: &mut dyn Ledger) -> CycleReport {
        self.cycle(Some(ledger)).await
    }

    /// Run a cycle without a ledger. Nothing is suppressed or recorded, and
    /// every set with items says so.
    pub async fn run_cycle_unfiltered(&self) -> CycleReport {
        self.cycle(None).await
    }

    async fn cycle(&self, ledger: Option<&mut dyn Ledger>) -> CycleReport {
        let start = Instant::now();
        info!("Starting cycle over {} sites", self.sites.len());

        let mut sets = self.scrape_all().await;
        sets.sort_by(|a, b| a.name.cmp(&b.name));

        let (filter, expired) = match ledger {
            Some(ledger) => filter_and_close(ledger, &mut sets),
            None => {
                warn!("No ledger this cycle, previously reported items are not filtered out");
                for set in sets.iter_mut().filter(|set| !set.is_empty()) {
                    set.push_message(UNFILTERED_MESSAGE);
                }
                (FilterStats::default(), 0)
            }
        };

        let report = CycleReport {
            sets,
            filter,
            expired,
            duration: start.elapsed(),
        };
        info!(
            "Cycle finished in {:?}: {} new items, {} sites with problems",
            report.duration,
            report.item_count(),
            report.failed_sites()
        );
        report
    }
}

/// Set message when fetching or extracting a site panicked
pub const UNPROCESSED_MESSAGE: &str = "the page could not be processed";

/// Set message when the ledger could not be used
pub const UNFILTERED_MESSAGE: &str = "previously reported links could not be filtered out";

fn filter_and_close(ledger: &mut dyn Ledger, sets: &mut [LinkSet]) -> (FilterStats, usize) {
    let filter = LedgerFilter::new(ledger).apply(sets);

    let expired = match ledger.cleanup() {
        Ok(n) => n,
        Err(e) => {
            warn!("Ledger cleanup failed: {:#}", e);
            0
        }
    };
    if let Err(e) = ledger.close() {
        warn!("Ledger close failed: {:#}", e);
    }
    (filter, expired)
}

/// Fetch one site and extract its link set. Never fails: every problem
/// becomes a diagnostic on the returned set.
async fn scrape_site(fetcher: Arc<dyn Fetcher>, extractor: Arc<LinkExtractor>, site: SelectorConfig) -> LinkSet {
    let response = match fetcher.fetch(&site.origin).await {
        Ok(response) => response,
        Err(FetchError::Timeout(after)) => {
            warn!("{}: request timed out after {:?}", site.name, after);
            return LinkSet::failed(&site.name, SetStatus::Timeout, SetStatus::Timeout.message());
        }
        Err(e) => {
            warn!("{}: fetch failed: {}", site.name, e);
            return LinkSet::failed(&site.name, SetStatus::Transport, SetStatus::Transport.message());
        }
    };

    if !response.is_success() {
        let status = SetStatus::from_http_status(response.status_code);
        warn!("{}: {} answered HTTP {}", site.name, site.origin, response.status_code);
        return LinkSet::failed(&site.name, status, status.message());
    }

    debug!(
        "{}: fetched {} bytes in {:?}",
        site.name,
        response.body.len(),
        response.fetch_duration
    );

    // scraper's DOM is not Send; parse and extract on a blocking thread
    let name = site.name.clone();
    match tokio::task::spawn_blocking(move || extractor.extract_set(&response.body, &site)).await {
        Ok(set) => set,
        Err(e) => {
            warn!("{}: extraction task failed: {}", name, e);
            unprocessed(name)
        }
    }
}

/// Set for a site whose fetch or extraction panicked
fn unprocessed(name: String) -> LinkSet {
    let mut set = LinkSet::new(name);
    set.push_message(UNPROCESSED_MESSAGE);
    set
}
