//! Cycle scheduling
//!
//! The scheduler consumes a stream of ticks and runs one complete cycle per
//! tick. The next tick is not polled until the previous cycle's delivery has
//! finished, so cycles never overlap.

use anyhow::Result;
use futures::{pin_mut, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

use crate::config::{Config, LedgerConfig};
use crate::notify::{delivery, Delivery, Renderer};
use crate::scraping::coordinator::{CoordinatorConfig, CycleReport, ScrapeCoordinator};
use crate::scraping::dedup::SledLedger;
use crate::scraping::extractor::{ExtractorConfig, LinkExtractor};
use crate::scraping::fetcher::Fetcher;

/// Ticks every `period`, starting immediately
pub fn interval_ticks(period: Duration) -> impl Stream<Item = ()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    IntervalStream::new(interval).map(|_| ())
}

/// Runs scrape cycles and delivers their reports
pub struct Scheduler {
    coordinator: ScrapeCoordinator,
    ledger: LedgerConfig,
    renderer: Renderer,
    delivery: Box<dyn Delivery>,
    skip_empty: bool,
}

impl Scheduler {
    pub fn new(
        coordinator: ScrapeCoordinator,
        ledger: LedgerConfig,
        renderer: Renderer,
        delivery: Box<dyn Delivery>,
        skip_empty: bool,
    ) -> Self {
        Self {
            coordinator,
            ledger,
            renderer,
            delivery,
            skip_empty,
        }
    }

    /// Wire up a scheduler from a validated configuration
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let sites = config.selector_configs()?;
        if sites.is_empty() {
            anyhow::bail!("no sites configured");
        }

        let extractor = LinkExtractor::new(ExtractorConfig {
            caption_max_words: config.scraping.caption_max_words,
        });
        let coordinator = ScrapeCoordinator::new(
            CoordinatorConfig::from_config(&config.scraping),
            fetcher,
            extractor,
            sites,
        );

        Ok(Self::new(
            coordinator,
            config.ledger.clone(),
            Renderer::new(&config.notify.subject),
            delivery::from_config(&config.notify),
            config.notify.skip_empty,
        ))
    }

    /// Run one cycle and deliver its report.
    ///
    /// A ledger that cannot be opened does not stop the cycle: every item is
    /// reported unfiltered. Delivery failures are logged.
    pub async fn run_cycle(&self) -> CycleReport {
        let report = match SledLedger::open(&self.ledger.path, self.ledger.ttl()) {
            Ok(mut ledger) => self.coordinator.run_cycle(&mut ledger).await,
            Err(e) => {
                warn!("Ledger at {:?} unavailable: {:#}", self.ledger.path, e);
                self.coordinator.run_cycle_unfiltered().await
            }
        };

        if self.skip_empty && !report.has_content() {
            debug!("Nothing new this cycle, skipping delivery");
            return report;
        }

        let rendered = self.renderer.render(&report.sets);
        if let Err(e) = self.delivery.deliver(&rendered).await {
            warn!("Delivery failed: {:#}", e);
        }
        report
    }

    /// Run one cycle per tick until the stream ends. Returns the number of
    /// cycles that completed.
    pub async fn run<S>(&self, ticks: S) -> usize
    where
        S: Stream<Item = ()>,
    {
        pin_mut!(ticks);
        let mut completed = 0;

        while ticks.next().await.is_some() {
            let report = self.run_cycle().await;
            completed += 1;
            info!(
                "Cycle {} done: {} new items across {} sites",
                completed,
                report.item_count(),
                report.sets.len()
            );
        }

        info!("Scheduler stopped after {} cycles", completed);
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::notify::Rendered;
    use crate::scraping::coordinator::UNFILTERED_MESSAGE;
    use crate::scraping::dedup::FilterStats;
    use crate::scraping::fetcher::{FetchError, FetchResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use url::Url;

    const PAGE: &str = r#"<ol>
        <li><p>A long enough caption for the first entry</p><a href="/1">link</a></li>
        <li><p>A long enough caption for the second entry</p><a href="/2">link</a></li>
    </ol>"#;

    struct StaticFetcher;

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
            Ok(FetchResponse {
                final_url: url.clone(),
                status_code: 200,
                body: PAGE.to_string(),
                fetch_duration: Duration::from_millis(1),
            })
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Rendered>>>);

    #[async_trait]
    impl Delivery for Recorder {
        async fn deliver(&self, message: &Rendered) -> Result<()> {
            self.0.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn scheduler(temp_dir: &TempDir, recorder: Recorder, skip_empty: bool) -> Scheduler {
        let sites = vec![SiteConfig::automatic("static", "https://static.example/list", "a")
            .to_selector_config()
            .unwrap()];
        let coordinator = ScrapeCoordinator::new(
            CoordinatorConfig::default(),
            Arc::new(StaticFetcher),
            LinkExtractor::default(),
            sites,
        );
        let ledger = LedgerConfig {
            path: temp_dir.path().join("ledger"),
            ttl_hours: 1,
        };
        Scheduler::new(coordinator, ledger, Renderer::default(), Box::new(recorder), skip_empty)
    }

    #[tokio::test]
    async fn test_one_delivery_per_tick_and_empty_cycles_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let scheduler = scheduler(&temp_dir, recorder.clone(), true);

        let completed = scheduler.run(futures::stream::iter(vec![(), (), ()])).await;
        assert_eq!(completed, 3);

        let delivered = recorder.0.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].subject, "New links (2)");
    }

    #[tokio::test]
    async fn test_empty_cycles_delivered_when_not_skipping() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let scheduler = scheduler(&temp_dir, recorder.clone(), false);

        scheduler.run(futures::stream::iter(vec![(), ()])).await;

        let delivered = recorder.0.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[1].subject, "New links (0)");
    }

    #[tokio::test]
    async fn test_run_cycle_reports_new_items() {
        let temp_dir = TempDir::new().unwrap();
        let scheduler = scheduler(&temp_dir, Recorder::default(), true);
        let report = scheduler.run_cycle().await;
        assert_eq!(report.item_count(), 2);
        assert_eq!(report.filter.recorded, 2);
    }

    #[tokio::test]
    async fn test_unusable_ledger_still_delivers_every_item() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-directory");
        std::fs::write(&blocker, "plain file").unwrap();

        let recorder = Recorder::default();
        let mut scheduler = scheduler(&temp_dir, recorder.clone(), true);
        scheduler.ledger.path = blocker.join("ledger");

        let report = scheduler.run_cycle().await;
        assert_eq!(report.item_count(), 2);
        assert_eq!(report.filter, FilterStats::default());
        assert_eq!(report.sets[0].messages, vec![UNFILTERED_MESSAGE.to_string()]);

        // Without a ledger nothing is suppressed on the next tick either
        assert_eq!(scheduler.run(futures::stream::iter(vec![()])).await, 1);

        let delivered = recorder.0.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert!(delivered.iter().all(|d| d.subject == "New links (2)"));
    }

    #[test]
    fn test_from_config_requires_sites() {
        let config = Config::default();
        assert!(Scheduler::from_config(&config, Arc::new(StaticFetcher)).is_err());
    }
}
