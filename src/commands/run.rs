use anyhow::Result;
use futures::StreamExt;
use linkwatch::{
    config::Config,
    scheduler::{self, Scheduler},
    scraping::fetcher::{FetchConfig, FetchEngine},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn build_scheduler(config: &Config) -> Result<Scheduler> {
    let fetcher = FetchEngine::new(FetchConfig::from_config(&config.scraping))?;
    Scheduler::from_config(config, Arc::new(fetcher))
}

/// Run one cycle per interval until Ctrl-C. The cycle in flight when the
/// signal arrives is finished before exiting.
pub async fn run_scheduled(config: Config) -> Result<()> {
    let scheduler = build_scheduler(&config)?;
    let period = Duration::from_secs(config.scraping.interval_secs.max(1));
    info!("Watching {} sites every {:?}", config.sites.len(), period);

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested, finishing current cycle"),
            Err(e) => {
                warn!("Cannot listen for Ctrl-C: {}", e);
                futures::future::pending::<()>().await;
            }
        }
    };

    let ticks = scheduler::interval_ticks(period).take_until(shutdown);
    scheduler.run(ticks).await;
    Ok(())
}

/// Run a single cycle and exit
pub async fn run_once(config: Config) -> Result<()> {
    let scheduler = build_scheduler(&config)?;
    let report = scheduler.run_cycle().await;

    info!(
        "Done: {} new items, {} suppressed, {} sites with problems",
        report.item_count(),
        report.filter.suppressed,
        report.failed_sites()
    );
    Ok(())
}
