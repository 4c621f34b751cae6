//! Integration tests for linkwatch
//!
//! These tests run whole cycles against canned pages: configuration in,
//! filtered sets and delivered reports out. No network access is needed.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use linkwatch::{
    config::{Config, SiteConfig},
    scheduler::Scheduler,
    scraping::{
        coordinator::{CoordinatorConfig, ScrapeCoordinator},
        dedup::{Ledger, SledLedger},
        extractor::{LinkExtractor, AMBIGUOUS_CAPTION_PLACEHOLDER},
        fetcher::{FetchError, FetchResponse, Fetcher},
    },
    types::{LinkItem, LinkSet, SetStatus},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

const HOT_TAKES: &str = r#"<!DOCTYPE html>
<html>
<head><title>Takes</title></head>
<body>
  <header><nav><a href="/">Home</a></nav></header>
  <ul class="takes">
    <li><img src="/img/1.png"><span class="itemName">This is a hot take!</span><a href="/stories/hot-take">Click here</a></li>
    <li><img src="/img/2.png"><span class="itemName">This is a cold take!</span><a href="/stories/cold-take">Click here</a></li>
    <li><img src="/img/3.png"><span class="itemName">This is a lukewarm take!</span><a href="/stories/lukewarm-take">Click here</a></li>
  </ul>
</body>
</html>"#;

/// Serves canned bodies by URL; the bodies can be swapped between cycles
#[derive(Clone, Default)]
struct CannedFetcher {
    pages: Arc<Mutex<HashMap<String, (u16, String)>>>,
}

impl CannedFetcher {
    fn serve(&self, url: &str, status: u16, body: impl Into<String>) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.into()));
    }
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let (status_code, body) = self
            .pages
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .unwrap_or((404, String::new()));
        Ok(FetchResponse {
            final_url: url.clone(),
            status_code,
            body,
            fetch_duration: Duration::from_millis(1),
        })
    }
}

fn numbered_list(count: usize) -> String {
    let items: String = (1..=count)
        .map(|i| {
            format!(
                r#"<div class="entry"><h4 class="title">Entry number {} in the feed</h4><a class="go" href="/entries/{}">open</a></div>"#,
                i, i
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", items)
}

fn coordinator(fetcher: &CannedFetcher, sites: Vec<SiteConfig>) -> ScrapeCoordinator {
    let sites = sites
        .iter()
        .map(|site| site.to_selector_config().unwrap())
        .collect();
    ScrapeCoordinator::new(
        CoordinatorConfig::default(),
        Arc::new(fetcher.clone()),
        LinkExtractor::default(),
        sites,
    )
}

fn by_name(sets: &[LinkSet]) -> HashMap<&str, &LinkSet> {
    sets.iter().map(|s| (s.name.as_str(), s)).collect()
}

/// Three hot takes, automatic mode: captions come from the itemName spans
#[tokio::test]
async fn test_automatic_detection_scenario() {
    let fetcher = CannedFetcher::default();
    fetcher.serve("http://www.example.com/", 200, HOT_TAKES);

    let coordinator = coordinator(
        &fetcher,
        vec![SiteConfig::automatic("takes", "http://www.example.com", "ul.takes a")],
    );
    let sets = coordinator.scrape_all().await;
    assert_eq!(sets.len(), 1);

    let set = &sets[0];
    assert!(set.messages.is_empty());
    assert_eq!(set.len(), 3);
    assert_eq!(
        set.items["http://www.example.com/stories/hot-take"],
        LinkItem::new("http://www.example.com/stories/hot-take", "This is a hot take!")
    );
    assert_eq!(
        set.items["http://www.example.com/stories/cold-take"].caption,
        "This is a cold take!"
    );
    assert_eq!(
        set.items["http://www.example.com/stories/lukewarm-take"].caption,
        "This is a lukewarm take!"
    );
}

#[tokio::test]
async fn test_link_selector_matching_span_reports_message() {
    let fetcher = CannedFetcher::default();
    fetcher.serve("http://www.example.com/", 200, HOT_TAKES);

    let coordinator = coordinator(
        &fetcher,
        vec![SiteConfig::automatic("takes", "http://www.example.com", "span.itemName")],
    );
    let sets = coordinator.scrape_all().await;

    assert!(sets[0].is_empty());
    assert_eq!(
        sets[0].messages,
        vec!["the link selector does not match a link but rather span".to_string()]
    );
}

#[tokio::test]
async fn test_max_items_caps_manual_set() {
    let fetcher = CannedFetcher::default();
    fetcher.serve("https://feed.example/", 200, numbered_list(10));

    let mut site = SiteConfig::manual("feed", "https://feed.example/", "div.entry", "h4.title", "a.go");
    site.max_items = 5;
    let capped = coordinator(&fetcher, vec![site.clone()]).scrape_all().await;
    assert_eq!(capped[0].len(), 5);

    site.max_items = 0;
    let unbounded = coordinator(&fetcher, vec![site]).scrape_all().await;
    assert_eq!(unbounded[0].len(), 10);
    assert_eq!(
        unbounded[0].items["https://feed.example/entries/7"].caption,
        "Entry number 7 in the feed"
    );
}

#[tokio::test]
async fn test_ambiguous_caption_selector_yields_placeholder() {
    let fetcher = CannedFetcher::default();
    fetcher.serve(
        "https://dual.example/",
        200,
        r#"<ul>
            <li><b>Part one</b><b>Part two</b><a href="/a">a</a></li>
            <li><b>Part three</b><b>Part four</b><a href="/b">b</a></li>
        </ul>"#,
    );

    let coordinator = coordinator(
        &fetcher,
        vec![SiteConfig::manual("dual", "https://dual.example/", "li", "b", "a")],
    );
    let sets = coordinator.scrape_all().await;

    assert_eq!(sets[0].len(), 2);
    assert!(sets[0]
        .items
        .values()
        .all(|item| item.caption == AMBIGUOUS_CAPTION_PLACEHOLDER));
}

/// A rate-limited site reports its message; the others are unaffected
#[tokio::test]
async fn test_rate_limited_site_is_isolated() {
    let fetcher = CannedFetcher::default();
    fetcher.serve("http://www.example.com/", 200, HOT_TAKES);
    fetcher.serve("https://busy.example/", 429, "Too Many Requests");

    let coordinator = coordinator(
        &fetcher,
        vec![
            SiteConfig::automatic("takes", "http://www.example.com", "ul.takes a"),
            SiteConfig::automatic("busy", "https://busy.example/", "a"),
        ],
    );
    let sets = coordinator.scrape_all().await;
    let sets = by_name(&sets);

    assert_eq!(sets["busy"].status, SetStatus::RateLimited);
    assert!(sets["busy"].is_empty());
    assert_eq!(sets["busy"].messages, vec![SetStatus::RateLimited.message().to_string()]);
    assert_eq!(sets["takes"].len(), 3);
}

/// Items are reported once, and again when their content changes
#[tokio::test]
async fn test_items_reported_once_across_cycles() {
    let temp_dir = TempDir::new().unwrap();
    let ledger_path = temp_dir.path().join("ledger");
    let ttl = Duration::from_secs(72 * 3600);

    let fetcher = CannedFetcher::default();
    fetcher.serve("http://www.example.com/", 200, HOT_TAKES);
    let coordinator = coordinator(
        &fetcher,
        vec![SiteConfig::automatic("takes", "http://www.example.com", "ul.takes a")],
    );

    let mut ledger = SledLedger::open(&ledger_path, ttl).unwrap();
    let first = coordinator.run_cycle(&mut ledger).await;
    assert_eq!(first.item_count(), 3);
    drop(ledger);

    let mut ledger = SledLedger::open(&ledger_path, ttl).unwrap();
    let second = coordinator.run_cycle(&mut ledger).await;
    assert_eq!(second.item_count(), 0);
    assert_eq!(second.filter.suppressed, 3);
    drop(ledger);

    fetcher.serve(
        "http://www.example.com/",
        200,
        HOT_TAKES.replace("This is a cold take!", "This is a frozen take!"),
    );
    let mut ledger = SledLedger::open(&ledger_path, ttl).unwrap();
    let third = coordinator.run_cycle(&mut ledger).await;
    assert_eq!(third.item_count(), 1);
    assert_eq!(
        third.sets[0].items["http://www.example.com/stories/cold-take"].caption,
        "This is a frozen take!"
    );
}

/// Once a ledger entry is older than the TTL its item is reported again
#[tokio::test]
async fn test_expired_entries_are_reported_again() {
    let temp_dir = TempDir::new().unwrap();
    let ttl = Duration::from_secs(72 * 3600);
    let mut ledger = SledLedger::open(temp_dir.path().join("ledger"), ttl).unwrap();

    let stale = LinkItem::new("http://www.example.com/stories/hot-take", "This is a hot take!");
    let fresh = LinkItem::new("http://www.example.com/stories/cold-take", "This is a cold take!");
    ledger.put(&stale.key(), Utc::now() - ChronoDuration::hours(73)).unwrap();
    ledger.put(&fresh.key(), Utc::now() - ChronoDuration::hours(1)).unwrap();

    let fetcher = CannedFetcher::default();
    fetcher.serve("http://www.example.com/", 200, HOT_TAKES);
    let coordinator = coordinator(
        &fetcher,
        vec![SiteConfig::automatic("takes", "http://www.example.com", "ul.takes a")],
    );

    let report = coordinator.run_cycle(&mut ledger).await;
    let set = &report.sets[0];

    assert_eq!(set.len(), 2);
    assert!(set.items.contains_key(&stale.link_url));
    assert!(!set.items.contains_key(&fresh.link_url));
    assert_eq!(report.filter.suppressed, 1);
}

/// Full path from a TOML configuration to files in the outbox
#[tokio::test]
async fn test_scheduler_delivers_to_outbox() {
    let temp_dir = TempDir::new().unwrap();
    let mut config: Config = toml::from_str(
        r#"
        [notify]
        delivery = "outbox"
        subject = "Fresh links"

        [[sites]]
        name = "takes"
        url = "http://www.example.com"
        link_selector = "ul.takes a"

        [[sites]]
        name = "busy"
        url = "https://busy.example/"
        link_selector = "a"
        "#,
    )
    .unwrap();
    config.ledger.path = temp_dir.path().join("ledger");
    config.notify.outbox_dir = temp_dir.path().join("outbox");
    config.validate().unwrap();

    let fetcher = CannedFetcher::default();
    fetcher.serve("http://www.example.com/", 200, HOT_TAKES);
    fetcher.serve("https://busy.example/", 429, "");

    let scheduler = Scheduler::from_config(&config, Arc::new(fetcher)).unwrap();
    let cycles = scheduler.run(futures::stream::iter(vec![()])).await;
    assert_eq!(cycles, 1);

    let mut files: Vec<_> = std::fs::read_dir(&config.notify.outbox_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    assert_eq!(files.len(), 2);

    let text_file = files
        .iter()
        .find(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .unwrap();
    let text = std::fs::read_to_string(text_file).unwrap();
    assert!(text.starts_with("Subject: Fresh links (3)"));
    assert!(text.contains("== busy ==\n! the site is rate limiting requests, try again later"));
    assert!(text.contains("- This is a hot take!\n  http://www.example.com/stories/hot-take"));

    let html_file = files
        .iter()
        .find(|p| p.extension().is_some_and(|ext| ext == "html"))
        .unwrap();
    let html = std::fs::read_to_string(html_file).unwrap();
    assert!(html.contains(r#"<a href="http://www.example.com/stories/lukewarm-take">This is a lukewarm take!</a>"#));
}
