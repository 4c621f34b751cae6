//! Link-list scraping
//!
//! Key components:
//! - `FetchEngine`: HTTP fetching behind the `Fetcher` trait
//! - `LinkExtractor`: manual and automatic link-item extraction
//! - `LinkSetBuilder`: per-site item sets with caps and cleanup
//! - `SledLedger` / `LedgerFilter`: suppression of items reported before
//! - `ScrapeCoordinator`: runs one cycle across all sites

pub mod coordinator;
pub mod dedup;
pub mod extractor;
pub mod fetcher;
pub mod set_builder;

pub use coordinator::ScrapeCoordinator;
pub use dedup::{Ledger, LedgerFilter, SledLedger};
pub use extractor::LinkExtractor;
pub use fetcher::{FetchEngine, Fetcher};
pub use set_builder::LinkSetBuilder;

use url::Url;

/// Resolve an `href` against the scheme and host of the page it was found on.
///
/// Returns `None` for non-web targets (`javascript:`, `mailto:`, ...) and for
/// values that do not form a valid URL.
pub(crate) fn resolve_link(origin: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut base = origin.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);

    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}
