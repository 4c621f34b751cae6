//! Link-item extraction from list pages
//!
//! Two strategies:
//! - Manual: item, caption, and link selectors name every part of an entry
//! - Automatic: only the link selector is given; item wrappers are inferred
//!   from repeating DOM structure and captions from text statistics

mod automatic;
mod caption;
mod manual;
mod text;
mod types;

pub use automatic::{find_containers, LinkContainer};
pub use caption::{CaptionCandidate, CaptionScorer};
pub use text::{normalize_text, word_count};
pub use types::*;

use scraper::Html;
use tracing::debug;

use crate::scraping::set_builder::LinkSetBuilder;
use crate::types::LinkSet;

/// Link extractor
pub struct LinkExtractor {
    pub(crate) config: ExtractorConfig,
}

impl LinkExtractor {
    /// Create a new link extractor
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract raw link candidates from a parsed document
    pub fn extract(&self, document: &Html, site: &SelectorConfig) -> Result<Vec<RawLink>, ExtractError> {
        match &site.mode {
            ExtractionMode::Manual { item, caption, link } => {
                manual::extract_manual(document, item, caption, link, &site.origin)
            }
            ExtractionMode::Automatic {
                link,
                min_caption_words,
            } => automatic::extract_automatic(document, link, *min_caption_words, &site.origin),
        }
    }

    /// Parse `html` and build the site's link set.
    ///
    /// Extraction failures never escape: they become the set's message and
    /// the set stays empty.
    pub fn extract_set(&self, html: &str, site: &SelectorConfig) -> LinkSet {
        let document = Html::parse_document(html);
        let mut builder = LinkSetBuilder::new(&site.name)
            .max_items(site.max_items)
            .caption_max_words(self.config.caption_max_words);

        match self.extract(&document, site) {
            Ok(links) => {
                debug!("{}: {} link candidates", site.name, links.len());
                builder.extend(links);
            }
            Err(e) => {
                debug!("{}: extraction failed: {}", site.name, e);
                builder.message(e.to_string());
            }
        }

        builder.build()
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}
