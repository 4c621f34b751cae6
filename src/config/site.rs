//! Per-site selector configuration

use serde::{Deserialize, Serialize};
use url::Url;

use crate::scraping::extractor::{compile_selector, ExtractionMode, SelectorConfig};

/// Default minimum number of words a caption source must carry
pub const DEFAULT_MIN_CAPTION_WORDS: usize = 4;

/// One `[[sites]]` entry as written in the configuration file.
///
/// Manual mode is selected by giving `item_selector` and `caption_selector`
/// together; with only `link_selector` the site uses automatic detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Label used in notifications and logs
    pub name: String,
    /// Page that presents the list of links
    pub url: String,
    /// Selector matching the item wrappers (manual mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_selector: Option<String>,
    /// Selector matching the caption inside an item (manual mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_selector: Option<String>,
    /// Selector matching the link anchors
    pub link_selector: String,
    /// Minimum word count for caption sources (automatic mode)
    #[serde(default = "default_min_caption_words")]
    pub min_caption_words: usize,
    /// Maximum number of items reported per cycle (0 = unbounded)
    #[serde(default)]
    pub max_items: usize,
}

fn default_min_caption_words() -> usize {
    DEFAULT_MIN_CAPTION_WORDS
}

impl SiteConfig {
    /// Automatic-mode site with default thresholds
    pub fn automatic(name: impl Into<String>, url: impl Into<String>, link_selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            item_selector: None,
            caption_selector: None,
            link_selector: link_selector.into(),
            min_caption_words: DEFAULT_MIN_CAPTION_WORDS,
            max_items: 0,
        }
    }

    /// Manual-mode site
    pub fn manual(
        name: impl Into<String>,
        url: impl Into<String>,
        item_selector: impl Into<String>,
        caption_selector: impl Into<String>,
        link_selector: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            item_selector: Some(item_selector.into()),
            caption_selector: Some(caption_selector.into()),
            link_selector: link_selector.into(),
            min_caption_words: DEFAULT_MIN_CAPTION_WORDS,
            max_items: 0,
        }
    }

    /// Compile this entry into a validated selector configuration.
    ///
    /// Returns every problem found, prefixed with the site name.
    pub fn to_selector_config(&self) -> Result<SelectorConfig, Vec<String>> {
        let mut errors = Vec::new();
        let label = if self.name.trim().is_empty() {
            format!("site '{}'", self.url)
        } else {
            format!("site '{}'", self.name)
        };

        if self.name.trim().is_empty() {
            errors.push(format!("{}: name must not be empty", label));
        }

        let origin = match Url::parse(&self.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
            Ok(url) => {
                errors.push(format!("{}: unsupported URL scheme '{}'", label, url.scheme()));
                None
            }
            Err(e) => {
                errors.push(format!("{}: invalid URL '{}': {}", label, self.url, e));
                None
            }
        };

        let mut compile = |field: &str, selector: &str| match compile_selector(selector) {
            Ok(s) => Some(s),
            Err(e) => {
                errors.push(format!("{}: invalid {} '{}': {}", label, field, selector, e));
                None
            }
        };

        let link = compile("link_selector", &self.link_selector);
        let mode = match (&self.item_selector, &self.caption_selector) {
            (Some(item), Some(caption)) => {
                let item = compile("item_selector", item);
                let caption = compile("caption_selector", caption);
                match (item, caption, link) {
                    (Some(item), Some(caption), Some(link)) => {
                        Some(ExtractionMode::Manual { item, caption, link })
                    }
                    _ => None,
                }
            }
            (None, None) => {
                if self.min_caption_words == 0 {
                    errors.push(format!("{}: min_caption_words must be positive", label));
                }
                link.map(|link| ExtractionMode::Automatic {
                    link,
                    min_caption_words: self.min_caption_words.max(1),
                })
            }
            _ => {
                errors.push(format!(
                    "{}: item_selector and caption_selector must be given together",
                    label
                ));
                None
            }
        };

        match (origin, mode) {
            (Some(origin), Some(mode)) if errors.is_empty() => Ok(SelectorConfig {
                name: self.name.clone(),
                origin,
                mode,
                max_items: self.max_items,
            }),
            _ => Err(errors),
        }
    }
}
