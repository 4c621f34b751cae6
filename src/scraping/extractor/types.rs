//! Link extraction types

use scraper::Selector;
use thiserror::Error;
use url::Url;

/// Caption used when the caption selector matches more than once inside an item
pub const AMBIGUOUS_CAPTION_PLACEHOLDER: &str = "[Missing caption due to ambiguous selector]";

/// Errors that stop extraction for a whole site.
///
/// The display text is the diagnostic attached to the site's set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("the item selector did not match anything")]
    NoItems,
    #[error("no links in the list item")]
    NoLinkInItem,
    #[error("ambiguous link selector")]
    AmbiguousLinkSelector,
    #[error("the link selector does not match a link but rather {0}")]
    NotALink(String),
    #[error("the link selector did not match anything")]
    NoLinks,
    #[error("the link selector yields no usable structure")]
    NoStructure,
    #[error("inconsistent container structure: {0}")]
    Inconsistent(String),
}

/// How link items are located on a page
#[derive(Debug, Clone)]
pub enum ExtractionMode {
    /// Item wrappers, captions, and links are all named explicitly
    Manual {
        item: Selector,
        caption: Selector,
        link: Selector,
    },
    /// Only the links are named; wrappers and captions are inferred
    Automatic {
        link: Selector,
        min_caption_words: usize,
    },
}

/// Validated description of how to find link items in one site's HTML
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Site label
    pub name: String,
    /// Page the list lives on; relative links resolve against its scheme and host
    pub origin: Url,
    pub mode: ExtractionMode,
    /// Maximum number of items kept per cycle (0 = unbounded)
    pub max_items: usize,
}

/// A (URL, caption) candidate before set building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// Resolved absolute URL
    pub url: String,
    pub caption: String,
    /// Keep the item even if the caption is blank (manual selector without caption match)
    pub keep_empty_caption: bool,
}

impl RawLink {
    pub fn new(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            caption: caption.into(),
            keep_empty_caption: false,
        }
    }
}

/// Configuration for link extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Captions longer than this many words are shortened (0 = never)
    pub caption_max_words: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            caption_max_words: 20,
        }
    }
}

/// Parse a CSS selector, rendering the parse error as text
pub fn compile_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| e.to_string())
}
