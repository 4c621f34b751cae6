//! Per-site link set building
//!
//! Turns raw (URL, caption) candidates into a `LinkSet`: one item per URL,
//! blank captions dropped, long captions shortened, and the per-site item cap
//! applied in document order.

use std::collections::HashMap;
use tracing::debug;

use crate::scraping::extractor::RawLink;
use crate::types::{LinkItem, LinkSet};
use crate::util::truncate_words;

/// Builder for one site's link set
pub struct LinkSetBuilder {
    name: String,
    max_items: usize,
    caption_max_words: usize,
    /// URLs in first-seen order
    order: Vec<String>,
    items: HashMap<String, LinkItem>,
    messages: Vec<String>,
    dropped: usize,
}

impl LinkSetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_items: 0,
            caption_max_words: 0,
            order: Vec::new(),
            items: HashMap::new(),
            messages: Vec::new(),
            dropped: 0,
        }
    }

    /// Keep at most `max_items` items (0 = unbounded)
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Shorten captions to this many words (0 = never)
    pub fn caption_max_words(mut self, caption_max_words: usize) -> Self {
        self.caption_max_words = caption_max_words;
        self
    }

    /// Add one candidate.
    ///
    /// A blank caption drops the candidate unless it is explicitly allowed to
    /// be empty. For a URL seen before, the later caption wins.
    pub fn push(&mut self, link: RawLink) {
        if link.caption.trim().is_empty() && !link.keep_empty_caption {
            debug!("{}: dropping {} (no caption)", self.name, link.url);
            self.dropped += 1;
            return;
        }

        let caption = truncate_words(&link.caption, self.caption_max_words);
        if !self.items.contains_key(&link.url) {
            self.order.push(link.url.clone());
        }
        self.items
            .insert(link.url.clone(), LinkItem::new(link.url, caption));
    }

    pub fn extend(&mut self, links: impl IntoIterator<Item = RawLink>) {
        for link in links {
            self.push(link);
        }
    }

    pub fn message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn build(mut self) -> LinkSet {
        if self.max_items > 0 && self.order.len() > self.max_items {
            debug!(
                "{}: keeping {} of {} items",
                self.name,
                self.max_items,
                self.order.len()
            );
            for url in self.order.drain(self.max_items..) {
                self.items.remove(&url);
            }
        }
        if self.dropped > 0 {
            debug!("{}: {} candidates dropped without caption", self.name, self.dropped);
        }

        let mut set = LinkSet::new(self.name);
        set.items = self.items;
        set.messages = self.messages;
        set
    }
}
