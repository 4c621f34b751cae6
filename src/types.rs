//! Core types for linkwatch

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Link Items
// ============================================================================

/// A single (URL, caption) pair extracted from a list page.
///
/// Two items are the same entity when both fields are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkItem {
    /// Absolute URL the entry points to
    pub link_url: String,
    /// Human-readable caption (may be empty for manual selectors without a caption match)
    pub caption: String,
}

impl LinkItem {
    pub fn new(link_url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            link_url: link_url.into(),
            caption: caption.into(),
        }
    }

    /// Ledger key for this item
    pub fn key(&self) -> ItemKey {
        ItemKey::compute(self)
    }
}

/// Content hash identifying a link item in the dedup ledger (64-character hex string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey(pub String);

impl ItemKey {
    /// SHA256 over the JSON serialization of the item.
    ///
    /// Field order is fixed by the struct definition, so the key is stable
    /// across runs and independent of map iteration order.
    pub fn compute(item: &LinkItem) -> Self {
        // Serializing two plain strings cannot fail; fall back to a manual
        // encoding anyway so the key is always defined.
        let serialized = serde_json::to_vec(item)
            .unwrap_or_else(|_| format!("{}\n{}", item.link_url, item.caption).into_bytes());
        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        ItemKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Per-site result sets
// ============================================================================

/// Outcome of fetching one site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetStatus {
    Ok,
    Forbidden,
    NotFound,
    RateLimited,
    ClientError,
    ServerError,
    UnexpectedStatus,
    Transport,
    Timeout,
}

impl SetStatus {
    /// Map a non-success HTTP status code to a set status
    pub fn from_http_status(code: u16) -> Self {
        match code {
            200..=299 => SetStatus::Ok,
            403 => SetStatus::Forbidden,
            404 => SetStatus::NotFound,
            429 => SetStatus::RateLimited,
            400..=499 => SetStatus::ClientError,
            500..=599 => SetStatus::ServerError,
            _ => SetStatus::UnexpectedStatus,
        }
    }

    /// Diagnostic shown to the reader of the notification
    pub fn message(&self) -> &'static str {
        match self {
            SetStatus::Ok => "ok",
            SetStatus::Forbidden => "the site refused access to the page (permission denied)",
            SetStatus::NotFound => "the page could not be found",
            SetStatus::RateLimited => "the site is rate limiting requests, try again later",
            SetStatus::ClientError => "the site rejected the request",
            SetStatus::ServerError => "the site failed to serve the page",
            SetStatus::UnexpectedStatus => "the site answered with an unexpected status",
            SetStatus::Transport => "the page could not be fetched",
            SetStatus::Timeout => "fetching and extracting the page timed out",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SetStatus::Ok)
    }
}

impl fmt::Display for SetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SetStatus::Ok => "ok",
            SetStatus::Forbidden => "forbidden",
            SetStatus::NotFound => "not_found",
            SetStatus::RateLimited => "rate_limited",
            SetStatus::ClientError => "client_error",
            SetStatus::ServerError => "server_error",
            SetStatus::UnexpectedStatus => "unexpected_status",
            SetStatus::Transport => "transport",
            SetStatus::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Link items and diagnostics gathered from one site in one cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSet {
    /// Site label
    pub name: String,
    /// Fetch outcome
    pub status: SetStatus,
    /// Items keyed by resolved URL
    pub items: HashMap<String, LinkItem>,
    /// Human-readable diagnostics, in the order they were raised
    pub messages: Vec<String>,
}

impl LinkSet {
    /// Create an empty, successful set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: SetStatus::Ok,
            items: HashMap::new(),
            messages: Vec::new(),
        }
    }

    /// Create an empty set carrying an upstream failure
    pub fn failed(name: impl Into<String>, status: SetStatus, message: impl Into<String>) -> Self {
        let mut set = Self::new(name);
        set.status = status;
        set.messages.push(message.into());
        set
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the set carries anything worth reporting
    pub fn has_content(&self) -> bool {
        !self.items.is_empty() || !self.messages.is_empty()
    }

    /// Items sorted by caption, then URL, for stable presentation
    pub fn sorted_items(&self) -> Vec<&LinkItem> {
        let mut items: Vec<&LinkItem> = self.items.values().collect();
        items.sort_by(|a, b| {
            a.caption
                .cmp(&b.caption)
                .then_with(|| a.link_url.cmp(&b.link_url))
        });
        items
    }
}
