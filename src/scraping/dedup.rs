//! Cross-cycle deduplication
//!
//! Every reported item leaves its content hash in a persistent ledger. On the
//! next cycle, items whose hash is still in the ledger are suppressed.
//! Entries expire after a wall-clock TTL, so an item that is republished
//! after expiry is reported again.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::types::{ItemKey, LinkSet};

/// Persistent key/value store of previously reported items
pub trait Ledger: Send {
    /// Record `key` as seen at `seen_at`
    fn put(&mut self, key: &ItemKey, seen_at: DateTime<Utc>) -> Result<()>;
    /// When `key` was recorded, if it is still live
    fn read(&self, key: &ItemKey) -> Result<Option<DateTime<Utc>>>;
    /// Remove expired entries, returning how many were removed
    fn cleanup(&mut self) -> Result<usize>;
    /// Flush pending writes
    fn close(&mut self) -> Result<()>;
}

/// Ledger backed by a sled database
pub struct SledLedger {
    db: sled::Db,
    items: sled::Tree,
    ttl: chrono::Duration,
}

impl SledLedger {
    /// Open or create the ledger at `path`
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create ledger directory {:?}", parent))?;
        }
        let db = sled::open(path)
            .with_context(|| format!("Failed to open ledger database at {:?}", path))?;
        let items = db.open_tree("items").context("Failed to open ledger items tree")?;
        let ttl = chrono::Duration::from_std(ttl).context("Ledger TTL out of range")?;

        Ok(Self { db, items, ttl })
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn is_expired(&self, seen_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - seen_at > self.ttl
    }
}

fn encode_timestamp(at: DateTime<Utc>) -> [u8; 8] {
    at.timestamp_millis().to_be_bytes()
}

fn decode_timestamp(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let millis = i64::from_be_bytes(bytes.try_into().ok()?);
    Utc.timestamp_millis_opt(millis).single()
}

impl Ledger for SledLedger {
    fn put(&mut self, key: &ItemKey, seen_at: DateTime<Utc>) -> Result<()> {
        self.items
            .insert(key.as_bytes(), &encode_timestamp(seen_at))
            .with_context(|| format!("Failed to store ledger entry {}", key))?;
        Ok(())
    }

    fn read(&self, key: &ItemKey) -> Result<Option<DateTime<Utc>>> {
        let Some(data) = self
            .items
            .get(key.as_bytes())
            .with_context(|| format!("Failed to read ledger entry {}", key))?
        else {
            return Ok(None);
        };

        match decode_timestamp(&data) {
            Some(seen_at) if !self.is_expired(seen_at, Utc::now()) => Ok(Some(seen_at)),
            Some(_) => Ok(None),
            None => {
                warn!("Corrupt ledger entry {}, treating as unseen", key);
                Ok(None)
            }
        }
    }

    fn cleanup(&mut self) -> Result<usize> {
        let now = Utc::now();
        let mut expired = Vec::new();

        for entry in self.items.iter() {
            let (key, value) = entry.context("Failed to scan ledger")?;
            let stale = decode_timestamp(&value).map_or(true, |at| self.is_expired(at, now));
            if stale {
                expired.push(key);
            }
        }

        for key in &expired {
            self.items
                .remove(key)
                .context("Failed to remove expired ledger entry")?;
        }

        if !expired.is_empty() {
            debug!("Removed {} expired ledger entries", expired.len());
        }
        Ok(expired.len())
    }

    fn close(&mut self) -> Result<()> {
        self.db.flush().context("Failed to flush ledger database")?;
        Ok(())
    }
}

/// Outcome of filtering a cycle's sets against the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Items removed because they were reported before
    pub suppressed: usize,
    /// New items recorded in the ledger
    pub recorded: usize,
    /// Items kept although the ledger could not record them
    pub write_failures: usize,
}

/// Suppresses already-reported items, one ledger call at a time
pub struct LedgerFilter<'a> {
    ledger: &'a mut dyn Ledger,
}

impl<'a> LedgerFilter<'a> {
    pub fn new(ledger: &'a mut dyn Ledger) -> Self {
        Self { ledger }
    }

    /// Remove seen items from `sets` and record the rest.
    ///
    /// Ledger failures keep the item: a duplicate notification is preferred
    /// over a lost one.
    pub fn apply(&mut self, sets: &mut [LinkSet]) -> FilterStats {
        let now = Utc::now();
        let mut stats = FilterStats::default();

        for set in sets.iter_mut() {
            let before = set.items.len();
            set.items.retain(|_, item| {
                let key = item.key();
                match self.ledger.read(&key) {
                    Ok(Some(_)) => {
                        stats.suppressed += 1;
                        return false;
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Ledger read failed for {}: {:#}", item.link_url, e),
                }
                match self.ledger.put(&key, now) {
                    Ok(()) => stats.recorded += 1,
                    Err(e) => {
                        warn!("Ledger write failed for {}: {:#}", item.link_url, e);
                        stats.write_failures += 1;
                    }
                }
                true
            });
            debug!("{}: {} of {} items are new", set.name, set.items.len(), before);
        }

        info!(
            "Ledger filter: {} new, {} suppressed, {} unrecorded",
            stats.recorded, stats.suppressed, stats.write_failures
        );
        stats
    }
}
