//! In-memory quote cache with lazy TTL expiration and a background sweep.
//!
//! Handles are cheap clones sharing one store. A `get` never returns an
//! entry older than its TTL, whether or not the sweep has removed it yet.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::quote::Quote;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// `SYMBOL|CONVERT`, delimited so `AB-CD` and `A-BCD` never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(symbol: &str, convert: &str) -> Self {
        Self(format!(
            "{}|{}",
            symbol.to_ascii_uppercase(),
            convert.to_ascii_uppercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

struct CacheEntry {
    quote: Quote,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

type Store = RwLock<HashMap<CacheKey, CacheEntry>>;

#[derive(Clone)]
pub struct QuoteCache {
    entries: Arc<Store>,
    ttl: Duration,
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Quote> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(entry.quote.clone())
    }

    /// Stores `quote` under `key`, replacing any previous entry and restarting its TTL.
    pub fn put(&self, key: CacheKey, quote: Quote) {
        let entry = CacheEntry {
            quote,
            inserted_at: Instant::now(),
            ttl: self.ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Number of stored entries, including expired ones the sweep has not reached.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn purge_expired(&self) -> usize {
        purge(&self.entries)
    }

    /// Starts a task that purges expired entries every `interval`, capped at
    /// [`MAX_INTERVAL`].
    ///
    /// The task only holds a weak handle and exits once every `QuoteCache`
    /// clone is dropped. Must be called from within a tokio runtime.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let entries = Arc::downgrade(&self.entries);
        tokio::spawn(sweep_loop(entries, interval.min(MAX_INTERVAL)))
    }
}

async fn sweep_loop(entries: Weak<Store>, interval: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(entries) = entries.upgrade() else {
            break;
        };
        purge(&entries);
    }
}

fn purge(entries: &Store) -> usize {
    let now = Instant::now();
    let mut entries = entries.write().unwrap_or_else(PoisonError::into_inner);
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    before - entries.len()
}
