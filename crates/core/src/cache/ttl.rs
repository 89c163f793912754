//! Time-bounded document cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::document::Document;

#[derive(Debug, Clone)]
struct CacheEntry {
    document: Document,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Keyed copy of single documents with a fixed live time per entry.
///
/// Entries are never invalidated by writes; a cached document can be stale
/// until it expires. There is no capacity bound.
#[derive(Debug)]
pub struct DocumentCache {
    entries: DashMap<i64, CacheEntry>,
    live_time: Duration,
}

impl DocumentCache {
    pub fn new(live_time: Duration) -> Self {
        Self { entries: DashMap::new(), live_time }
    }

    pub fn live_time(&self) -> Duration {
        self.live_time
    }

    /// Return a copy of the cached document if present and unexpired.
    ///
    /// An expired entry found here is removed.
    pub fn get(&self, id: i64) -> Option<Document> {
        let now = Instant::now();
        let expired = match self.entries.get(&id) {
            Some(entry) if entry.is_fresh(now) => return Some(entry.document.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(&id, |_, entry| !entry.is_fresh(now));
        }
        None
    }

    /// Store or overwrite the entry for `document.id`, resetting its expiry.
    pub fn set(&self, document: Document) {
        let expires_at = Instant::now() + self.live_time;
        self.entries.insert(document.id, CacheEntry { document, expires_at });
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.is_fresh(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn a background task that purges expired entries every `interval`.
    ///
    /// The task runs until the returned handle is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = cache.len(), "purged expired cache entries");
                }
            }
        })
    }
}
