//! # Search Cache & Change Events
//!
//! Time-boxed caching of search results with change-event invalidation.
//!
//! ## Invalidation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cache Invalidation                                 │
//! │                                                                         │
//! │  Persistence write                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  broadcast::Sender<ChangeEvent { venue_id, date }>                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  spawn_invalidation_listener ──► cache.invalidate(venue, date)         │
//! │                                                                         │
//! │  Lagged receiver: entries may be stale, so the whole cache is          │
//! │  cleared rather than guessing which events were missed.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The TTL is the primary freshness bound; events tighten it for writes
//! that land between searches.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use seatwise_core::SlotResult;

// =============================================================================
// Change Event
// =============================================================================

/// Emitted by the persistence layer whenever reservation state changes
/// for a (venue, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub venue_id: String,
    pub date: NaiveDate,
}

// =============================================================================
// Search Cache
// =============================================================================

/// Key identifying one search request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    venue_id: String,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    party_size: u32,
}

struct CacheEntry {
    inserted_at: Instant,
    results: Vec<SlotResult>,
}

/// Time-boxed cache of search results, keyed by the full request.
///
/// Interior mutability via a std Mutex: lookups never hold the lock across
/// an await point, so an async lock buys nothing here.
pub struct SearchCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        SearchCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns a fresh cached result for the request, if any.
    pub fn get(
        &self,
        venue_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        party_size: u32,
    ) -> Option<Vec<SlotResult>> {
        let key = CacheKey {
            venue_id: venue_id.to_string(),
            date,
            start,
            end,
            party_size,
        };
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(&key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.results.clone())
    }

    /// Stores a search result.
    pub fn insert(
        &self,
        venue_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        party_size: u32,
        results: Vec<SlotResult>,
    ) {
        let key = CacheKey {
            venue_id: venue_id.to_string(),
            date,
            start,
            end,
            party_size,
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                CacheEntry {
                    inserted_at: Instant::now(),
                    results,
                },
            );
        }
    }

    /// Drops every entry for a (venue, date).
    pub fn invalidate(&self, venue_id: &str, date: NaiveDate) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|key, _| key.venue_id != venue_id || key.date != date);
        }
    }

    /// Drops all entries.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of cached entries (fresh or not).
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Invalidation Listener
// =============================================================================

/// Spawns a task that drops cache entries as change events arrive.
///
/// The task ends when the sender side is dropped.
pub fn spawn_invalidation_listener(
    cache: std::sync::Arc<SearchCache>,
    mut events: broadcast::Receiver<ChangeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(venue_id = %event.venue_id, date = %event.date, "Invalidating cached searches");
                    cache.invalidate(&event.venue_id, event.date);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Change event stream lagged, clearing cache");
                    cache.clear();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_cache_hit_and_ttl_expiry() {
        let cache = SearchCache::new(Duration::from_millis(0));
        cache.insert("v-1", date(), t(18), t(21), 4, vec![]);
        // zero TTL: immediately stale
        assert!(cache.get("v-1", date(), t(18), t(21), 4).is_none());

        let cache = SearchCache::new(Duration::from_secs(60));
        cache.insert("v-1", date(), t(18), t(21), 4, vec![]);
        assert!(cache.get("v-1", date(), t(18), t(21), 4).is_some());
        // different party size is a different request
        assert!(cache.get("v-1", date(), t(18), t(21), 2).is_none());
    }

    #[test]
    fn test_invalidate_targets_one_venue_date() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.insert("v-1", date(), t(18), t(21), 4, vec![]);
        cache.insert("v-2", date(), t(18), t(21), 4, vec![]);

        cache.invalidate("v-1", date());
        assert!(cache.get("v-1", date(), t(18), t(21), 4).is_none());
        assert!(cache.get("v-2", date(), t(18), t(21), 4).is_some());
    }

    #[tokio::test]
    async fn test_listener_invalidates_on_event() {
        let cache = Arc::new(SearchCache::new(Duration::from_secs(60)));
        cache.insert("v-1", date(), t(18), t(21), 4, vec![]);

        let (tx, rx) = broadcast::channel(16);
        let handle = spawn_invalidation_listener(cache.clone(), rx);

        tx.send(ChangeEvent {
            venue_id: "v-1".to_string(),
            date: date(),
        })
        .unwrap();

        drop(tx);
        handle.await.unwrap();
        assert!(cache.get("v-1", date(), t(18), t(21), 4).is_none());
    }
}
