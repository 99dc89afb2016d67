//! # Change Event Feed
//!
//! Broadcasts reservation-state changes to interested listeners.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Change Event Feed                                 │
//! │                                                                         │
//! │  ReservationRepository write                                           │
//! │  (insert / confirm / cancel / sweep)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ChangeFeed::publish(ChangeEvent { venue_id, date })                   │
//! │       │                                                                 │
//! │       ├──► engine search cache (invalidation listener)                 │
//! │       └──► any other subscriber (websocket push, metrics, ...)         │
//! │                                                                         │
//! │  Publishing never fails: with no subscribers the event is dropped.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use tokio::sync::broadcast;
use tracing::debug;

use seatwise_engine::ChangeEvent;

/// Default buffer size for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Fan-out handle for reservation change events.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        ChangeFeed { tx }
    }

    /// Opens a new subscription. Each subscriber sees every event published
    /// after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Publishes a change for a (venue, date). Silently dropped when nobody
    /// is listening.
    pub fn publish(&self, venue_id: &str, date: NaiveDate) {
        let event = ChangeEvent {
            venue_id: venue_id.to_string(),
            date,
        };
        debug!(venue_id, %date, "Publishing change event");
        let _ = self.tx.send(event);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();

        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        feed.publish("v-1", date);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.venue_id, "v-1");
        assert_eq!(event.date, date);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let feed = ChangeFeed::default();
        assert_eq!(feed.subscriber_count(), 0);
        feed.publish("v-1", NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
    }
}
