//! # Store Events
//!
//! Every committed mutation publishes a [`StoreEvent`] so derived views
//! (search results, conversation lists, rating badges) can recompute
//! without a reload.
//!
//! ```text
//!   ListingStore ──┐
//!   RentalStore ───┤                       ┌──► search view
//!   MessageStore ──┼──► EventBus ──────────┼──► inbox badge
//!   ReviewStore ───┤    (broadcast)        └──► rentals page
//!   ...          ──┘
//! ```
//!
//! Publishing never blocks and succeeds with zero subscribers. A subscriber
//! that falls behind by more than the channel capacity sees `Lagged` and
//! should re-read the stores.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use rigshare_core::RentalStatus;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A committed change to one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StoreEvent {
    ListingCreated { id: String },
    ListingUpdated { id: String },
    ListingDeleted { id: String },
    CatalogLoaded { count: usize },
    CatalogLoadFailed,
    RentalCreated { id: String },
    RentalStatusChanged { id: String, status: RentalStatus },
    MessageSent { id: String },
    MessagesRead { count: usize },
    ReviewAdded { id: String, equipment_id: String },
    ReviewUpdated { id: String, equipment_id: String },
    ReviewRemoved { id: String, equipment_id: String },
    FavoritesChanged,
    ProfileUpdated { id: String },
}

/// Fan-out channel shared by every store.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        EventBus { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Publishes `event`. Having no subscribers is fine.
    pub fn publish(&self, event: StoreEvent) {
        trace!(?event, "Store event");
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(StoreEvent::FavoritesChanged);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(StoreEvent::ListingCreated { id: "e-1".into() });
        bus.publish(StoreEvent::ListingDeleted { id: "e-1".into() });

        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::ListingCreated { id: "e-1".into() }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::ListingDeleted { id: "e-1".into() }
        );
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(StoreEvent::RentalStatusChanged {
            id: "r-1".into(),
            status: RentalStatus::Approved,
        })
        .unwrap();
        assert_eq!(json["type"], "rentalStatusChanged");
        assert_eq!(json["status"], "approved");
    }
}
