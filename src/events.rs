//! Order change events.
//!
//! Every successful write to an order publishes an event after its
//! transaction commits. Consumers (report caches, notification hooks)
//! react to these instead of polling for changes.

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Events emitted by the order service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    OrderCreated(Uuid),
    OrderUpdated(Uuid),
    OrderDeleted(Uuid),
}

/// Clonable handle for publishing events onto the shared channel.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "order created");
            }
            Event::OrderUpdated(order_id) => {
                info!(order_id = %order_id, "order updated");
            }
            Event::OrderDeleted(order_id) => {
                info!(order_id = %order_id, "order deleted");
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::OrderCreated(id)).await.unwrap();
        sender.send(Event::OrderDeleted(id)).await.unwrap();

        assert_eq!(rx.recv().await, Some(Event::OrderCreated(id)));
        assert_eq!(rx.recv().await, Some(Event::OrderDeleted(id)));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let sender = EventSender::new(tx);
        let result = sender.send(Event::OrderUpdated(Uuid::new_v4())).await;

        assert!(result.is_err());
    }
}
