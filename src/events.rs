use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Broadcast after an order-creation transaction commits. Consumers are
/// best-effort: a missing or lagging listener never fails the request that
/// produced the event.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreated {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub total_price: i64,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OrderCreated>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderCreated> {
        self.tx.subscribe()
    }

    /// Fire-and-forget publish. A send error only means nobody is
    /// subscribed right now.
    pub fn publish(&self, event: OrderCreated) {
        let order_id = event.order_id;
        if self.tx.send(event).is_err() {
            tracing::debug!(%order_id, "order-created event dropped, no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Default downstream listener: logs each created order. Stands in for
/// receipt mail / inventory hooks that would subscribe the same way.
pub fn spawn_logging_subscriber(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    tracing::info!(
                        order_id = %event.order_id,
                        customer_id = %event.customer_id,
                        total_price = event.total_price,
                        "order created"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "order-created listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new(4);
        bus.publish(OrderCreated {
            order_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            total_price: 100,
        });
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let order_id = Uuid::new_v4();
        bus.publish(OrderCreated {
            order_id,
            customer_id: Uuid::new_v4(),
            total_price: 2500,
        });
        let event = rx.recv().await.expect("event");
        assert_eq!(event.order_id, order_id);
        assert_eq!(event.total_price, 2500);
    }
}
