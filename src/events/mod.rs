use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Events emitted by the cart and payment flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartLineAdded {
        user_id: i64,
        product_id: i64,
        quantity: i32,
    },
    CartLineUpdated {
        user_id: i64,
        product_id: i64,
        quantity: i32,
    },
    CartLineRemoved {
        user_id: i64,
        product_id: i64,
    },

    // Payment events
    PaymentInitiated {
        order_id: i64,
        user_id: i64,
        payment_id: String,
        amount: Decimal,
    },
    OrderReconciled {
        order_id: i64,
        payment_id: String,
        status: String,
    },
}

#[derive(Debug, Clone)]
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

    /// Sends an event, logging instead of failing when the channel is closed
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Consumes events from the channel until it closes.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");

    while let Some(event) = receiver.recv().await {
        match &event {
            Event::PaymentInitiated {
                order_id,
                payment_id,
                amount,
                ..
            } => {
                info!(%order_id, %payment_id, %amount, "payment initiated");
            }
            Event::OrderReconciled {
                order_id,
                payment_id,
                status,
            } => {
                info!(%order_id, %payment_id, %status, "order reconciled");
            }
            other => {
                info!(event = ?other, "cart event");
            }
        }
    }

    info!("Event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::CartLineRemoved {
                user_id: 1,
                product_id: 2,
            })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::CartLineRemoved {
                user_id,
                product_id,
            }) => {
                assert_eq!(user_id, 1);
                assert_eq!(product_id, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_survives_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic even though the receiver is gone
        sender
            .send_or_log(Event::CartLineRemoved {
                user_id: 1,
                product_id: 2,
            })
            .await;
    }
}
