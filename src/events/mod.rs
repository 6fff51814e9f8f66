use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Unit;

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
}

/// Creates a bounded event channel and its sender handle.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender::new(tx), rx)
}

// Domain events published after a ledger mutation has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ChemicalRegistered {
        chemical_id: Uuid,
        name: String,
        initial_stock: f64,
        unit: Unit,
    },
    StockConsumed {
        chemical_id: Uuid,
        usage_id: Uuid,
        amount: f64,
        remaining: f64,
        user: String,
    },
    StockCorrected {
        chemical_id: Uuid,
        correction_id: Uuid,
        previous_stock: f64,
        new_stock: f64,
        user: String,
    },
    LowStockDetected {
        chemical_id: Uuid,
        name: String,
        current_stock: f64,
        initial_stock: f64,
        unit: Unit,
    },
}

/// Drains the event channel, logging each event until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ChemicalRegistered {
                chemical_id,
                name,
                initial_stock,
                unit,
            } => {
                info!(%chemical_id, %name, initial_stock, %unit, "Chemical registered");
            }
            Event::StockConsumed {
                chemical_id,
                usage_id,
                amount,
                remaining,
                user,
            } => {
                info!(%chemical_id, %usage_id, amount, remaining, %user, "Stock consumed");
            }
            Event::StockCorrected {
                chemical_id,
                correction_id,
                previous_stock,
                new_stock,
                user,
            } => {
                info!(
                    %chemical_id,
                    %correction_id,
                    previous_stock,
                    new_stock,
                    %user,
                    "Stock corrected"
                );
            }
            Event::LowStockDetected {
                chemical_id,
                name,
                current_stock,
                initial_stock,
                unit,
            } => {
                warn!(
                    %chemical_id,
                    %name,
                    current_stock,
                    initial_stock,
                    %unit,
                    "Chemical is below the low-stock threshold"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_to_receiver() {
        let (sender, mut rx) = channel(4);
        let chemical_id = Uuid::new_v4();

        sender
            .send(Event::ChemicalRegistered {
                chemical_id,
                name: "Iodium".into(),
                initial_stock: 250.0,
                unit: Unit::Gram,
            })
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(Event::ChemicalRegistered { chemical_id: id, .. }) if id == chemical_id
        ));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (sender, rx) = channel(1);
        drop(rx);
        let result = sender
            .send(Event::StockCorrected {
                chemical_id: Uuid::new_v4(),
                correction_id: Uuid::new_v4(),
                previous_stock: 1.0,
                new_stock: 2.0,
                user: "Alice".into(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn processing_loop_ends_when_senders_drop() {
        let (sender, rx) = channel(2);
        let handle = tokio::spawn(process_events(rx));
        sender
            .send(Event::LowStockDetected {
                chemical_id: Uuid::new_v4(),
                name: "Asam Sulfat".into(),
                current_stock: 120.0,
                initial_stock: 3000.0,
                unit: Unit::Milliliter,
            })
            .await
            .unwrap();
        drop(sender);
        handle.await.unwrap();
    }
}
