#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chem_inventory::commands::NewChemical;
use chem_inventory::db::{self, DbConfig, DbPool};
use chem_inventory::models::{Chemical, Unit};
use chem_inventory::repositories::{InMemoryRepository, InventoryRepository, SeaOrmRepository};
use chem_inventory::services::{InventoryLedger, LedgerSettings};
use uuid::Uuid;

/// Settings with a short remote deadline so timeout tests stay fast.
pub fn test_settings() -> LedgerSettings {
    LedgerSettings {
        remote_timeout: Duration::from_millis(200),
        ..LedgerSettings::default()
    }
}

pub fn new_chemical(name: &str, initial_stock: f64, unit: Unit) -> NewChemical {
    NewChemical {
        name: name.to_string(),
        formula: "HCl".to_string(),
        initial_stock,
        unit,
        location: "Rak A1".to_string(),
        cas_number: "7647-01-0".to_string(),
        expiration_date: None,
    }
}

pub fn stocked(name: &str, initial_stock: f64, current_stock: f64, unit: Unit) -> Chemical {
    Chemical {
        id: Uuid::new_v4(),
        name: name.to_string(),
        formula: String::new(),
        initial_stock,
        current_stock,
        unit,
        location: "Rak B1".to_string(),
        cas_number: String::new(),
        expiration_date: None,
    }
}

/// A ledger loaded from an in-memory store, returned with the store for inspection.
pub async fn in_memory_ledger(
    chemicals: Vec<Chemical>,
) -> (InventoryLedger, Arc<InMemoryRepository>) {
    let repository = Arc::new(InMemoryRepository::with_chemicals(chemicals));
    let ledger = InventoryLedger::load(
        repository.clone() as Arc<dyn InventoryRepository>,
        test_settings(),
    )
    .await
    .expect("in-memory ledger loads");
    (ledger, repository)
}

/// Fresh in-memory SQLite database with the inventory tables created.
pub async fn sqlite_pool() -> DbPool {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..DbConfig::default()
    };
    let pool = db::establish_connection_with_config(&config)
        .await
        .expect("sqlite connects");
    db::ensure_schema(&pool).await.expect("schema created");
    pool
}

pub async fn sqlite_repository() -> (Arc<SeaOrmRepository>, Arc<DbPool>) {
    let pool = Arc::new(sqlite_pool().await);
    (Arc::new(SeaOrmRepository::new(pool.clone())), pool)
}
