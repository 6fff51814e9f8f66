mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chem_inventory::entities::chemical;
use chem_inventory::models::{HistoryFilter, Unit};
use chem_inventory::repositories::InventoryRepository;
use chem_inventory::{InventoryLedger, ServiceError};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use common::{new_chemical, sqlite_repository, stocked, test_settings};

#[tokio::test]
async fn chemicals_round_trip_through_sqlite() {
    let (repository, _pool) = sqlite_repository().await;
    let mut acid = stocked("Asam Klorida", 5000.0, 4500.0, Unit::Milliliter);
    acid.expiration_date = NaiveDate::from_ymd_opt(2025, 12, 31);
    let base = stocked("Natrium Hidroksida", 2000.0, 1850.0, Unit::Gram);

    repository.insert_chemical(&base).await.unwrap();
    let stored = repository.insert_chemical(&acid).await.unwrap();
    assert_eq!(stored, acid);

    let all = repository.fetch_chemicals().await.unwrap();
    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Asam Klorida", "Natrium Hidroksida"]);
    assert_eq!(all[0].expiration_date, acid.expiration_date);
}

#[tokio::test]
async fn stock_update_writes_both_fields() {
    let (repository, _pool) = sqlite_repository().await;
    let iodine = stocked("Iodium", 250.0, 250.0, Unit::Gram);
    repository.insert_chemical(&iodine).await.unwrap();

    let updated = repository
        .update_chemical_stock(iodine.id, 300.0, 300.0)
        .await
        .unwrap();

    assert_eq!(updated.current_stock, 300.0);
    assert_eq!(updated.initial_stock, 300.0);
    assert_eq!(updated.name, "Iodium");
}

#[tokio::test]
async fn updating_a_missing_chemical_is_not_found() {
    let (repository, _pool) = sqlite_repository().await;
    assert_matches!(
        repository.update_chemical_stock(Uuid::new_v4(), 1.0, 1.0).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn unknown_unit_in_store_is_a_persistence_error() {
    let (repository, pool) = sqlite_repository().await;
    chemical::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Raksa".into()),
        formula: Set("Hg".into()),
        initial_stock: Set(10.0),
        current_stock: Set(10.0),
        unit: Set("oz".into()),
        location: Set("Rak E1".into()),
        cas_number: Set("7439-97-6".into()),
        expiration_date: Set(None),
    }
    .insert(pool.as_ref())
    .await
    .unwrap();

    assert_matches!(
        repository.fetch_chemicals().await,
        Err(ServiceError::PersistenceError(msg)) if msg.contains("oz")
    );
}

#[tokio::test]
async fn duplicate_ids_are_rejected_by_the_store() {
    let (repository, _pool) = sqlite_repository().await;
    let acetone = stocked("Aseton", 5000.0, 4800.0, Unit::Milliliter);
    repository.insert_chemical(&acetone).await.unwrap();

    assert_matches!(
        repository.insert_chemical(&acetone).await,
        Err(ServiceError::PersistenceError(_))
    );
}

#[tokio::test]
async fn reloaded_ledger_sees_persisted_state_and_history() {
    let (repository, _pool) = sqlite_repository().await;

    let (chemical_id, usage_id) = {
        let mut ledger = InventoryLedger::load(repository.clone(), test_settings())
            .await
            .unwrap();
        let chemical = ledger
            .register(new_chemical("Etanol", 10_000.0, Unit::Milliliter), "Alice")
            .await
            .unwrap();
        let usage = ledger.consume(chemical.id, 500.0, "Bob").await.unwrap();
        ledger
            .correct_stock(chemical.id, 12_000.0, "Carol")
            .await
            .unwrap();
        (chemical.id, usage.id)
    };

    let reloaded =
        InventoryLedger::load(repository as Arc<dyn InventoryRepository>, test_settings())
            .await
            .unwrap();

    let record = reloaded.get(chemical_id).unwrap();
    assert_eq!(record.current_stock, 12_000.0);
    assert_eq!(record.initial_stock, 12_000.0);

    let history = reloaded.history(HistoryFilter::All);
    assert_eq!(history.len(), 3);
    let usage = reloaded.history(HistoryFilter::Usage);
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].id(), usage_id);
    assert_eq!(usage[0].chemical().unit, Unit::Milliliter);
}
