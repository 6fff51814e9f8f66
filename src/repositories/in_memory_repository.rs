use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use super::InventoryRepository;
use crate::errors::ServiceError;
use crate::models::{Chemical, StockCorrectionEvent, UsageEvent};

/// Calls a test can make fail or count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    FetchChemicals,
    InsertChemical,
    UpdateChemicalStock,
    FetchUsageLogs,
    InsertUsageLog,
    FetchStockHistory,
    InsertStockHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureMode {
    Once,
    Always,
}

#[derive(Debug, Default)]
struct Tables {
    chemicals: Vec<Chemical>,
    usage_logs: Vec<UsageEvent>,
    stock_history: Vec<StockCorrectionEvent>,
}

#[derive(Debug, Default)]
struct Faults {
    failures: HashMap<RepositoryOperation, FailureMode>,
    calls: HashMap<RepositoryOperation, usize>,
    latency: Option<Duration>,
}

/// In-process record store with failure injection and artificial latency.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    faults: Mutex<Faults>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chemicals(chemicals: Vec<Chemical>) -> Self {
        let repository = Self::default();
        lock(&repository.tables).chemicals = chemicals;
        repository
    }

    /// The next call of `operation` fails with a persistence error.
    pub fn fail_next(&self, operation: RepositoryOperation) {
        lock(&self.faults)
            .failures
            .insert(operation, FailureMode::Once);
    }

    /// Every call of `operation` fails until [`InMemoryRepository::heal`].
    pub fn fail_always(&self, operation: RepositoryOperation) {
        lock(&self.faults)
            .failures
            .insert(operation, FailureMode::Always);
    }

    pub fn heal(&self) {
        lock(&self.faults).failures.clear();
    }

    /// Delays every call, for exercising remote-call timeouts.
    pub fn set_latency(&self, latency: Option<Duration>) {
        lock(&self.faults).latency = latency;
    }

    pub fn call_count(&self, operation: RepositoryOperation) -> usize {
        lock(&self.faults)
            .calls
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn stored_chemical(&self, id: Uuid) -> Option<Chemical> {
        lock(&self.tables)
            .chemicals
            .iter()
            .find(|chemical| chemical.id == id)
            .cloned()
    }

    pub fn stored_usage_logs(&self) -> Vec<UsageEvent> {
        lock(&self.tables).usage_logs.clone()
    }

    pub fn stored_stock_history(&self) -> Vec<StockCorrectionEvent> {
        lock(&self.tables).stock_history.clone()
    }

    async fn enter(&self, operation: RepositoryOperation) -> Result<(), ServiceError> {
        let (latency, failure) = {
            let mut faults = lock(&self.faults);
            *faults.calls.entry(operation).or_insert(0) += 1;
            let failure = match faults.failures.get(&operation).copied() {
                Some(FailureMode::Once) => {
                    faults.failures.remove(&operation);
                    true
                }
                Some(FailureMode::Always) => true,
                None => false,
            };
            (faults.latency, failure)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if failure {
            return Err(ServiceError::PersistenceError(format!(
                "injected failure in {:?}",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryRepository for InMemoryRepository {
    async fn fetch_chemicals(&self) -> Result<Vec<Chemical>, ServiceError> {
        self.enter(RepositoryOperation::FetchChemicals).await?;
        let mut chemicals = lock(&self.tables).chemicals.clone();
        chemicals.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(chemicals)
    }

    async fn insert_chemical(&self, chemical: &Chemical) -> Result<Chemical, ServiceError> {
        self.enter(RepositoryOperation::InsertChemical).await?;
        let mut tables = lock(&self.tables);
        if tables.chemicals.iter().any(|c| c.id == chemical.id) {
            return Err(ServiceError::PersistenceError(format!(
                "duplicate chemical id {}",
                chemical.id
            )));
        }
        tables.chemicals.push(chemical.clone());
        Ok(chemical.clone())
    }

    async fn update_chemical_stock(
        &self,
        id: Uuid,
        current_stock: f64,
        initial_stock: f64,
    ) -> Result<Chemical, ServiceError> {
        self.enter(RepositoryOperation::UpdateChemicalStock).await?;
        let mut tables = lock(&self.tables);
        let chemical = tables
            .chemicals
            .iter_mut()
            .find(|chemical| chemical.id == id)
            .ok_or_else(|| ServiceError::chemical_not_found(id))?;
        chemical.current_stock = current_stock;
        chemical.initial_stock = initial_stock;
        Ok(chemical.clone())
    }

    async fn fetch_usage_logs(&self) -> Result<Vec<UsageEvent>, ServiceError> {
        self.enter(RepositoryOperation::FetchUsageLogs).await?;
        Ok(lock(&self.tables).usage_logs.clone())
    }

    async fn insert_usage_log(&self, event: &UsageEvent) -> Result<UsageEvent, ServiceError> {
        self.enter(RepositoryOperation::InsertUsageLog).await?;
        lock(&self.tables).usage_logs.push(event.clone());
        Ok(event.clone())
    }

    async fn fetch_stock_history(&self) -> Result<Vec<StockCorrectionEvent>, ServiceError> {
        self.enter(RepositoryOperation::FetchStockHistory).await?;
        Ok(lock(&self.tables).stock_history.clone())
    }

    async fn insert_stock_history(
        &self,
        event: &StockCorrectionEvent,
    ) -> Result<StockCorrectionEvent, ServiceError> {
        self.enter(RepositoryOperation::InsertStockHistory).await?;
        lock(&self.tables).stock_history.push(event.clone());
        Ok(event.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;

    fn acetone() -> Chemical {
        Chemical {
            id: Uuid::new_v4(),
            name: "Aseton".into(),
            formula: "C₃H₆O".into(),
            initial_stock: 5000.0,
            current_stock: 4800.0,
            unit: Unit::Milliliter,
            location: "Rak C4".into(),
            cas_number: "67-64-1".into(),
            expiration_date: None,
        }
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let repository = InMemoryRepository::new();
        repository.fail_next(RepositoryOperation::InsertChemical);

        let chemical = acetone();
        assert!(repository.insert_chemical(&chemical).await.is_err());
        assert!(repository.insert_chemical(&chemical).await.is_ok());
        assert_eq!(repository.call_count(RepositoryOperation::InsertChemical), 2);
        assert!(repository.stored_chemical(chemical.id).is_some());
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let repository = InMemoryRepository::new();
        let err = repository
            .update_chemical_stock(Uuid::new_v4(), 1.0, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_writes_both_stock_fields() {
        let chemical = acetone();
        let repository = InMemoryRepository::with_chemicals(vec![chemical.clone()]);
        let updated = repository
            .update_chemical_stock(chemical.id, 6000.0, 6000.0)
            .await
            .unwrap();
        assert_eq!(updated.current_stock, 6000.0);
        assert_eq!(
            repository.stored_chemical(chemical.id).unwrap().initial_stock,
            6000.0
        );
    }
}
