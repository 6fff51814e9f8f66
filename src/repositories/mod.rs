use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Chemical, StockCorrectionEvent, UsageEvent};

pub mod in_memory_repository;
pub mod sea_orm_repository;

pub use in_memory_repository::{InMemoryRepository, RepositoryOperation};
pub use sea_orm_repository::SeaOrmRepository;

/// Record store behind the inventory ledger.
///
/// Three collections (chemicals, usage logs, stock history) with whole-record
/// select-all, insert-one and update-by-id. Implementations offer no
/// multi-statement transactions; the ledger orders its writes accordingly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// All chemicals, ordered by name.
    async fn fetch_chemicals(&self) -> Result<Vec<Chemical>, ServiceError>;

    async fn insert_chemical(&self, chemical: &Chemical) -> Result<Chemical, ServiceError>;

    /// Writes both stock fields of one chemical and returns the stored record.
    async fn update_chemical_stock(
        &self,
        id: Uuid,
        current_stock: f64,
        initial_stock: f64,
    ) -> Result<Chemical, ServiceError>;

    async fn fetch_usage_logs(&self) -> Result<Vec<UsageEvent>, ServiceError>;

    async fn insert_usage_log(&self, event: &UsageEvent) -> Result<UsageEvent, ServiceError>;

    async fn fetch_stock_history(&self) -> Result<Vec<StockCorrectionEvent>, ServiceError>;

    async fn insert_stock_history(
        &self,
        event: &StockCorrectionEvent,
    ) -> Result<StockCorrectionEvent, ServiceError>;
}

/// Repository trait for database-backed stores
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
