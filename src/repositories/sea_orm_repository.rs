use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{BaseRepository, InventoryRepository, Repository};
use crate::entities::{
    chemical::{self, Entity as ChemicalEntity},
    stock_history::{self, Entity as StockHistoryEntity},
    usage_log::{self, Entity as UsageLogEntity},
};
use crate::errors::ServiceError;
use crate::models::{Chemical, StockCorrectionEvent, UsageEvent};

/// Inventory store backed by any sea-orm connection (SQLite by default).
#[derive(Debug, Clone)]
pub struct SeaOrmRepository {
    base: BaseRepository,
}

impl SeaOrmRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl InventoryRepository for SeaOrmRepository {
    #[instrument(skip(self))]
    async fn fetch_chemicals(&self) -> Result<Vec<Chemical>, ServiceError> {
        let rows = ChemicalEntity::find()
            .order_by_asc(chemical::Column::Name)
            .all(self.base.get_db())
            .await?;

        debug!(count = rows.len(), "Fetched chemicals");
        rows.into_iter().map(Chemical::try_from).collect()
    }

    #[instrument(skip(self, chemical), fields(chemical_id = %chemical.id))]
    async fn insert_chemical(&self, chemical: &Chemical) -> Result<Chemical, ServiceError> {
        let model = chemical::ActiveModel::from(chemical)
            .insert(self.base.get_db())
            .await?;
        Chemical::try_from(model)
    }

    #[instrument(skip(self))]
    async fn update_chemical_stock(
        &self,
        id: Uuid,
        current_stock: f64,
        initial_stock: f64,
    ) -> Result<Chemical, ServiceError> {
        let db = self.base.get_db();
        let existing = ChemicalEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::chemical_not_found(id))?;

        let mut active: chemical::ActiveModel = existing.into();
        active.current_stock = Set(current_stock);
        active.initial_stock = Set(initial_stock);

        let updated = active.update(db).await?;
        Chemical::try_from(updated)
    }

    #[instrument(skip(self))]
    async fn fetch_usage_logs(&self) -> Result<Vec<UsageEvent>, ServiceError> {
        UsageLogEntity::find()
            .order_by_desc(usage_log::Column::CreatedAt)
            .all(self.base.get_db())
            .await?
            .into_iter()
            .map(UsageEvent::try_from)
            .collect()
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn insert_usage_log(&self, event: &UsageEvent) -> Result<UsageEvent, ServiceError> {
        let model = usage_log::ActiveModel::from(event)
            .insert(self.base.get_db())
            .await?;
        UsageEvent::try_from(model)
    }

    #[instrument(skip(self))]
    async fn fetch_stock_history(&self) -> Result<Vec<StockCorrectionEvent>, ServiceError> {
        StockHistoryEntity::find()
            .order_by_desc(stock_history::Column::CreatedAt)
            .all(self.base.get_db())
            .await?
            .into_iter()
            .map(StockCorrectionEvent::try_from)
            .collect()
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn insert_stock_history(
        &self,
        event: &StockCorrectionEvent,
    ) -> Result<StockCorrectionEvent, ServiceError> {
        let model = stock_history::ActiveModel::from(event)
            .insert(self.base.get_db())
            .await?;
        StockCorrectionEvent::try_from(model)
    }
}
