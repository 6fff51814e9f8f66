use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::chemical::parse_unit;
use crate::errors::ServiceError;
use crate::models::history::{ChemicalSnapshot, StockCorrectionEvent};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub chemical_id: Uuid,
    pub chemical_name: String,
    pub chemical_formula: String,
    pub unit: String,
    pub amount_added: f64,
    pub previous_stock: f64,
    pub new_stock: f64,
    pub user: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for StockCorrectionEvent {
    type Error = ServiceError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(StockCorrectionEvent {
            id: model.id,
            chemical: ChemicalSnapshot {
                chemical_id: model.chemical_id,
                chemical_name: model.chemical_name,
                chemical_formula: model.chemical_formula,
                unit: parse_unit(&model.unit)?,
            },
            amount_added: model.amount_added,
            previous_stock: model.previous_stock,
            new_stock: model.new_stock,
            user: model.user,
            timestamp: model.created_at,
        })
    }
}

impl From<&StockCorrectionEvent> for ActiveModel {
    fn from(event: &StockCorrectionEvent) -> Self {
        ActiveModel {
            id: Set(event.id),
            chemical_id: Set(event.chemical.chemical_id),
            chemical_name: Set(event.chemical.chemical_name.clone()),
            chemical_formula: Set(event.chemical.chemical_formula.clone()),
            unit: Set(event.chemical.unit.to_string()),
            amount_added: Set(event.amount_added),
            previous_stock: Set(event.previous_stock),
            new_stock: Set(event.new_stock),
            user: Set(event.user.clone()),
            created_at: Set(event.timestamp),
        }
    }
}
