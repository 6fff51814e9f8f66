use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ServiceError;
use crate::models::chemical::{Chemical, Unit};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chemicals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub formula: String,
    pub initial_stock: f64,
    pub current_stock: f64,
    pub unit: String, // Stored as the unit symbol, converted to/from `Unit`
    pub location: String,
    pub cas_number: String,
    pub expiration_date: Option<Date>,
}

// Audit rows carry snapshots instead of foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn parse_unit(raw: &str) -> Result<Unit, ServiceError> {
    Unit::from_str(raw).map_err(|_| {
        ServiceError::PersistenceError(format!("Unrecognised unit '{}' in store", raw))
    })
}

impl TryFrom<Model> for Chemical {
    type Error = ServiceError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Chemical {
            id: model.id,
            unit: parse_unit(&model.unit)?,
            name: model.name,
            formula: model.formula,
            initial_stock: model.initial_stock,
            current_stock: model.current_stock,
            location: model.location,
            cas_number: model.cas_number,
            expiration_date: model.expiration_date,
        })
    }
}

impl From<&Chemical> for ActiveModel {
    fn from(chemical: &Chemical) -> Self {
        ActiveModel {
            id: Set(chemical.id),
            name: Set(chemical.name.clone()),
            formula: Set(chemical.formula.clone()),
            initial_stock: Set(chemical.initial_stock),
            current_stock: Set(chemical.current_stock),
            unit: Set(chemical.unit.to_string()),
            location: Set(chemical.location.clone()),
            cas_number: Set(chemical.cas_number.clone()),
            expiration_date: Set(chemical.expiration_date),
        }
    }
}
