use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{validate_not_blank, validate_positive_quantity, Command, StockChange};
use crate::errors::ServiceError;
use crate::models::chemical::Chemical;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConsumeChemicalCommand {
    pub chemical_id: Uuid,
    #[validate(custom = "validate_positive_quantity")]
    pub amount: f64,
    #[validate(custom = "validate_not_blank")]
    pub user: String,
}

impl Command for ConsumeChemicalCommand {
    const NAME: &'static str = "consume_chemical";
}

impl ConsumeChemicalCommand {
    pub fn new(chemical_id: Uuid, amount: f64, user: impl Into<String>) -> Self {
        Self {
            chemical_id,
            amount,
            user: user.into(),
        }
    }

    /// Computes the stock after consumption; over-consumption is rejected, never truncated.
    pub fn plan(&self, chemical: &Chemical) -> Result<StockChange, ServiceError> {
        if self.amount > chemical.current_stock {
            return Err(ServiceError::InsufficientStock {
                chemical_id: chemical.id,
                available: chemical.current_stock,
                requested: self.amount,
                unit: chemical.unit,
            });
        }

        Ok(StockChange {
            previous_current: chemical.current_stock,
            previous_initial: chemical.initial_stock,
            // Clamp only guards the invariant against floating-point drift.
            current: (chemical.current_stock - self.amount).max(0.0),
            initial: chemical.initial_stock,
        })
    }
}
