use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{validate_non_negative_quantity, validate_not_blank, Command, StockChange};
use crate::models::chemical::Chemical;

/// Sets an absolute stock level after a recount, refill or spillage.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CorrectStockCommand {
    pub chemical_id: Uuid,
    #[validate(custom = "validate_non_negative_quantity")]
    pub new_stock: f64,
    #[validate(custom = "validate_not_blank")]
    pub user: String,
}

impl Command for CorrectStockCommand {
    const NAME: &'static str = "correct_stock";
}

impl CorrectStockCommand {
    pub fn new(chemical_id: Uuid, new_stock: f64, user: impl Into<String>) -> Self {
        Self {
            chemical_id,
            new_stock,
            user: user.into(),
        }
    }

    /// Raises the high-water mark when the new level exceeds it; never lowers it.
    pub fn plan(&self, chemical: &Chemical) -> StockChange {
        StockChange {
            previous_current: chemical.current_stock,
            previous_initial: chemical.initial_stock,
            current: self.new_stock,
            initial: chemical.initial_stock.max(self.new_stock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use crate::models::chemical::Unit;
    use assert_matches::assert_matches;

    fn permanganate() -> Chemical {
        Chemical {
            id: Uuid::new_v4(),
            name: "Kalium Permanganat".into(),
            formula: "KMnO₄".into(),
            initial_stock: 500.0,
            current_stock: 45.0,
            unit: Unit::Gram,
            location: "Rak D1".into(),
            cas_number: "7722-64-7".into(),
            expiration_date: None,
        }
    }

    #[test]
    fn refill_above_baseline_raises_initial_stock() {
        let chemical = permanganate();
        let change = CorrectStockCommand::new(chemical.id, 600.0, "Carol").plan(&chemical);
        assert_eq!(change.current, 600.0);
        assert_eq!(change.initial, 600.0);
        assert_eq!(change.delta(), 555.0);
    }

    #[test]
    fn lowering_stock_keeps_baseline() {
        let chemical = permanganate();
        let change = CorrectStockCommand::new(chemical.id, 20.0, "Carol").plan(&chemical);
        assert_eq!(change.current, 20.0);
        assert_eq!(change.initial, 500.0);
        assert_eq!(change.delta(), -25.0);
    }

    #[test]
    fn negative_stock_is_invalid() {
        assert_matches!(
            CorrectStockCommand::new(Uuid::new_v4(), -1.0, "Carol").check(),
            Err(ServiceError::ValidationError { field, .. }) if field == "new_stock"
        );
        assert!(CorrectStockCommand::new(Uuid::new_v4(), 0.0, "Carol")
            .check()
            .is_ok());
    }
}
