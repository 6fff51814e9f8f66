use crate::errors::ServiceError;
use validator::{Validate, ValidationError};

pub mod consume_chemical_command;
pub mod correct_stock_command;
pub mod register_chemical_command;

pub use consume_chemical_command::ConsumeChemicalCommand;
pub use correct_stock_command::CorrectStockCommand;
pub use register_chemical_command::{NewChemical, RegisterChemicalCommand};

/// A validated request to mutate the inventory ledger.
///
/// Commands carry the operator's input and the pure computation of the
/// resulting stock change. Persistence ordering lives in the ledger service.
pub trait Command: Validate {
    /// Name used in log records.
    const NAME: &'static str;

    /// Runs declarative validation and maps failures onto [`ServiceError::ValidationError`].
    fn check(&self) -> Result<(), ServiceError> {
        self.validate().map_err(ServiceError::from)
    }
}

/// Stock fields of one chemical before and after a mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockChange {
    pub previous_current: f64,
    pub previous_initial: f64,
    pub current: f64,
    pub initial: f64,
}

impl StockChange {
    pub fn delta(&self) -> f64 {
        self.current - self.previous_current
    }
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_positive_quantity(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        let mut err = ValidationError::new("positive_quantity");
        err.message = Some("must be a number greater than 0".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_non_negative_quantity(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        let mut err = ValidationError::new("non_negative_quantity");
        err.message = Some("must be a non-negative number".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("Alice").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn quantities_must_be_finite() {
        assert!(validate_positive_quantity(0.5).is_ok());
        assert!(validate_positive_quantity(0.0).is_err());
        assert!(validate_positive_quantity(f64::NAN).is_err());
        assert!(validate_non_negative_quantity(0.0).is_ok());
        assert!(validate_non_negative_quantity(-1.0).is_err());
        assert!(validate_non_negative_quantity(f64::INFINITY).is_err());
    }
}
