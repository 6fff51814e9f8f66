use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{validate_not_blank, validate_positive_quantity, Command};
use crate::errors::ServiceError;
use crate::models::chemical::{Chemical, Unit};

/// Attributes supplied when a chemical is first registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewChemical {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[serde(default)]
    pub formula: String,
    #[validate(custom = "validate_positive_quantity")]
    pub initial_stock: f64,
    pub unit: Unit,
    /// Either one of the known locations or a freshly typed one.
    #[validate(custom = "validate_not_blank")]
    pub location: String,
    #[serde(default)]
    pub cas_number: String,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterChemicalCommand {
    pub chemical: NewChemical,
    #[validate(custom = "validate_not_blank")]
    pub registered_by: String,
}

impl Command for RegisterChemicalCommand {
    const NAME: &'static str = "register_chemical";

    fn check(&self) -> Result<(), ServiceError> {
        self.chemical.validate()?;
        self.validate()?;
        Ok(())
    }
}

impl RegisterChemicalCommand {
    pub fn new(chemical: NewChemical, registered_by: impl Into<String>) -> Self {
        Self {
            chemical,
            registered_by: registered_by.into(),
        }
    }

    /// Builds the stored record; current stock starts at the initial stock.
    pub fn to_chemical(&self, id: Uuid) -> Chemical {
        let new = &self.chemical;
        Chemical {
            id,
            name: new.name.trim().to_string(),
            formula: new.formula.trim().to_string(),
            initial_stock: new.initial_stock,
            current_stock: new.initial_stock,
            unit: new.unit,
            location: new.location.trim().to_string(),
            cas_number: new.cas_number.trim().to_string(),
            expiration_date: new.expiration_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_chemical() -> NewChemical {
        NewChemical {
            name: "Test".into(),
            formula: "H2O".into(),
            initial_stock: 100.0,
            unit: Unit::Milliliter,
            location: " Test Location ".into(),
            cas_number: "7732-18-5".into(),
            expiration_date: None,
        }
    }

    #[test]
    fn builds_record_with_full_stock() {
        let command = RegisterChemicalCommand::new(new_chemical(), "Alice");
        command.check().unwrap();

        let id = Uuid::new_v4();
        let chemical = command.to_chemical(id);
        assert_eq!(chemical.id, id);
        assert_eq!(chemical.current_stock, 100.0);
        assert_eq!(chemical.initial_stock, 100.0);
        assert_eq!(chemical.location, "Test Location");
    }

    #[test]
    fn rejects_non_positive_initial_stock() {
        let mut chemical = new_chemical();
        chemical.initial_stock = 0.0;
        let err = RegisterChemicalCommand::new(chemical, "Alice")
            .check()
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::ValidationError { ref field, .. } if field == "initial_stock"
        ));
    }

    #[test]
    fn rejects_blank_location_and_user() {
        let mut chemical = new_chemical();
        chemical.location = "  ".into();
        let err = RegisterChemicalCommand::new(chemical, "Alice")
            .check()
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::ValidationError { ref field, .. } if field == "location"
        ));

        let err = RegisterChemicalCommand::new(new_chemical(), "")
            .check()
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::ValidationError { ref field, .. } if field == "registered_by"
        ));
    }
}
