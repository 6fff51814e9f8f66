use sea_orm::error::DbErr;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::models::chemical::Unit;

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Insufficient stock: requested {requested} {unit}, available {available} {unit}")]
    InsufficientStock {
        chemical_id: Uuid,
        available: f64,
        requested: f64,
        unit: Unit,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// The chemical row was written but its opening history entry was not.
    #[error(
        "Chemical {name} ({chemical_id}) was saved but its opening history entry was not: {cause}"
    )]
    OpeningEntryNotSaved {
        chemical_id: Uuid,
        name: String,
        cause: String,
    },
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::PersistenceError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field_errors = err.field_errors();
        let mut fields: Vec<_> = field_errors.keys().copied().collect();
        fields.sort_unstable();

        match fields.first() {
            Some(field) => {
                let message = field_errors
                    .get(field)
                    .and_then(|errors| errors.first())
                    .map(|error| {
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| error.code.to_string())
                    })
                    .unwrap_or_else(|| "invalid value".to_string());
                ServiceError::ValidationError {
                    field: field.to_string(),
                    message,
                }
            }
            None => ServiceError::ValidationError {
                field: "input".to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl ServiceError {
    pub fn chemical_not_found(id: Uuid) -> Self {
        ServiceError::NotFound(format!("Chemical with ID {} not found", id))
    }

    pub fn timeout(operation: &str, after: Duration) -> Self {
        ServiceError::PersistenceError(format!(
            "{} timed out after {} ms",
            operation,
            after.as_millis()
        ))
    }

    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "validation_error",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::NotFound(_) => "not_found",
            Self::PersistenceError(_) => "persistence_error",
            Self::OpeningEntryNotSaved { .. } => "opening_entry_not_saved",
        }
    }

    /// Message shown to the operator in a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationError { field, message } => format!("{}: {}", field, message),
            Self::InsufficientStock {
                available, unit, ..
            } => format!(
                "Amount used exceeds the available stock ({} {}).",
                available, unit
            ),
            Self::NotFound(msg) => msg.clone(),
            Self::PersistenceError(_) => {
                "The change could not be saved. Please try again.".to_string()
            }
            Self::OpeningEntryNotSaved {
                chemical_id, name, ..
            } => format!(
                "Chemical {} was saved (ID {}) but its opening history entry was not. \
                 Do not register it again.",
                name, chemical_id
            ),
        }
    }

    /// True for every failure that came from the record store.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::PersistenceError(_) | Self::OpeningEntryNotSaved { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn db_errors_map_to_persistence() {
        let err: ServiceError = DbErr::Custom("connection reset".into()).into();
        assert_eq!(err.kind(), "persistence_error");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn missing_record_maps_to_not_found() {
        let err: ServiceError = DbErr::RecordNotFound("chemicals".into()).into();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn validation_errors_name_first_field() {
        let mut errors = ValidationErrors::new();
        let mut user = ValidationError::new("blank");
        user.message = Some("user must not be blank".into());
        errors.add("user", user);
        errors.add("name", ValidationError::new("blank"));

        let err: ServiceError = errors.into();
        assert_eq!(
            err,
            ServiceError::ValidationError {
                field: "name".into(),
                message: "blank".into(),
            }
        );
    }

    #[test]
    fn insufficient_stock_reports_available_quantity() {
        let err = ServiceError::InsufficientStock {
            chemical_id: Uuid::new_v4(),
            available: 120.0,
            requested: 150.0,
            unit: Unit::Milliliter,
        };
        assert_eq!(
            err.user_message(),
            "Amount used exceeds the available stock (120 mL)."
        );
        assert!(err.to_string().contains("available 120 mL"));
    }

    #[test]
    fn timeout_is_a_persistence_failure() {
        let err = ServiceError::timeout("insert_chemical", Duration::from_millis(250));
        assert!(err.is_persistence());
        assert!(err.to_string().contains("250 ms"));
    }

    #[test]
    fn validation_message_names_the_field() {
        let err = ServiceError::ValidationError {
            field: "location".into(),
            message: "must not be blank".into(),
        };
        assert_eq!(err.user_message(), "location: must not be blank");
    }

    #[test]
    fn missing_opening_entry_does_not_ask_for_a_retry() {
        let chemical_id = Uuid::new_v4();
        let err = ServiceError::OpeningEntryNotSaved {
            chemical_id,
            name: "Metanol".into(),
            cause: "connection reset".into(),
        };

        assert!(err.is_persistence());
        assert_eq!(err.kind(), "opening_entry_not_saved");
        assert!(err.to_string().contains("connection reset"));
        let message = err.user_message();
        assert!(message.contains(&chemical_id.to_string()));
        assert!(message.contains("Do not register it again"));
        assert!(!message.contains("try again"));
    }
}
