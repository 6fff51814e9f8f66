use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display};

use crate::errors::ServiceError;
use crate::models::{Chemical, StockCorrectionEvent, UsageEvent};

/// Outcome class of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient message shown to the operator after a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn usage_logged(event: &UsageEvent) -> Self {
        Self::success(format!(
            "Usage of {} {} {} logged successfully!",
            event.amount_used, event.chemical.unit, event.chemical.chemical_name
        ))
    }

    pub fn chemical_registered(chemical: &Chemical) -> Self {
        Self::success(format!("Chemical {} added successfully!", chemical.name))
    }

    pub fn stock_corrected(event: &StockCorrectionEvent) -> Self {
        Self::success(format!(
            "Stock of {} updated successfully!",
            event.chemical.chemical_name
        ))
    }

    pub fn failure(error: &ServiceError) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: error.user_message(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NotificationLevel::Success
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NotificationLevel::Success => write!(f, "✔ {}", self.message),
            NotificationLevel::Error => write!(f, "✖ {}", self.message),
        }
    }
}
