use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::history::ChemicalSnapshot;

/// Fraction of the high-water mark below which a chemical counts as low on stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 0.10;

/// Days ahead of expiry during which a chemical is flagged as expiring soon.
pub const DEFAULT_EXPIRING_SOON_DAYS: i64 = 30;

/// Unit of measure a chemical is stocked in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum Unit {
    #[serde(rename = "mL")]
    #[strum(serialize = "mL")]
    Milliliter,
    #[serde(rename = "g")]
    #[strum(serialize = "g")]
    Gram,
    #[serde(rename = "L")]
    #[strum(serialize = "L")]
    Liter,
    #[serde(rename = "kg")]
    #[strum(serialize = "kg")]
    Kilogram,
}

/// A chemical stock record owned by the inventory ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chemical {
    pub id: Uuid,
    pub name: String,
    pub formula: String,
    /// High-water mark used as the 100% reference for stock percentages.
    pub initial_stock: f64,
    pub current_stock: f64,
    pub unit: Unit,
    pub location: String,
    pub cas_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExpirationStatus {
    Expired,
    ExpiringSoon,
    Normal,
    Unknown,
}

/// Display band for the stock gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockLevel {
    High,
    Medium,
    Low,
}

impl Chemical {
    /// Current stock as a fraction of the high-water mark, `None` without a baseline.
    pub fn stock_ratio(&self) -> Option<f64> {
        if self.initial_stock > 0.0 {
            Some(self.current_stock / self.initial_stock)
        } else {
            None
        }
    }

    pub fn stock_percentage(&self) -> f64 {
        self.stock_ratio().map(|ratio| ratio * 100.0).unwrap_or(0.0)
    }

    pub fn stock_level(&self) -> StockLevel {
        let percentage = self.stock_percentage();
        if percentage > 50.0 {
            StockLevel::High
        } else if percentage > 20.0 {
            StockLevel::Medium
        } else {
            StockLevel::Low
        }
    }

    /// Strictly below `threshold`; records without a baseline are never low.
    pub fn is_low_stock(&self, threshold: f64) -> bool {
        self.stock_ratio().map_or(false, |ratio| ratio < threshold)
    }

    pub fn expiration_status(&self, today: NaiveDate, expiring_soon_days: i64) -> ExpirationStatus {
        let Some(expires) = self.expiration_date else {
            return ExpirationStatus::Unknown;
        };

        if expires < today {
            ExpirationStatus::Expired
        } else if expires <= today + Duration::days(expiring_soon_days) {
            ExpirationStatus::ExpiringSoon
        } else {
            ExpirationStatus::Normal
        }
    }

    /// Case-insensitive substring match on name, formula or CAS number.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&query)
            || self.formula.to_lowercase().contains(&query)
            || self.cas_number.to_lowercase().contains(&query)
    }

    /// Owned copy of the display attributes, taken when an audit event is logged.
    pub fn snapshot(&self) -> ChemicalSnapshot {
        ChemicalSnapshot {
            chemical_id: self.id,
            chemical_name: self.name.clone(),
            chemical_formula: self.formula.clone(),
            unit: self.unit,
        }
    }
}
