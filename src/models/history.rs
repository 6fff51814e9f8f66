use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::chemical::Unit;

/// Denormalized chemical attributes captured at the moment an event was logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalSnapshot {
    pub chemical_id: Uuid,
    pub chemical_name: String,
    pub chemical_formula: String,
    pub unit: Unit,
}

/// One logged consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: Uuid,
    #[serde(flatten)]
    pub chemical: ChemicalSnapshot,
    pub amount_used: f64,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

/// One absolute stock-level correction, including the initial registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCorrectionEvent {
    pub id: Uuid,
    #[serde(flatten)]
    pub chemical: ChemicalSnapshot,
    /// Signed: negative when the correction lowered the stock.
    pub amount_added: f64,
    pub previous_stock: f64,
    pub new_stock: f64,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

impl StockCorrectionEvent {
    pub fn is_addition(&self) -> bool {
        self.amount_added >= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEntry {
    Usage(UsageEvent),
    StockUpdate(StockCorrectionEvent),
}

impl HistoryEntry {
    pub fn id(&self) -> Uuid {
        match self {
            HistoryEntry::Usage(event) => event.id,
            HistoryEntry::StockUpdate(event) => event.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            HistoryEntry::Usage(event) => event.timestamp,
            HistoryEntry::StockUpdate(event) => event.timestamp,
        }
    }

    pub fn chemical(&self) -> &ChemicalSnapshot {
        match self {
            HistoryEntry::Usage(event) => &event.chemical,
            HistoryEntry::StockUpdate(event) => &event.chemical,
        }
    }
}

impl From<UsageEvent> for HistoryEntry {
    fn from(event: UsageEvent) -> Self {
        HistoryEntry::Usage(event)
    }
}

impl From<StockCorrectionEvent> for HistoryEntry {
    fn from(event: StockCorrectionEvent) -> Self {
        HistoryEntry::StockUpdate(event)
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryEntry::Usage(event) => write!(
                f,
                "-{} {} {} ({}) used by {}",
                event.amount_used,
                event.chemical.unit,
                event.chemical.chemical_name,
                event.chemical.chemical_formula,
                event.user
            ),
            HistoryEntry::StockUpdate(event) => write!(
                f,
                "{}{} {} {} ({}) stock updated by {}: {} -> {} {}",
                if event.is_addition() { "+" } else { "" },
                event.amount_added,
                event.chemical.unit,
                event.chemical.chemical_name,
                event.chemical.chemical_formula,
                event.user,
                event.previous_stock,
                event.new_stock,
                event.chemical.unit
            ),
        }
    }
}

/// Restricts the merged history feed to one event kind.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HistoryFilter {
    #[default]
    All,
    Usage,
    StockUpdate,
}

impl HistoryFilter {
    pub fn includes_usage(self) -> bool {
        matches!(self, HistoryFilter::All | HistoryFilter::Usage)
    }

    pub fn includes_stock_updates(self) -> bool {
        matches!(self, HistoryFilter::All | HistoryFilter::StockUpdate)
    }
}
