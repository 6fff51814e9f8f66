// Domain records
pub mod chemical;
pub mod history;

pub use chemical::{Chemical, ExpirationStatus, StockLevel, Unit};
pub use history::{
    ChemicalSnapshot, HistoryEntry, HistoryFilter, StockCorrectionEvent, UsageEvent,
};
