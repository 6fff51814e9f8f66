use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::with_timeout;
use crate::models::{HistoryEntry, HistoryFilter, StockCorrectionEvent, UsageEvent};
use crate::repositories::InventoryRepository;

/// Append-only log of usage and stock-correction events.
///
/// Events hold owned snapshots of the chemical they describe, so the trail
/// never has to consult the ledger and never drives ledger state.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    usage: Vec<UsageEvent>,
    corrections: Vec<StockCorrectionEvent>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: impl Into<HistoryEntry>) {
        match entry.into() {
            HistoryEntry::Usage(event) => self.usage.push(event),
            HistoryEntry::StockUpdate(event) => self.corrections.push(event),
        }
    }

    /// Both event kinds, newest first. Entries sharing a timestamp keep no particular order.
    pub fn merged_history(&self, filter: HistoryFilter) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = Vec::with_capacity(self.len());

        if filter.includes_usage() {
            entries.extend(self.usage.iter().cloned().map(HistoryEntry::Usage));
        }
        if filter.includes_stock_updates() {
            entries.extend(
                self.corrections
                    .iter()
                    .cloned()
                    .map(HistoryEntry::StockUpdate),
            );
        }

        entries.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        entries
    }

    pub fn history_for(&self, chemical_id: Uuid, filter: HistoryFilter) -> Vec<HistoryEntry> {
        self.merged_history(filter)
            .into_iter()
            .filter(|entry| entry.chemical().chemical_id == chemical_id)
            .collect()
    }

    pub fn usage_events(&self) -> &[UsageEvent] {
        &self.usage
    }

    pub fn stock_corrections(&self) -> &[StockCorrectionEvent] {
        &self.corrections
    }

    pub fn len(&self) -> usize {
        self.usage.len() + self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usage.is_empty() && self.corrections.is_empty()
    }

    /// Reloads both logs from the store. Best-effort: a failed fetch is logged
    /// and keeps the previous contents of that log. Returns whether both loaded.
    pub async fn refresh(&mut self, repository: &dyn InventoryRepository, limit: Duration) -> bool {
        let mut complete = true;

        match with_timeout("fetch_usage_logs", limit, repository.fetch_usage_logs()).await {
            Ok(usage) => {
                debug!(count = usage.len(), "Loaded usage history");
                self.usage = usage;
            }
            Err(err) => {
                warn!(error = %err, "Failed to refresh usage history");
                complete = false;
            }
        }

        match with_timeout("fetch_stock_history", limit, repository.fetch_stock_history()).await {
            Ok(corrections) => {
                debug!(count = corrections.len(), "Loaded stock history");
                self.corrections = corrections;
            }
            Err(err) => {
                warn!(error = %err, "Failed to refresh stock history");
                complete = false;
            }
        }

        complete
    }
}
