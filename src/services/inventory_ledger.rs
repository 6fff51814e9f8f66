use chrono::{Local, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{with_timeout, AuditTrail};
use crate::commands::{
    Command, ConsumeChemicalCommand, CorrectStockCommand, NewChemical, RegisterChemicalCommand,
    StockChange,
};
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::chemical::{DEFAULT_EXPIRING_SOON_DAYS, DEFAULT_LOW_STOCK_THRESHOLD};
use crate::models::{
    Chemical, ExpirationStatus, HistoryEntry, HistoryFilter, StockCorrectionEvent, UsageEvent,
};
use crate::repositories::InventoryRepository;

const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for remote calls and the derived views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerSettings {
    pub remote_timeout: Duration,
    pub low_stock_threshold: f64,
    pub expiring_soon_days: i64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            expiring_soon_days: DEFAULT_EXPIRING_SOON_DAYS,
        }
    }
}

impl From<&AppConfig> for LedgerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            remote_timeout: Duration::from_millis(config.remote_timeout_ms),
            low_stock_threshold: config.low_stock_threshold,
            expiring_soon_days: config.expiring_soon_days,
        }
    }
}

/// Authoritative in-memory list of chemicals, kept in step with the record store.
///
/// Every mutation is written to the store first and applied locally only from
/// the confirmed response. The store has no transactions, so a failed audit
/// write after a successful stock update is undone with a compensating update.
pub struct InventoryLedger {
    repository: Arc<dyn InventoryRepository>,
    chemicals: Vec<Chemical>,
    audit: AuditTrail,
    settings: LedgerSettings,
    event_sender: Option<EventSender>,
}

impl InventoryLedger {
    /// Creates an empty ledger over `repository` without touching the store.
    pub fn new(repository: Arc<dyn InventoryRepository>, settings: LedgerSettings) -> Self {
        Self {
            repository,
            chemicals: Vec::new(),
            audit: AuditTrail::new(),
            settings,
            event_sender: None,
        }
    }

    /// Loads every chemical from the store, then the audit history best-effort.
    #[instrument(skip(repository))]
    pub async fn load(
        repository: Arc<dyn InventoryRepository>,
        settings: LedgerSettings,
    ) -> Result<Self, ServiceError> {
        let mut ledger = Self::new(repository, settings);

        let mut chemicals = with_timeout(
            "fetch_chemicals",
            settings.remote_timeout,
            ledger.repository.fetch_chemicals(),
        )
        .await?;
        chemicals.sort_by(|a, b| a.name.cmp(&b.name));
        ledger.chemicals = chemicals;

        ledger.refresh_history().await;
        info!(
            chemicals = ledger.chemicals.len(),
            history = ledger.audit.len(),
            "Inventory ledger loaded"
        );
        Ok(ledger)
    }

    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Reloads the audit trail from the store. Failures are logged, never surfaced.
    pub async fn refresh_history(&mut self) -> bool {
        self.audit
            .refresh(self.repository.as_ref(), self.settings.remote_timeout)
            .await
    }

    /// All chemicals, sorted by name.
    pub fn chemicals(&self) -> &[Chemical] {
        &self.chemicals
    }

    pub fn get(&self, id: Uuid) -> Option<&Chemical> {
        self.chemicals.iter().find(|chemical| chemical.id == id)
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn history(&self, filter: HistoryFilter) -> Vec<HistoryEntry> {
        self.audit.merged_history(filter)
    }

    pub fn history_for(&self, chemical_id: Uuid, filter: HistoryFilter) -> Vec<HistoryEntry> {
        self.audit.history_for(chemical_id, filter)
    }

    pub fn low_stock(&self) -> Vec<&Chemical> {
        let threshold = self.settings.low_stock_threshold;
        self.chemicals
            .iter()
            .filter(|chemical| chemical.is_low_stock(threshold))
            .collect()
    }

    pub fn expiration_status(&self, chemical: &Chemical) -> ExpirationStatus {
        self.expiration_status_on(chemical, Local::now().date_naive())
    }

    pub fn expiration_status_on(&self, chemical: &Chemical, today: NaiveDate) -> ExpirationStatus {
        chemical.expiration_status(today, self.settings.expiring_soon_days)
    }

    /// Chemicals that are expired or expiring soon as of `today`.
    pub fn expiration_alerts_on(&self, today: NaiveDate) -> Vec<(&Chemical, ExpirationStatus)> {
        self.chemicals
            .iter()
            .map(|chemical| (chemical, self.expiration_status_on(chemical, today)))
            .filter(|(_, status)| {
                matches!(
                    status,
                    ExpirationStatus::Expired | ExpirationStatus::ExpiringSoon
                )
            })
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Chemical> {
        self.chemicals
            .iter()
            .filter(|chemical| chemical.matches_query(query))
            .collect()
    }

    /// Distinct storage locations in lexicographic order.
    pub fn locations(&self) -> Vec<String> {
        self.chemicals
            .iter()
            .map(|chemical| chemical.location.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Registers a new chemical and logs its opening stock as a correction.
    #[instrument(skip(self, chemical), fields(name = %chemical.name))]
    pub async fn register(
        &mut self,
        chemical: NewChemical,
        registered_by: &str,
    ) -> Result<Chemical, ServiceError> {
        let command = RegisterChemicalCommand::new(chemical, registered_by);
        command.check()?;
        debug!(command = RegisterChemicalCommand::NAME, "Command validated");

        let record = command.to_chemical(Uuid::new_v4());
        let stored = self
            .remote("insert_chemical", self.repository.insert_chemical(&record))
            .await?;

        // The chemical is durable from here on, whatever happens to its audit event.
        let index = self
            .chemicals
            .partition_point(|existing| existing.name <= stored.name);
        self.chemicals.insert(index, stored.clone());

        let opening = StockCorrectionEvent {
            id: Uuid::new_v4(),
            chemical: stored.snapshot(),
            amount_added: stored.initial_stock,
            previous_stock: 0.0,
            new_stock: stored.initial_stock,
            user: command.registered_by.trim().to_string(),
            timestamp: Utc::now(),
        };

        let saved = match self
            .remote(
                "insert_stock_history",
                self.repository.insert_stock_history(&opening),
            )
            .await
        {
            Ok(saved) => saved,
            Err(err) => {
                error!(
                    chemical_id = %stored.id,
                    error = %err,
                    "Chemical saved but its opening stock entry was not"
                );
                return Err(ServiceError::OpeningEntryNotSaved {
                    chemical_id: stored.id,
                    name: stored.name.clone(),
                    cause: err.to_string(),
                });
            }
        };
        self.audit.append(saved);

        info!(
            chemical_id = %stored.id,
            initial_stock = stored.initial_stock,
            "Chemical registered"
        );
        self.publish(Event::ChemicalRegistered {
            chemical_id: stored.id,
            name: stored.name.clone(),
            initial_stock: stored.initial_stock,
            unit: stored.unit,
        })
        .await;

        Ok(stored)
    }

    /// Logs consumption of `amount` and lowers the current stock accordingly.
    #[instrument(skip(self))]
    pub async fn consume(
        &mut self,
        chemical_id: Uuid,
        amount: f64,
        user: &str,
    ) -> Result<UsageEvent, ServiceError> {
        let command = ConsumeChemicalCommand::new(chemical_id, amount, user);
        command.check()?;
        debug!(command = ConsumeChemicalCommand::NAME, "Command validated");

        let index = self.position(chemical_id)?;
        let change = command.plan(&self.chemicals[index])?;
        let persisted = self.write_stock(chemical_id, &change).await?;

        let event = UsageEvent {
            id: Uuid::new_v4(),
            chemical: persisted.snapshot(),
            amount_used: command.amount,
            user: command.user.trim().to_string(),
            timestamp: Utc::now(),
        };

        let inserted = self
            .remote("insert_usage_log", self.repository.insert_usage_log(&event))
            .await;
        let saved = match inserted {
            Ok(saved) => saved,
            Err(err) => {
                self.compensate(index, &change, &persisted).await;
                return Err(err);
            }
        };

        let was_low = self.is_low(index);
        self.apply(index, &persisted);
        self.audit.append(saved.clone());

        info!(
            %chemical_id,
            amount,
            remaining = persisted.current_stock,
            "Chemical usage logged"
        );
        self.publish(Event::StockConsumed {
            chemical_id,
            usage_id: saved.id,
            amount: saved.amount_used,
            remaining: persisted.current_stock,
            user: saved.user.clone(),
        })
        .await;
        self.publish_low_stock_crossing(index, was_low).await;

        Ok(saved)
    }

    /// Sets an absolute stock level, raising the high-water mark when exceeded.
    #[instrument(skip(self))]
    pub async fn correct_stock(
        &mut self,
        chemical_id: Uuid,
        new_stock: f64,
        user: &str,
    ) -> Result<StockCorrectionEvent, ServiceError> {
        let command = CorrectStockCommand::new(chemical_id, new_stock, user);
        command.check()?;
        debug!(command = CorrectStockCommand::NAME, "Command validated");

        let index = self.position(chemical_id)?;
        let change = command.plan(&self.chemicals[index]);
        let persisted = self.write_stock(chemical_id, &change).await?;

        let event = StockCorrectionEvent {
            id: Uuid::new_v4(),
            chemical: persisted.snapshot(),
            amount_added: change.delta(),
            previous_stock: change.previous_current,
            new_stock: change.current,
            user: command.user.trim().to_string(),
            timestamp: Utc::now(),
        };

        let inserted = self
            .remote(
                "insert_stock_history",
                self.repository.insert_stock_history(&event),
            )
            .await;
        let saved = match inserted {
            Ok(saved) => saved,
            Err(err) => {
                self.compensate(index, &change, &persisted).await;
                return Err(err);
            }
        };

        let was_low = self.is_low(index);
        self.apply(index, &persisted);
        self.audit.append(saved.clone());

        info!(
            %chemical_id,
            previous_stock = saved.previous_stock,
            new_stock = saved.new_stock,
            "Stock corrected"
        );
        self.publish(Event::StockCorrected {
            chemical_id,
            correction_id: saved.id,
            previous_stock: saved.previous_stock,
            new_stock: saved.new_stock,
            user: saved.user.clone(),
        })
        .await;
        self.publish_low_stock_crossing(index, was_low).await;

        Ok(saved)
    }

    fn position(&self, chemical_id: Uuid) -> Result<usize, ServiceError> {
        self.chemicals
            .iter()
            .position(|chemical| chemical.id == chemical_id)
            .ok_or_else(|| ServiceError::chemical_not_found(chemical_id))
    }

    fn is_low(&self, index: usize) -> bool {
        self.chemicals[index].is_low_stock(self.settings.low_stock_threshold)
    }

    fn apply(&mut self, index: usize, persisted: &Chemical) {
        let chemical = &mut self.chemicals[index];
        chemical.current_stock = persisted.current_stock;
        chemical.initial_stock = persisted.initial_stock;
    }

    async fn remote<T, F>(&self, operation: &'static str, call: F) -> Result<T, ServiceError>
    where
        F: std::future::Future<Output = Result<T, ServiceError>>,
    {
        with_timeout(operation, self.settings.remote_timeout, call).await
    }

    async fn write_stock(
        &self,
        chemical_id: Uuid,
        change: &StockChange,
    ) -> Result<Chemical, ServiceError> {
        self.remote(
            "update_chemical_stock",
            self.repository
                .update_chemical_stock(chemical_id, change.current, change.initial),
        )
        .await
    }

    /// Restores the pre-mutation stock after the audit write failed. When the
    /// restore fails too, the local record follows what the store now holds.
    async fn compensate(&mut self, index: usize, change: &StockChange, persisted: &Chemical) {
        let chemical_id = self.chemicals[index].id;
        let restore = self
            .remote(
                "update_chemical_stock",
                self.repository.update_chemical_stock(
                    chemical_id,
                    change.previous_current,
                    change.previous_initial,
                ),
            )
            .await;

        match restore {
            Ok(_) => {
                warn!(%chemical_id, "Audit write failed; stock update rolled back");
            }
            Err(err) => {
                error!(
                    %chemical_id,
                    error = %err,
                    current_stock = persisted.current_stock,
                    initial_stock = persisted.initial_stock,
                    "Rollback failed; keeping the stock values the store holds"
                );
                self.apply(index, persisted);
            }
        }
    }

    async fn publish_low_stock_crossing(&self, index: usize, was_low: bool) {
        if was_low || !self.is_low(index) {
            return;
        }
        let chemical = &self.chemicals[index];
        self.publish(Event::LowStockDetected {
            chemical_id: chemical.id,
            name: chemical.name.clone(),
            current_stock: chemical.current_stock,
            initial_stock: chemical.initial_stock,
            unit: chemical.unit,
        })
        .await;
    }

    /// Best-effort: a closed or saturated channel never fails the mutation.
    async fn publish(&self, event: Event) {
        let Some(sender) = &self.event_sender else {
            return;
        };

        match tokio::time::timeout(self.settings.remote_timeout, sender.send(event)).await {
            Ok(Ok(())) => debug!("Domain event published"),
            Ok(Err(err)) => warn!(error = %err, "Failed to publish domain event"),
            Err(_) => warn!("Timed out publishing domain event"),
        }
    }
}
