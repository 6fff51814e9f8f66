use std::future::Future;
use std::time::Duration;

use crate::errors::ServiceError;

pub mod audit_trail;
pub mod inventory_ledger;

pub use audit_trail::AuditTrail;
pub use inventory_ledger::{InventoryLedger, LedgerSettings};

/// Bounds one remote store call; an elapsed deadline surfaces as a persistence error.
pub(crate) async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::timeout(operation, limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_calls_time_out() {
        let result: Result<(), ServiceError> =
            with_timeout("fetch_chemicals", Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::PersistenceError(msg)) if msg.contains("fetch_chemicals")
        ));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let result = with_timeout("fetch_chemicals", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }
}
