//! Property-based tests for the inventory ledger.
//!
//! Random sequences of consumption and correction requests must never drive
//! stock negative or lower the high-water mark, and the ledger must always
//! agree with the store after every request, successful or not.

mod common;

use proptest::prelude::*;

use chem_inventory::models::Unit;
use chem_inventory::repositories::RepositoryOperation;

use common::{in_memory_ledger, stocked};

#[derive(Debug, Clone)]
enum Request {
    Consume(f64),
    Correct(f64),
    ConsumeWithLostLog(f64),
}

fn request_strategy() -> impl Strategy<Value = Request> {
    prop_oneof![
        4 => (0.0f64..600.0).prop_map(Request::Consume),
        3 => (0.0f64..1_500.0).prop_map(Request::Correct),
        1 => (0.1f64..50.0).prop_map(Request::ConsumeWithLostLog),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn stock_invariants_hold_for_any_request_sequence(
        opening in 1.0f64..1_000.0,
        requests in prop::collection::vec(request_strategy(), 1..25),
    ) {
        let chemical = stocked("Asam Sulfat", opening, opening, Unit::Milliliter);
        let id = chemical.id;

        let outcome: Result<(), TestCaseError> = runtime().block_on(async move {
            let (mut ledger, repository) = in_memory_ledger(vec![chemical]).await;
            let mut successes = 0usize;

            for request in requests {
                let before = ledger.get(id).cloned().unwrap();
                let result = match request {
                    Request::Consume(amount) => ledger.consume(id, amount, "Bob").await.map(|_| ()),
                    Request::Correct(level) => {
                        ledger.correct_stock(id, level, "Carol").await.map(|_| ())
                    }
                    Request::ConsumeWithLostLog(amount) => {
                        repository.fail_next(RepositoryOperation::InsertUsageLog);
                        let result = ledger.consume(id, amount, "Bob").await.map(|_| ());
                        repository.heal();
                        result
                    }
                };

                let after = ledger.get(id).cloned().unwrap();
                prop_assert!(after.current_stock >= 0.0);
                prop_assert!(after.initial_stock >= before.initial_stock);
                prop_assert!(after.current_stock <= after.initial_stock);
                prop_assert_eq!(repository.stored_chemical(id), Some(after.clone()));

                match result {
                    Ok(()) => successes += 1,
                    Err(_) => prop_assert_eq!(&after, &before),
                }
            }

            prop_assert_eq!(ledger.audit_trail().len(), successes);
            prop_assert_eq!(
                repository.stored_usage_logs().len() + repository.stored_stock_history().len(),
                successes
            );
            Ok(())
        });
        outcome?;
    }
}
