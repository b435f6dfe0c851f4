//! Property-based tests for the ledger sync engine.
//!
//! - Apply/reverse identity for both account kinds and both transaction kinds
//! - Balance invariant: after any sequence of create/edit/delete, every balance equals its
//!   opening value plus the signed effects of the transactions still linked to it

use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AssetId, LiabilityId, OwnerId, TransactionId};

use super::balance::{BalanceDelta, replay};
use super::service::LedgerService;
use super::types::{Account, AccountRef, TransactionDraft, TransactionKind, ORIGIN_MANUAL};
use crate::store::MemoryStore;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate signed opening balances.
fn opening_balance() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![Just(TransactionKind::Income), Just(TransactionKind::Expense)]
}

/// Index into the test's accounts; `None` leaves the transaction unlinked.
fn account_slot() -> impl Strategy<Value = Option<usize>> {
    prop_oneof![Just(None), Just(Some(0)), Just(Some(1)), Just(Some(2))]
}

#[derive(Debug, Clone)]
enum Op {
    Create {
        kind: TransactionKind,
        amount: Decimal,
        slot: Option<usize>,
    },
    Edit {
        target: usize,
        kind: TransactionKind,
        amount: Decimal,
        slot: Option<usize>,
    },
    Delete {
        target: usize,
    },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (kind_strategy(), positive_amount(), account_slot())
            .prop_map(|(kind, amount, slot)| Op::Create { kind, amount, slot }),
        2 => (any::<usize>(), kind_strategy(), positive_amount(), account_slot())
            .prop_map(|(target, kind, amount, slot)| Op::Edit { target, kind, amount, slot }),
        1 => any::<usize>().prop_map(|target| Op::Delete { target }),
    ]
}

fn draft(kind: TransactionKind, amount: Decimal, account: Option<AccountRef>) -> TransactionDraft {
    TransactionDraft {
        kind,
        amount,
        category_id: None,
        account,
        occurred_at: Utc::now(),
        description: String::new(),
        origin_method: ORIGIN_MANUAL.to_string(),
        source_message_id: None,
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// reverse(apply(v)) == v for every account and transaction kind.
    #[test]
    fn prop_apply_then_reverse_is_identity(
        opening in opening_balance(),
        amount in positive_amount(),
        kind in kind_strategy(),
        liability in any::<bool>(),
    ) {
        let account = if liability {
            AccountRef::Liability(LiabilityId::new())
        } else {
            AccountRef::Asset(AssetId::new())
        };
        let applied = BalanceDelta::apply(kind, amount, account);
        let reversed = BalanceDelta::reverse(kind, amount, account);

        prop_assert_eq!(replay(opening, [applied, reversed]), opening);
        prop_assert_eq!(applied.delta.abs(), amount);
    }

    /// Balances match a full replay of surviving transactions after any mutation sequence.
    #[test]
    fn prop_balance_invariant_holds(
        openings in proptest::collection::vec(opening_balance(), 3),
        ops in proptest::collection::vec(op_strategy(), 1..30),
    ) {
        runtime().block_on(async {
            let store = Arc::new(MemoryStore::new());
            let service = LedgerService::new(store.clone());
            let owner = OwnerId::new();

            let accounts = [
                AccountRef::Asset(AssetId::new()),
                AccountRef::Asset(AssetId::new()),
                AccountRef::Liability(LiabilityId::new()),
            ];
            for (reference, opening) in accounts.iter().zip(&openings) {
                store.put_account(Account {
                    reference: *reference,
                    owner_id: owner,
                    name: reference.to_string(),
                    account_type: "test".to_string(),
                    current_value: *opening,
                }).await;
            }

            let mut live: Vec<TransactionId> = Vec::new();
            for op in ops {
                match op {
                    Op::Create { kind, amount, slot } => {
                        let outcome = service
                            .create(owner, draft(kind, amount, slot.map(|i| accounts[i])), Utc::now())
                            .await
                            .unwrap();
                        live.push(outcome.transaction.id);
                    }
                    Op::Edit { target, kind, amount, slot } if !live.is_empty() => {
                        let id = live[target % live.len()];
                        service
                            .update(owner, id, draft(kind, amount, slot.map(|i| accounts[i])), Utc::now())
                            .await
                            .unwrap();
                    }
                    Op::Delete { target } if !live.is_empty() => {
                        let id = live.remove(target % live.len());
                        service.delete(owner, id, Utc::now()).await.unwrap();
                    }
                    _ => {}
                }
            }

            let surviving = service.list(owner, Some(u64::MAX)).await.unwrap();
            prop_assert_eq!(surviving.len(), live.len());

            for (reference, opening) in accounts.iter().zip(&openings) {
                let expected = replay(
                    *opening,
                    surviving
                        .iter()
                        .filter_map(BalanceDelta::applying)
                        .filter(|d| d.account == *reference),
                );
                prop_assert_eq!(store.balance(*reference).await, Some(expected));
            }
            Ok(())
        })?;
    }
}
