//! In-process datastore.
//!
//! Implements every collaborator trait over one mutex-guarded state. A unit of work holds the
//! lock for its whole lifetime and edits a copy that replaces the state on commit, so units are
//! serialized and an uncommitted unit leaves no trace. Used by tests and local runs without
//! PostgreSQL.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{BudgetId, CategoryId, OwnerId, PendingTransactionId, TransactionId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::StoreError;
use crate::approval::{PendingStatus, PendingTransaction};
use crate::budget::{AlertLevel, Budget, BudgetStore};
use crate::ingest::{
    Category, CredentialStore, MailboxCredential, StagingStore, SyncStateStore,
};
use crate::ledger::{
    Account, AccountRef, BalanceDelta, LedgerStore, LedgerUnit, Transaction, TransactionKind,
};
use crate::scheduler::MailboxSyncState;

#[derive(Debug, Clone, Default)]
struct State {
    transactions: HashMap<TransactionId, Transaction>,
    accounts: HashMap<AccountRef, Account>,
    pending: HashMap<PendingTransactionId, PendingTransaction>,
    budgets: Vec<Budget>,
    alerts: HashSet<(BudgetId, NaiveDate, AlertLevel)>,
    categories: Vec<Category>,
    sync_states: HashMap<OwnerId, MailboxSyncState>,
    credentials: HashMap<OwnerId, MailboxCredential>,
}

/// Datastore kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an account.
    pub async fn put_account(&self, account: Account) {
        self.state.lock().await.accounts.insert(account.reference, account);
    }

    /// Removes an account, leaving transactions that point at it dangling.
    pub async fn remove_account(&self, reference: AccountRef) {
        self.state.lock().await.accounts.remove(&reference);
    }

    /// Current balance of an account.
    pub async fn balance(&self, reference: AccountRef) -> Option<Decimal> {
        self.state
            .lock()
            .await
            .accounts
            .get(&reference)
            .map(|a| a.current_value)
    }

    /// Adds a budget.
    pub async fn put_budget(&self, budget: Budget) {
        let mut state = self.state.lock().await;
        state.budgets.retain(|b| b.id != budget.id);
        state.budgets.push(budget);
    }

    /// Adds a category.
    pub async fn put_category(&self, category: Category) {
        self.state.lock().await.categories.push(category);
    }

    /// Adds or replaces an owner's sync state.
    pub async fn put_sync_state(&self, state: MailboxSyncState) {
        self.state
            .lock()
            .await
            .sync_states
            .insert(state.owner_id, state);
    }

    /// Connects a mailbox credential for an owner.
    pub async fn put_credential(&self, owner_id: OwnerId, credential: MailboxCredential) {
        self.state
            .lock()
            .await
            .credentials
            .insert(owner_id, credential);
    }

    /// Inserts a staged row as-is, bypassing upsert rules.
    pub async fn put_pending(&self, pending: PendingTransaction) {
        self.state.lock().await.pending.insert(pending.id, pending);
    }

    /// Every staged row of an owner, in any status.
    pub async fn all_pending(&self, owner_id: OwnerId) -> Vec<PendingTransaction> {
        self.state
            .lock()
            .await
            .pending
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Number of committed transactions of an owner.
    pub async fn transaction_count(&self, owner_id: OwnerId) -> usize {
        self.state
            .lock()
            .await
            .transactions
            .values()
            .filter(|t| t.owner_id == owner_id)
            .count()
    }
}

struct MemoryUnit {
    guard: OwnedMutexGuard<State>,
    working: State,
}

#[async_trait]
impl LedgerUnit for MemoryUnit {
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        if self.working.transactions.contains_key(&transaction.id) {
            return Err(StoreError::Conflict(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        self.working
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn lock_transaction(
        &mut self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .working
            .transactions
            .get(&id)
            .filter(|t| t.owner_id == owner_id)
            .cloned())
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        match self.working.transactions.get_mut(&transaction.id) {
            Some(row) if row.owner_id == transaction.owner_id => {
                *row = transaction.clone();
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("transaction {}", transaction.id))),
        }
    }

    async fn delete_transaction(
        &mut self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<bool, StoreError> {
        let owned = self
            .working
            .transactions
            .get(&id)
            .is_some_and(|t| t.owner_id == owner_id);
        if owned {
            self.working.transactions.remove(&id);
        }
        Ok(owned)
    }

    async fn adjust_balance(
        &mut self,
        owner_id: OwnerId,
        delta: &BalanceDelta,
    ) -> Result<bool, StoreError> {
        match self.working.accounts.get_mut(&delta.account) {
            Some(account) if account.owner_id == owner_id => {
                account.current_value += delta.delta;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn lock_pending(
        &mut self,
        owner_id: OwnerId,
        id: PendingTransactionId,
    ) -> Result<Option<PendingTransaction>, StoreError> {
        Ok(self
            .working
            .pending
            .get(&id)
            .filter(|p| p.owner_id == owner_id)
            .cloned())
    }

    async fn save_pending(&mut self, pending: &PendingTransaction) -> Result<(), StoreError> {
        match self.working.pending.get_mut(&pending.id) {
            Some(row) if row.owner_id == pending.owner_id => {
                *row = pending.clone();
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("pending transaction {}", pending.id))),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnit { guard, working }))
    }

    async fn get_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .transactions
            .get(&id)
            .filter(|t| t.owner_id == owner_id)
            .cloned())
    }

    async fn list_transactions(
        &self,
        owner_id: OwnerId,
        limit: u64,
    ) -> Result<Vec<Transaction>, StoreError> {
        let state = self.state.lock().await;
        let mut rows: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn get_account(
        &self,
        owner_id: OwnerId,
        account: AccountRef,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .accounts
            .get(&account)
            .filter(|a| a.owner_id == owner_id)
            .cloned())
    }
}

#[async_trait]
impl BudgetStore for MemoryStore {
    async fn list_budgets(&self, owner_id: OwnerId) -> Result<Vec<Budget>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .budgets
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn sum_expenses(
        &self,
        owner_id: OwnerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        category_id: Option<CategoryId>,
    ) -> Result<Decimal, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .transactions
            .values()
            .filter(|t| {
                t.owner_id == owner_id
                    && t.kind == TransactionKind::Expense
                    && t.occurred_at >= from
                    && t.occurred_at < to
                    && category_id.is_none_or(|c| t.category_id == Some(c))
            })
            .map(|t| t.amount)
            .sum())
    }

    async fn record_alert(
        &self,
        budget_id: BudgetId,
        period_start: NaiveDate,
        level: AlertLevel,
        _sent_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .alerts
            .insert((budget_id, period_start, level)))
    }
}

#[async_trait]
impl StagingStore for MemoryStore {
    async fn upsert_pending(&self, pending: &PendingTransaction) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let existing = state
            .pending
            .values()
            .find(|p| {
                p.owner_id == pending.owner_id && p.source_message_id == pending.source_message_id
            })
            .map(|p| p.id);

        match existing.and_then(|id| state.pending.get_mut(&id)) {
            Some(row) if row.status.is_terminal() => Ok(false),
            Some(row) => {
                row.kind = pending.kind;
                row.amount = pending.amount;
                row.category_id = pending.category_id;
                row.occurred_at = pending.occurred_at;
                row.description.clone_from(&pending.description);
                row.updated_at = pending.updated_at;
                Ok(true)
            }
            None => {
                state.pending.insert(pending.id, pending.clone());
                Ok(true)
            }
        }
    }

    async fn list_pending(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<PendingTransaction>, StoreError> {
        let state = self.state.lock().await;
        let mut rows: Vec<PendingTransaction> = state
            .pending
            .values()
            .filter(|p| p.owner_id == owner_id && p.status == PendingStatus::Pending)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    async fn find_pending(
        &self,
        owner_id: OwnerId,
        ids: &[PendingTransactionId],
    ) -> Result<Vec<PendingTransaction>, StoreError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.pending.get(id))
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_pending(
        &self,
        owner_id: OwnerId,
        id: PendingTransactionId,
    ) -> Result<Option<PendingTransaction>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .pending
            .get(&id)
            .filter(|p| p.owner_id == owner_id)
            .cloned())
    }

    async fn list_categories(&self, owner_id: OwnerId) -> Result<Vec<Category>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .categories
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SyncStateStore for MemoryStore {
    async fn list_sync_states(&self) -> Result<Vec<MailboxSyncState>, StoreError> {
        let state = self.state.lock().await;
        let mut states: Vec<MailboxSyncState> = state
            .sync_states
            .values()
            .filter(|s| state.credentials.contains_key(&s.owner_id))
            .cloned()
            .collect();
        states.sort_by_key(|s| s.owner_id);
        Ok(states)
    }

    async fn get_sync_state(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<MailboxSyncState>, StoreError> {
        Ok(self.state.lock().await.sync_states.get(&owner_id).cloned())
    }

    async fn advance_watermark(
        &self,
        owner_id: OwnerId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let row = state
            .sync_states
            .get_mut(&owner_id)
            .ok_or_else(|| StoreError::NotFound(format!("sync state for owner {owner_id}")))?;
        row.last_sync_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load_credential(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<MailboxCredential>, StoreError> {
        Ok(self.state.lock().await.credentials.get(&owner_id).cloned())
    }

    async fn save_credential(
        &self,
        owner_id: OwnerId,
        credential: &MailboxCredential,
    ) -> Result<(), StoreError> {
        self.state
            .lock()
            .await
            .credentials
            .insert(owner_id, credential.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::AssetId;

    fn asset(owner_id: OwnerId, value: Decimal) -> Account {
        Account {
            reference: AccountRef::Asset(AssetId::new()),
            owner_id,
            name: "Checking".to_string(),
            account_type: "bank".to_string(),
            current_value: value,
        }
    }

    #[tokio::test]
    async fn test_uncommitted_unit_leaves_no_trace() {
        let store = MemoryStore::new();
        let owner = OwnerId::new();
        let account = asset(owner, dec!(100));
        let reference = account.reference;
        store.put_account(account).await;

        {
            let mut unit = store.begin().await.unwrap();
            let delta = BalanceDelta {
                account: reference,
                delta: dec!(-40),
            };
            assert!(unit.adjust_balance(owner, &delta).await.unwrap());
            // dropped without commit
        }
        assert_eq!(store.balance(reference).await, Some(dec!(100)));

        let mut unit = store.begin().await.unwrap();
        let delta = BalanceDelta {
            account: reference,
            delta: dec!(-40),
        };
        unit.adjust_balance(owner, &delta).await.unwrap();
        unit.commit().await.unwrap();
        assert_eq!(store.balance(reference).await, Some(dec!(60)));
    }

    #[tokio::test]
    async fn test_adjust_balance_is_owner_scoped() {
        let store = MemoryStore::new();
        let account = asset(OwnerId::new(), dec!(10));
        let reference = account.reference;
        store.put_account(account).await;

        let mut unit = store.begin().await.unwrap();
        let delta = BalanceDelta {
            account: reference,
            delta: dec!(5),
        };
        assert!(!unit.adjust_balance(OwnerId::new(), &delta).await.unwrap());
    }

    #[tokio::test]
    async fn test_watermark_requires_state() {
        let store = MemoryStore::new();
        let result = store.advance_watermark(OwnerId::new(), Utc::now()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
