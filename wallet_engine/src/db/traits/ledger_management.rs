use crate::{
    db::traits::{BalanceDiscrepancy, CancelOutcome, LedgerChange},
    db_types::{Money, NewTransaction, Transaction, TransactionUpdate},
    policies::ReversalPolicy,
    wallet_api::{errors::WalletError, ledger_objects::TransactionQueryFilter},
};

/// The `LedgerManagement` trait defines the ledger primitives.
///
/// Every method that writes to the ledger does so in a single database transaction that locks the affected users
/// first, writes, and then re-projects the owner's cached balance before committing.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Writes a new active entry. For debits with an enforced [`crate::policies::BalanceGate`], the owner's balance is
    /// checked after the lock is taken, and `InsufficientBalance` is returned if it does not cover the amount.
    async fn post_transaction(&self, entry: NewTransaction) -> Result<LedgerChange, WalletError>;

    /// Marks the entry as cancelled. Cancelling an entry that is already cancelled is a no-op. Entries that belong to an
    /// order are refused with `ForbiddenModification`.
    async fn cancel_transaction(
        &self,
        transaction_id: i64,
        policy: ReversalPolicy,
    ) -> Result<CancelOutcome, WalletError>;

    /// The sum of the user's active entries. This is the authoritative balance.
    async fn compute_balance(&self, user_id: i64) -> Result<Money, WalletError>;

    async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, WalletError>;

    async fn search_transactions(&self, filter: TransactionQueryFilter) -> Result<Vec<Transaction>, WalletError>;

    /// Changes the type, magnitude or description of an active manual entry. Order-linked and cancelled entries
    /// fail with `ForbiddenModification`.
    async fn update_manual_transaction(
        &self,
        transaction_id: i64,
        update: TransactionUpdate,
        policy: ReversalPolicy,
    ) -> Result<LedgerChange, WalletError>;

    /// Removes a manual entry. The returned change carries the deleted entry and the owner's new balance.
    async fn delete_manual_transaction(
        &self,
        transaction_id: i64,
        policy: ReversalPolicy,
    ) -> Result<LedgerChange, WalletError>;

    /// Re-derives the user's cached balance from the ledger and stores it.
    async fn rebuild_balance(&self, user_id: i64) -> Result<Money, WalletError>;

    /// Lists every user whose cached balance differs from the ledger sum.
    async fn audit_balances(&self) -> Result<Vec<BalanceDiscrepancy>, WalletError>;
}
