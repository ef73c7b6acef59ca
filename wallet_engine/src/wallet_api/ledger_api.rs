//! The ledger API.
//!
//! [`LedgerApi`] wraps the ledger primitives of a [`LedgerManagement`] backend and publishes the money-movement events
//! once each change has committed.
use std::fmt::Debug;

use log::*;

use crate::{
    config::WalletConfig,
    db::traits::{BalanceDiscrepancy, CancelOutcome, LedgerChange, LedgerManagement},
    db_types::{ActorId, Money, NewTransaction, Transaction, TransactionType, TransactionUpdate},
    events::{EventProducers, MoneyAddedEvent, MoneyWithdrawnEvent, TransactionCancelledEvent},
    policies::{BalanceGate, ReversalPolicy},
    wallet_api::{
        errors::WalletError,
        ledger_objects::{LedgerStatement, ManualEntry, TransactionQueryFilter},
    },
};

pub struct LedgerApi<B> {
    db: B,
    producers: EventProducers,
    policy: ReversalPolicy,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?}, {})", self.db, self.policy)
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, policy: ReversalPolicy::default() }
    }

    pub fn with_reversal_policy(mut self, policy: ReversalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(self, config: &WalletConfig) -> Self {
        self.with_reversal_policy(config.reversal_policy)
    }

    pub fn reversal_policy(&self) -> ReversalPolicy {
        self.policy
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    /// The user's current balance, derived from the ledger.
    pub async fn balance(&self, user_id: i64) -> Result<Money, WalletError> {
        self.db.compute_balance(user_id).await
    }

    pub async fn has_sufficient_balance(&self, user_id: i64, amount: Money) -> Result<bool, WalletError> {
        let balance = self.db.compute_balance(user_id).await?;
        Ok(balance >= amount)
    }

    /// Adds a system-generated credit to the user's ledger.
    pub async fn credit(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        order_id: Option<i64>,
    ) -> Result<Transaction, WalletError> {
        let mut entry = NewTransaction::credit(user_id, amount).with_description(description);
        entry.order_id = order_id;
        self.post(entry).await
    }

    /// Adds a system-generated debit to the user's ledger. The balance must cover the amount.
    pub async fn debit(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        order_id: Option<i64>,
    ) -> Result<Transaction, WalletError> {
        let mut entry = NewTransaction::debit(user_id, amount).with_description(description);
        entry.order_id = order_id;
        self.post(entry).await
    }

    /// Records an entry on behalf of an administrator. Manual debits are subject to the same balance check as any
    /// other debit.
    pub async fn create_manual_transaction(
        &self,
        actor: ActorId,
        entry: ManualEntry,
    ) -> Result<Transaction, WalletError> {
        let mut new_entry = match entry.transaction_type {
            TransactionType::Credit => NewTransaction::credit(entry.user_id, entry.amount),
            TransactionType::Debit => NewTransaction::debit(entry.user_id, entry.amount),
        }
        .created_by(actor)
        .with_gate(BalanceGate::Enforce);
        new_entry.description = entry.description;
        info!("💰️ {actor} is recording a manual {} of {} for user #{}", entry.transaction_type, entry.amount, entry.user_id);
        self.post(new_entry).await
    }

    async fn post(&self, entry: NewTransaction) -> Result<Transaction, WalletError> {
        let change = self.db.post_transaction(entry).await?;
        let transaction = change.transaction.clone();
        publish_posted(&self.producers, change).await;
        Ok(transaction)
    }

    /// Cancels an entry. Cancelling an entry that has already been cancelled changes nothing and returns it as is.
    ///
    /// Entries linked to an order fail with `ForbiddenModification`. Reject, deny or refund the order instead, so that
    /// every leg is reversed together.
    pub async fn cancel_transaction(&self, transaction_id: i64) -> Result<Transaction, WalletError> {
        match self.db.cancel_transaction(transaction_id, self.policy).await? {
            CancelOutcome::Cancelled(change) => {
                let transaction = change.transaction.clone();
                publish_cancelled(&self.producers, change).await;
                Ok(transaction)
            },
            CancelOutcome::AlreadyCancelled(transaction) => Ok(transaction),
        }
    }

    pub async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, WalletError> {
        self.db.fetch_transaction(transaction_id).await
    }

    pub async fn list_transactions(&self, filter: TransactionQueryFilter) -> Result<Vec<Transaction>, WalletError> {
        trace!("💰️ Listing transactions. {filter}");
        self.db.search_transactions(filter).await
    }

    /// All of the user's entries, cancelled ones included, along with the derived balance.
    pub async fn statement(&self, user_id: i64) -> Result<LedgerStatement, WalletError> {
        let balance = self.db.compute_balance(user_id).await?;
        let transactions = self.db.search_transactions(TransactionQueryFilter::for_user(user_id)).await?;
        Ok(LedgerStatement { user_id, balance, transactions })
    }

    /// Edits a manual entry. Entries that belong to an order cannot be edited.
    pub async fn update_manual_transaction(
        &self,
        actor: ActorId,
        transaction_id: i64,
        update: TransactionUpdate,
    ) -> Result<Transaction, WalletError> {
        let change = self.db.update_manual_transaction(transaction_id, update, self.policy).await?;
        info!(
            "💰️ {actor} edited manual transaction #{transaction_id}. Balance for user #{} is now {}",
            change.transaction.user_id, change.balance
        );
        Ok(change.transaction)
    }

    /// Deletes a manual entry and returns it. Entries that belong to an order cannot be deleted.
    pub async fn delete_manual_transaction(&self, actor: ActorId, transaction_id: i64) -> Result<Transaction, WalletError> {
        let change = self.db.delete_manual_transaction(transaction_id, self.policy).await?;
        info!(
            "💰️ {actor} deleted manual transaction #{transaction_id}. Balance for user #{} is now {}",
            change.transaction.user_id, change.balance
        );
        Ok(change.transaction)
    }

    pub async fn rebuild_balance(&self, user_id: i64) -> Result<Money, WalletError> {
        self.db.rebuild_balance(user_id).await
    }

    pub async fn audit_balances(&self) -> Result<Vec<BalanceDiscrepancy>, WalletError> {
        let result = self.db.audit_balances().await?;
        if !result.is_empty() {
            warn!("🧮️ {} users have a cached balance that disagrees with their ledger", result.len());
        }
        Ok(result)
    }
}

/// Notifies subscribers of a newly posted entry.
pub(crate) async fn publish_posted(producers: &EventProducers, change: LedgerChange) {
    let LedgerChange { transaction, balance, .. } = change;
    match transaction.transaction_type {
        TransactionType::Credit => producers.publish_money_added(MoneyAddedEvent { transaction, balance }).await,
        TransactionType::Debit => producers.publish_money_withdrawn(MoneyWithdrawnEvent { transaction, balance }).await,
    }
}

/// Notifies subscribers of a cancelled entry.
pub(crate) async fn publish_cancelled(producers: &EventProducers, change: LedgerChange) {
    let LedgerChange { previous, transaction, balance } = change;
    let old_transaction = previous.unwrap_or_else(|| transaction.clone());
    let event = TransactionCancelledEvent { old_transaction, new_transaction: transaction, balance };
    producers.publish_transaction_cancelled(event).await;
}
