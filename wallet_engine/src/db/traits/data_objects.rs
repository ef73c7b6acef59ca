use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, Transaction};

/// A single ledger write and the owner's balance immediately after it was projected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerChange {
    /// The entry as it was before the change. `None` for newly created entries.
    pub previous: Option<Transaction>,
    /// The entry after the change. For deletions, this is the entry that was removed.
    pub transaction: Transaction,
    pub balance: Money,
}

impl LedgerChange {
    pub fn created(transaction: Transaction, balance: Money) -> Self {
        Self { previous: None, transaction, balance }
    }

    pub fn changed(previous: Transaction, transaction: Transaction, balance: Money) -> Self {
        Self { previous: Some(previous), transaction, balance }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled(LedgerChange),
    /// The entry had already been cancelled. Nothing was written.
    AlreadyCancelled(Transaction),
}

impl CancelOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            CancelOutcome::Cancelled(change) => &change.transaction,
            CancelOutcome::AlreadyCancelled(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCreationResult {
    pub order: Order,
    /// Entries posted at creation. Only admin top-ups have any.
    pub posted: Vec<LedgerChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub old_order: Order,
    pub order: Order,
    pub posted: Vec<LedgerChange>,
    pub cancelled: Vec<LedgerChange>,
}

/// A user whose cached balance disagrees with the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDiscrepancy {
    pub user_id: i64,
    pub cached: Money,
    pub derived: Money,
}
