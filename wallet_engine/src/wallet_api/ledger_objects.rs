use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Transaction, TransactionStatus, TransactionType};

/// Criteria for listing ledger entries. All criteria are combined with AND. Results are ordered by id, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionQueryFilter {
    pub user_id: Option<i64>,
    pub order_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    /// `Some(true)` for entries with no order link only, `Some(false)` for order-linked entries only.
    pub manual: Option<bool>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl TransactionQueryFilter {
    pub fn for_user(user_id: i64) -> Self {
        Self::default().with_user_id(user_id)
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn active(self) -> Self {
        self.with_status(TransactionStatus::Active)
    }

    pub fn manual_only(mut self) -> Self {
        self.manual = Some(true);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.order_id.is_none() &&
            self.transaction_type.is_none() &&
            self.status.is_none() &&
            self.manual.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for TransactionQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters. ")?;
        }
        if let Some(user_id) = &self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(t) = &self.transaction_type {
            write!(f, "type: {t}. ")?;
        }
        if let Some(status) = &self.status {
            write!(f, "status: {status}. ")?;
        }
        if let Some(manual) = &self.manual {
            write!(f, "manual: {manual}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(limit) = &self.limit {
            write!(f, "limit {limit}.")?;
        }
        Ok(())
    }
}

/// A manual ledger entry requested by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEntry {
    pub user_id: i64,
    pub transaction_type: TransactionType,
    /// The unsigned magnitude.
    pub amount: Money,
    pub description: Option<String>,
}

impl ManualEntry {
    pub fn credit(user_id: i64, amount: Money) -> Self {
        Self { user_id, transaction_type: TransactionType::Credit, amount, description: None }
    }

    pub fn debit(user_id: i64, amount: Money) -> Self {
        Self { user_id, transaction_type: TransactionType::Debit, amount, description: None }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A user's ledger entries along with the derived balance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStatement {
    pub user_id: i64,
    pub balance: Money,
    pub transactions: Vec<Transaction>,
}
