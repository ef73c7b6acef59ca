//! Ledger-critical handlers.
//!
//! Unlike the hooks in [`super::hooks`], these are not fire-and-forget. When an order completes, the handler registered
//! for its [`OrderType`] produces the [`Posting`]s that are written in the same database transaction as the status
//! change. A handler that returns an error aborts the transition. Handlers are pure: they see the order's terms and
//! nothing else, and the storage layer does the writing.
use std::{collections::HashMap, fmt::Debug, sync::Arc};

use crate::{
    db_types::{Money, NewOrder, Order, OrderType},
    order_machine::Posting,
    policies::OrderTypePolicy,
    wallet_api::errors::WalletError,
};

/// The parts of an order that determine its ledger effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerms<'a> {
    pub order_type: OrderType,
    pub user_id: i64,
    pub receiver_user_id: Option<i64>,
    pub amount: Money,
    pub title: &'a str,
}

impl<'a> From<&'a Order> for OrderTerms<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            order_type: order.order_type,
            user_id: order.user_id,
            receiver_user_id: order.receiver_user_id,
            amount: order.amount,
            title: order.title.as_str(),
        }
    }
}

impl<'a> From<&'a NewOrder> for OrderTerms<'a> {
    fn from(order: &'a NewOrder) -> Self {
        Self {
            order_type: order.order_type,
            user_id: order.user_id,
            receiver_user_id: order.receiver_user_id,
            amount: order.amount,
            title: order.title.as_str(),
        }
    }
}

pub trait LedgerHandler: Send + Sync {
    fn postings(&self, terms: &OrderTerms) -> Result<Vec<Posting>, WalletError>;
}

/// Moves the amount from the sender to the receiver. The debit leg always enforces the sender's balance.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferHandler;

impl LedgerHandler for TransferHandler {
    fn postings(&self, terms: &OrderTerms) -> Result<Vec<Posting>, WalletError> {
        let receiver = terms.receiver_user_id.ok_or(WalletError::MissingReceiver)?;
        let gate = OrderTypePolicy::for_type(terms.order_type).balance_gate;
        Ok(vec![
            Posting::debit(terms.user_id, terms.amount, format!("Transfer to user #{receiver}: {}", terms.title), gate),
            Posting::credit(receiver, terms.amount, format!("Transfer from user #{}: {}", terms.user_id, terms.title)),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TopUpCreditHandler;

impl LedgerHandler for TopUpCreditHandler {
    fn postings(&self, terms: &OrderTerms) -> Result<Vec<Posting>, WalletError> {
        Ok(vec![Posting::credit(terms.user_id, terms.amount, format!("Top-up: {}", terms.title))])
    }
}

/// Debits the owner. Whether the balance is checked depends on the order type.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithdrawalDebitHandler;

impl LedgerHandler for WithdrawalDebitHandler {
    fn postings(&self, terms: &OrderTerms) -> Result<Vec<Posting>, WalletError> {
        let gate = OrderTypePolicy::for_type(terms.order_type).balance_gate;
        Ok(vec![Posting::debit(terms.user_id, terms.amount, format!("Withdrawal: {}", terms.title), gate)])
    }
}

/// The registry of ledger handlers, keyed by order type. Registering a handler for a type replaces the existing one.
#[derive(Clone)]
pub struct LedgerHandlers {
    handlers: HashMap<OrderType, Arc<dyn LedgerHandler>>,
}

impl Debug for LedgerHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types = self.handlers.keys().map(|t| t.to_string()).collect::<Vec<_>>();
        types.sort();
        write!(f, "LedgerHandlers({})", types.join(", "))
    }
}

impl Default for LedgerHandlers {
    fn default() -> Self {
        let mut result = Self::empty();
        result
            .register(OrderType::InternalTransfer, TransferHandler)
            .register(OrderType::UserTopUp, TopUpCreditHandler)
            .register(OrderType::AdminTopUp, TopUpCreditHandler)
            .register(OrderType::UserWithdrawal, WithdrawalDebitHandler)
            .register(OrderType::AdminWithdrawal, WithdrawalDebitHandler);
        result
    }
}

impl LedgerHandlers {
    pub fn empty() -> Self {
        Self { handlers: HashMap::new() }
    }

    pub fn register<H: LedgerHandler + 'static>(&mut self, order_type: OrderType, handler: H) -> &mut Self {
        self.handlers.insert(order_type, Arc::new(handler));
        self
    }

    /// The postings for an order of these terms. An order type with no registered handler has no ledger effect.
    pub fn postings_for(&self, terms: &OrderTerms) -> Result<Vec<Posting>, WalletError> {
        match self.handlers.get(&terms.order_type) {
            Some(handler) => handler.postings(terms),
            None => Ok(vec![]),
        }
    }
}
