use serde::{Deserialize, Serialize};

use crate::{
    db_types::{ActorId, Money, Order, Transaction},
    order_machine::OrderAction,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub actor: Option<ActorId>,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, actor: Option<ActorId>) -> Self {
        Self { order, actor }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_order: Order,
    pub new_order: Order,
    pub action: OrderAction,
    pub actor: Option<ActorId>,
}

impl OrderStatusChangedEvent {
    pub fn new(old_order: Order, new_order: Order, action: OrderAction, actor: Option<ActorId>) -> Self {
        Self { old_order, new_order, action, actor }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub reason: Option<String>,
}

/// A credit was written. `balance` is the owner's balance immediately after the entry was projected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAddedEvent {
    pub transaction: Transaction,
    pub balance: Money,
}

/// A debit was written. `balance` is the owner's balance immediately after the entry was projected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyWithdrawnEvent {
    pub transaction: Transaction,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCancelledEvent {
    pub old_transaction: Transaction,
    pub new_transaction: Transaction,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequestedEvent {
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalApprovedEvent {
    pub order: Order,
    pub actor: Option<ActorId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalDeniedEvent {
    pub order: Order,
    pub reason: Option<String>,
    pub actor: Option<ActorId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OrderCancelled(OrderCancelledEvent),
    MoneyAdded(MoneyAddedEvent),
    MoneyWithdrawn(MoneyWithdrawnEvent),
    TransactionCancelled(TransactionCancelledEvent),
    WithdrawalRequested(WithdrawalRequestedEvent),
    WithdrawalApproved(WithdrawalApprovedEvent),
    WithdrawalDenied(WithdrawalDeniedEvent),
}

impl EventType {
    pub fn name(&self) -> &'static str {
        match self {
            EventType::OrderCreated(_) => "order_created",
            EventType::OrderStatusChanged(_) => "order_status_changed",
            EventType::OrderCancelled(_) => "order_cancelled",
            EventType::MoneyAdded(_) => "money_added",
            EventType::MoneyWithdrawn(_) => "money_withdrawn",
            EventType::TransactionCancelled(_) => "transaction_cancelled",
            EventType::WithdrawalRequested(_) => "withdrawal_requested",
            EventType::WithdrawalApproved(_) => "withdrawal_approved",
            EventType::WithdrawalDenied(_) => "withdrawal_denied",
        }
    }
}
