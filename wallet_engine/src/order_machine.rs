//! # Order state machine
//!
//! Orders move through the following states. `Completed`, `Cancelled` and `Refunded` are terminal, with the single
//! exception of the `Completed → Refunded` edge.
//!
//! ```text
//!   PendingPayment ──confirm──────────┐
//!        │                            ▼
//!        └──reject──► Cancelled    Completed ──refund──► Refunded
//!        ┌──reject/deny──┘            ▲
//!   PendingApproval ──confirm/approve─┘
//! ```
//!
//! [`plan_transition`] is the single entry point. It takes the current order and an [`OrderAction`] and returns a
//! [`TransitionPlan`] describing the next status, the ledger effect to apply inside the same database transaction,
//! and the events to publish once the transition has committed. It performs no I/O, so an invalid transition is
//! rejected before anything is touched.
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Money, Order, OrderStatusType, TransactionType},
    events::LedgerHandlers,
    policies::{is_withdrawal, BalanceGate},
    wallet_api::errors::WalletError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Payment (or the payer) confirms a pending order.
    Confirm,
    /// An administrator approves an order awaiting approval.
    Approve,
    /// The order is turned down while pending.
    Reject,
    /// An administrator turns down an order awaiting approval.
    Deny,
    /// A completed order is reversed.
    Refund,
    /// A terminal order is hidden from default listings. This is not a status transition.
    Archive,
}

impl Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderAction::Confirm => write!(f, "confirm"),
            OrderAction::Approve => write!(f, "approve"),
            OrderAction::Reject => write!(f, "reject"),
            OrderAction::Deny => write!(f, "deny"),
            OrderAction::Refund => write!(f, "refund"),
            OrderAction::Archive => write!(f, "archive"),
        }
    }
}

impl FromStr for OrderAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirm" => Ok(Self::Confirm),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "deny" => Ok(Self::Deny),
            "refund" => Ok(Self::Refund),
            "archive" => Ok(Self::Archive),
            s => Err(format!("Unknown order action '{s}'")),
        }
    }
}

/// The transition table. Returns `None` for every (status, action) pair that is not allowed.
pub fn next_status(current: OrderStatusType, action: OrderAction) -> Option<OrderStatusType> {
    use OrderAction::*;
    use OrderStatusType::*;
    match (current, action) {
        (PendingPayment | PendingApproval, Confirm) => Some(Completed),
        (PendingApproval, Approve) => Some(Completed),
        (PendingPayment | PendingApproval, Reject) => Some(Cancelled),
        (PendingApproval, Deny) => Some(Cancelled),
        (Completed, Refund) => Some(Refunded),
        _ => None,
    }
}

/// A single ledger entry to be written as part of a transition (or, for admin top-ups, of order creation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub user_id: i64,
    pub transaction_type: TransactionType,
    /// The unsigned magnitude. The stored sign follows `transaction_type`.
    pub amount: Money,
    pub description: String,
    pub gate: BalanceGate,
}

impl Posting {
    pub fn credit<S: Into<String>>(user_id: i64, amount: Money, description: S) -> Self {
        Self {
            user_id,
            transaction_type: TransactionType::Credit,
            amount,
            description: description.into(),
            gate: BalanceGate::Enforce,
        }
    }

    pub fn debit<S: Into<String>>(user_id: i64, amount: Money, description: S, gate: BalanceGate) -> Self {
        Self { user_id, transaction_type: TransactionType::Debit, amount, description: description.into(), gate }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEffect {
    None,
    /// Write these entries, in order, linked to the order.
    Post(Vec<Posting>),
    /// Cancel every active entry linked to the order.
    CancelLinked,
}

/// Events a transition produces. They are turned into full event payloads after commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    StatusChanged,
    OrderCancelled,
    WithdrawalApproved,
    WithdrawalDenied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub order_id: i64,
    pub action: OrderAction,
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    /// True only on the first entry into `Completed`.
    pub stamp_completion: bool,
    /// The replacement description, when the transition annotates the order.
    pub description: Option<String>,
    pub ledger: LedgerEffect,
    pub events: Vec<TransitionEvent>,
}

/// Works out what applying `action` to `order` entails, without doing any of it.
pub fn plan_transition(
    order: &Order,
    action: OrderAction,
    reason: Option<&str>,
    handlers: &LedgerHandlers,
) -> Result<TransitionPlan, WalletError> {
    let invalid = || WalletError::InvalidOrderStatus { status: order.status, action };
    if order.deleted_at.is_some() {
        return Err(invalid());
    }
    let to = next_status(order.status, action).ok_or_else(invalid)?;
    let withdrawal = is_withdrawal(order.order_type);
    let mut events = vec![TransitionEvent::StatusChanged];
    let (ledger, stamp_completion) = match to {
        OrderStatusType::Completed => {
            if withdrawal {
                events.push(TransitionEvent::WithdrawalApproved);
            }
            let postings = handlers.postings_for(&order.into())?;
            (LedgerEffect::Post(postings), order.payment_completion_date.is_none())
        },
        OrderStatusType::Cancelled => {
            events.push(TransitionEvent::OrderCancelled);
            if withdrawal && action == OrderAction::Deny {
                events.push(TransitionEvent::WithdrawalDenied);
            }
            (LedgerEffect::CancelLinked, false)
        },
        OrderStatusType::Refunded => (LedgerEffect::CancelLinked, false),
        OrderStatusType::PendingPayment | OrderStatusType::PendingApproval => (LedgerEffect::None, false),
    };
    let description = annotation(action, reason).map(|note| match order.description.as_deref() {
        Some(existing) if !existing.trim().is_empty() => format!("{existing}\n{note}"),
        _ => note,
    });
    Ok(TransitionPlan {
        order_id: order.id,
        action,
        from: order.status,
        to,
        stamp_completion,
        description,
        ledger,
        events,
    })
}

fn annotation(action: OrderAction, reason: Option<&str>) -> Option<String> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty())?;
    let label = match action {
        OrderAction::Deny => "Denied",
        OrderAction::Reject => "Rejected",
        OrderAction::Refund => "Refunded",
        OrderAction::Confirm | OrderAction::Approve | OrderAction::Archive => return None,
    };
    Some(format!("{label}: {reason}"))
}
