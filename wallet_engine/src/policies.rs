//! Order type policies.
//!
//! Every rule that depends on the kind of order lives in a single lookup table, [`OrderTypePolicy::for_type`].
//! The validation helpers in this module are pure: the caller fetches whatever records are needed (receiver, provider,
//! current balance) and hands them in, so the checks can run before anything is written.
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Money, NewOrder, OrderStatusType, OrderType, TopUpProvider, User},
    wallet_api::errors::WalletError,
};

/// Which configured maximum applies to an order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeilingCategory {
    Transfer,
    TopUp,
}

/// Whether a debit must be covered by the user's current balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceGate {
    Enforce,
    /// Administrator corrections may take a balance below zero.
    Bypass,
}

/// What to do when cancelling or editing a ledger entry would leave the owner with a negative derived balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReversalPolicy {
    /// The reversal goes ahead and a warning is logged.
    #[default]
    AllowNegative,
    /// The reversal fails with `InsufficientBalance` and nothing is written.
    RejectNegative,
}

impl Display for ReversalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReversalPolicy::AllowNegative => write!(f, "allow_negative"),
            ReversalPolicy::RejectNegative => write!(f, "reject_negative"),
        }
    }
}

impl FromStr for ReversalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow_negative" | "allow" => Ok(Self::AllowNegative),
            "reject_negative" | "reject" => Ok(Self::RejectNegative),
            _ => Err(format!("Unknown reversal policy '{s}'.")),
        }
    }
}

/// The configured amount ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountLimits {
    pub max_transfer: Money,
    pub max_top_up: Money,
}

impl Default for AmountLimits {
    fn default() -> Self {
        Self { max_transfer: Money::from_major(10_000), max_top_up: Money::from_major(50_000) }
    }
}

impl AmountLimits {
    pub fn ceiling(&self, category: CeilingCategory) -> Money {
        match category {
            CeilingCategory::Transfer => self.max_transfer,
            CeilingCategory::TopUp => self.max_top_up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTypePolicy {
    pub requires_receiver: bool,
    pub requires_approval: bool,
    pub is_top_up: bool,
    pub is_withdrawal: bool,
    pub initial_status: OrderStatusType,
    pub ceiling: CeilingCategory,
    /// Applied to the debit posted when the order completes, and to the balance pre-check at creation.
    pub balance_gate: BalanceGate,
}

impl OrderTypePolicy {
    pub const fn for_type(order_type: OrderType) -> Self {
        use BalanceGate::*;
        use CeilingCategory::*;
        use OrderStatusType::*;
        match order_type {
            OrderType::InternalTransfer => Self {
                requires_receiver: true,
                requires_approval: false,
                is_top_up: false,
                is_withdrawal: false,
                initial_status: PendingPayment,
                ceiling: Transfer,
                balance_gate: Enforce,
            },
            OrderType::UserTopUp => Self {
                requires_receiver: false,
                requires_approval: false,
                is_top_up: true,
                is_withdrawal: false,
                initial_status: PendingPayment,
                ceiling: TopUp,
                balance_gate: Enforce,
            },
            OrderType::AdminTopUp => Self {
                requires_receiver: false,
                requires_approval: false,
                is_top_up: true,
                is_withdrawal: false,
                initial_status: Completed,
                ceiling: TopUp,
                balance_gate: Enforce,
            },
            OrderType::UserWithdrawal => Self {
                requires_receiver: false,
                requires_approval: true,
                is_top_up: false,
                is_withdrawal: true,
                initial_status: PendingApproval,
                ceiling: Transfer,
                balance_gate: Enforce,
            },
            OrderType::AdminWithdrawal => Self {
                requires_receiver: false,
                requires_approval: true,
                is_top_up: false,
                is_withdrawal: true,
                initial_status: PendingApproval,
                ceiling: Transfer,
                balance_gate: Bypass,
            },
        }
    }
}

pub fn requires_receiver(order_type: OrderType) -> bool {
    OrderTypePolicy::for_type(order_type).requires_receiver
}

pub fn requires_approval(order_type: OrderType) -> bool {
    OrderTypePolicy::for_type(order_type).requires_approval
}

pub fn is_top_up(order_type: OrderType) -> bool {
    OrderTypePolicy::for_type(order_type).is_top_up
}

pub fn is_withdrawal(order_type: OrderType) -> bool {
    OrderTypePolicy::for_type(order_type).is_withdrawal
}

/// Checks that `amount` is positive and does not exceed the ceiling for `order_type`.
pub fn validate_amount(order_type: OrderType, amount: Money, limits: &AmountLimits) -> Result<(), WalletError> {
    if !amount.is_positive() {
        return Err(WalletError::InvalidAmount(amount.to_string()));
    }
    let limit = limits.ceiling(OrderTypePolicy::for_type(order_type).ceiling);
    if amount > limit {
        return Err(WalletError::AmountLimitExceeded { amount, limit });
    }
    Ok(())
}

/// Checks the presence of the fields whose requirement depends only on the order type. This runs before any lookups.
pub fn validate_shape(order: &NewOrder) -> Result<(), WalletError> {
    let policy = OrderTypePolicy::for_type(order.order_type);
    match (policy.requires_receiver, order.receiver_user_id) {
        (true, None) => return Err(WalletError::MissingReceiver),
        (true, Some(r)) if r == order.user_id => return Err(WalletError::CannotTransferToSelf),
        (false, Some(_)) => return Err(WalletError::UnexpectedReceiver),
        _ => {},
    }
    match (policy.is_top_up, order.top_up_provider_id) {
        (true, None) => Err(WalletError::InvalidTopUpProvider("no provider was given".into())),
        (false, Some(_)) => Err(WalletError::UnexpectedTopUpProvider),
        _ => Ok(()),
    }
}

/// Validates the looked-up receiver of a transfer.
pub fn validate_receiver(sender_id: i64, receiver_id: i64, receiver: Option<&User>) -> Result<(), WalletError> {
    if sender_id == receiver_id {
        return Err(WalletError::CannotTransferToSelf);
    }
    match receiver {
        Some(u) if u.is_active() => Ok(()),
        _ => Err(WalletError::ReceiverNotFound(receiver_id)),
    }
}

/// Validates the looked-up provider of a top-up and the reference supplied with the order.
pub fn validate_provider(
    provider_id: i64,
    provider: Option<&TopUpProvider>,
    reference: Option<&str>,
) -> Result<(), WalletError> {
    let provider = match provider {
        Some(p) if p.is_active => p,
        Some(p) => return Err(WalletError::InvalidTopUpProvider(format!("provider '{}' is not active", p.code))),
        None => return Err(WalletError::InvalidTopUpProvider(format!("provider #{provider_id} does not exist"))),
    };
    let has_reference = reference.map(|r| !r.trim().is_empty()).unwrap_or(false);
    if provider.requires_reference && !has_reference {
        return Err(WalletError::MissingProviderReference(provider.code.clone()));
    }
    Ok(())
}

/// The creation-time balance pre-check. It only applies to withdrawals whose gate is enforced; admin withdrawals skip
/// it. The authoritative check happens again, atomically, when the debit is posted.
pub fn validate_withdrawal_balance(order_type: OrderType, amount: Money, balance: Money) -> Result<(), WalletError> {
    let policy = OrderTypePolicy::for_type(order_type);
    if policy.is_withdrawal && policy.balance_gate == BalanceGate::Enforce && balance < amount {
        return Err(WalletError::InsufficientBalance { available: balance, requested: amount });
    }
    Ok(())
}
