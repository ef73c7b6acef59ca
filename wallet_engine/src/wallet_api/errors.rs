use thiserror::Error;

use crate::{
    db_types::{Money, OrderStatusType},
    order_machine::OrderAction,
};

/// Every failure the wallet core reports to its callers. Each variant has a distinct [`code`](WalletError::code) so
/// that the presentation layer never has to show a generic error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Invalid amount: {0}. Amounts must be positive with at most two decimal places.")]
    InvalidAmount(String),
    #[error("The amount {amount} exceeds the limit of {limit} for this kind of order.")]
    AmountLimitExceeded { amount: Money, limit: Money },
    #[error("Insufficient balance. {requested} was requested but only {available} is available.")]
    InsufficientBalance { available: Money, requested: Money },
    #[error("Cannot {action} an order with status {status}.")]
    InvalidOrderStatus { status: OrderStatusType, action: OrderAction },
    #[error("Invalid top-up provider: {0}")]
    InvalidTopUpProvider(String),
    #[error("Top-up provider '{0}' requires a payment reference.")]
    MissingProviderReference(String),
    #[error("You cannot transfer money to yourself.")]
    CannotTransferToSelf,
    #[error("A transfer needs a receiver.")]
    MissingReceiver,
    #[error("The receiver #{0} does not exist.")]
    ReceiverNotFound(i64),
    #[error("Only transfers may name a receiver.")]
    UnexpectedReceiver,
    #[error("Only top-ups may name a top-up provider.")]
    UnexpectedTopUpProvider,
    #[error("Transaction #{0} was generated by the system and cannot be modified.")]
    ForbiddenModification(i64),
    #[error("User #{0} does not exist.")]
    UserNotFound(i64),
    #[error("Order #{0} does not exist.")]
    OrderNotFound(i64),
    #[error("Transaction #{0} does not exist.")]
    TransactionNotFound(i64),
    #[error("Top-up provider code '{0}' is already in use.")]
    DuplicateProviderCode(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl WalletError {
    /// A stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::InvalidAmount(_) => "invalid_amount",
            WalletError::AmountLimitExceeded { .. } => "amount_limit_exceeded",
            WalletError::InsufficientBalance { .. } => "insufficient_balance",
            WalletError::InvalidOrderStatus { .. } => "invalid_order_status",
            WalletError::InvalidTopUpProvider(_) => "invalid_top_up_provider",
            WalletError::MissingProviderReference(_) => "missing_provider_reference",
            WalletError::CannotTransferToSelf => "cannot_transfer_to_self",
            WalletError::MissingReceiver => "missing_receiver",
            WalletError::ReceiverNotFound(_) => "receiver_not_found",
            WalletError::UnexpectedReceiver => "unexpected_receiver",
            WalletError::UnexpectedTopUpProvider => "unexpected_top_up_provider",
            WalletError::ForbiddenModification(_) => "forbidden_modification",
            WalletError::UserNotFound(_) => "user_not_found",
            WalletError::OrderNotFound(_) => "order_not_found",
            WalletError::TransactionNotFound(_) => "transaction_not_found",
            WalletError::DuplicateProviderCode(_) => "duplicate_provider_code",
            WalletError::DatabaseError(_) => "database_error",
        }
    }

    /// The input field a validation error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            WalletError::InvalidAmount(_) |
            WalletError::AmountLimitExceeded { .. } |
            WalletError::InsufficientBalance { .. } => Some("amount"),
            WalletError::InvalidOrderStatus { .. } => Some("status"),
            WalletError::InvalidTopUpProvider(_) | WalletError::UnexpectedTopUpProvider => Some("top_up_provider_id"),
            WalletError::MissingProviderReference(_) => Some("provider_reference"),
            WalletError::CannotTransferToSelf |
            WalletError::MissingReceiver |
            WalletError::ReceiverNotFound(_) |
            WalletError::UnexpectedReceiver => Some("receiver_user_id"),
            WalletError::DuplicateProviderCode(_) => Some("code"),
            WalletError::UserNotFound(_) => Some("user_id"),
            WalletError::ForbiddenModification(_) |
            WalletError::OrderNotFound(_) |
            WalletError::TransactionNotFound(_) |
            WalletError::DatabaseError(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_distinct() {
        let m = Money::from_major(1);
        let errors = vec![
            WalletError::InvalidAmount("x".into()),
            WalletError::AmountLimitExceeded { amount: m, limit: m },
            WalletError::InsufficientBalance { available: m, requested: m },
            WalletError::InvalidOrderStatus { status: OrderStatusType::Cancelled, action: OrderAction::Confirm },
            WalletError::InvalidTopUpProvider("x".into()),
            WalletError::MissingProviderReference("x".into()),
            WalletError::CannotTransferToSelf,
            WalletError::MissingReceiver,
            WalletError::ReceiverNotFound(1),
            WalletError::UnexpectedReceiver,
            WalletError::UnexpectedTopUpProvider,
            WalletError::ForbiddenModification(1),
            WalletError::UserNotFound(1),
            WalletError::OrderNotFound(1),
            WalletError::TransactionNotFound(1),
            WalletError::DuplicateProviderCode("x".into()),
            WalletError::DatabaseError("x".into()),
        ];
        let codes = errors.iter().map(|e| e.code()).collect::<HashSet<_>>();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn messages_are_readable() {
        let e = WalletError::InvalidOrderStatus { status: OrderStatusType::Cancelled, action: OrderAction::Confirm };
        assert_eq!(e.to_string(), "Cannot confirm an order with status cancelled.");
        assert_eq!(e.field(), Some("status"));
    }
}
