use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
pub use wallet_common::Money;

use crate::{order_machine::Posting, policies::BalanceGate};

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {0}: {1}")]
pub struct ConversionError(&'static str, String);

//--------------------------------------       ActorId        ---------------------------------------------------------
/// The opaque identity of an authenticated actor, as supplied by the (external) authentication layer. It is recorded
/// against manually created ledger entries for audit purposes. System-generated entries carry no actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ActorId(pub i64);

impl Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

impl From<i64> for ActorId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

//--------------------------------------         User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    /// The cached balance. This is a projection of the ledger and is never authoritative.
    pub wallet_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Option<String>,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), email: None }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }
}

//--------------------------------------    TopUpProvider     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TopUpProvider {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    /// When true, top-ups through this provider must quote the provider's own reference for the payment.
    pub requires_reference: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTopUpProvider {
    pub name: String,
    pub code: String,
    pub requires_reference: bool,
}

impl NewTopUpProvider {
    pub fn new<S: Into<String>>(name: S, code: S) -> Self {
        Self { name: name.into(), code: code.into(), requires_reference: false }
    }

    pub fn requiring_reference(mut self) -> Self {
        self.requires_reference = true;
        self
    }
}

//--------------------------------------      OrderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    InternalTransfer,
    UserTopUp,
    AdminTopUp,
    UserWithdrawal,
    AdminWithdrawal,
}

impl OrderType {
    pub const ALL: [OrderType; 5] = [
        OrderType::InternalTransfer,
        OrderType::UserTopUp,
        OrderType::AdminTopUp,
        OrderType::UserWithdrawal,
        OrderType::AdminWithdrawal,
    ];

    pub fn default_title(&self) -> &'static str {
        match self {
            OrderType::InternalTransfer => "Transfer",
            OrderType::UserTopUp => "Top-up",
            OrderType::AdminTopUp => "Top-up by administrator",
            OrderType::UserWithdrawal => "Withdrawal",
            OrderType::AdminWithdrawal => "Withdrawal by administrator",
        }
    }
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::InternalTransfer => write!(f, "internal_transfer"),
            OrderType::UserTopUp => write!(f, "user_top_up"),
            OrderType::AdminTopUp => write!(f, "admin_top_up"),
            OrderType::UserWithdrawal => write!(f, "user_withdrawal"),
            OrderType::AdminWithdrawal => write!(f, "admin_withdrawal"),
        }
    }
}

impl FromStr for OrderType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal_transfer" => Ok(Self::InternalTransfer),
            "user_top_up" => Ok(Self::UserTopUp),
            "admin_top_up" => Ok(Self::AdminTopUp),
            "user_withdrawal" => Ok(Self::UserWithdrawal),
            "admin_withdrawal" => Ok(Self::AdminWithdrawal),
            s => Err(ConversionError("order type", s.to_string())),
        }
    }
}

//--------------------------------------   OrderStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// Waiting for the payer (or payment provider) to confirm.
    PendingPayment,
    /// Waiting for an administrator to approve or deny.
    PendingApproval,
    /// Ledger effects have been posted.
    Completed,
    /// Rejected or denied before completion.
    Cancelled,
    /// Completed, then reversed. Every ledger entry for the order is cancelled.
    Refunded,
}

impl OrderStatusType {
    pub fn is_pending(&self) -> bool {
        matches!(self, OrderStatusType::PendingPayment | OrderStatusType::PendingApproval)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::PendingPayment => write!(f, "pending_payment"),
            OrderStatusType::PendingApproval => write!(f, "pending_approval"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
            OrderStatusType::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_payment" => Ok(Self::PendingPayment),
            "pending_approval" => Ok(Self::PendingApproval),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError("order status", s.to_string())),
        }
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub title: String,
    pub amount: Money,
    pub status: OrderStatusType,
    pub order_type: OrderType,
    /// The owner of the order. For transfers, this is the sender.
    pub user_id: i64,
    pub receiver_user_id: Option<i64>,
    pub top_up_provider_id: Option<i64>,
    pub provider_reference: Option<String>,
    pub description: Option<String>,
    /// Set exactly once, the first time the order enters `Completed`.
    pub payment_completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
/// A validated command to create an order. Shape checks happen upstream; business rules are applied by the order flow
/// API before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub title: String,
    pub amount: Money,
    pub order_type: OrderType,
    pub user_id: i64,
    pub receiver_user_id: Option<i64>,
    pub top_up_provider_id: Option<i64>,
    pub provider_reference: Option<String>,
    pub description: Option<String>,
}

impl NewOrder {
    pub fn new(order_type: OrderType, user_id: i64, amount: Money) -> Self {
        Self {
            title: order_type.default_title().to_string(),
            amount,
            order_type,
            user_id,
            receiver_user_id: None,
            top_up_provider_id: None,
            provider_reference: None,
            description: None,
        }
    }

    pub fn transfer(sender: i64, receiver: i64, amount: Money) -> Self {
        Self::new(OrderType::InternalTransfer, sender, amount).with_receiver(receiver)
    }

    pub fn top_up(user_id: i64, amount: Money, provider_id: i64) -> Self {
        Self::new(OrderType::UserTopUp, user_id, amount).with_provider(provider_id)
    }

    pub fn admin_top_up(user_id: i64, amount: Money, provider_id: i64) -> Self {
        Self::new(OrderType::AdminTopUp, user_id, amount).with_provider(provider_id)
    }

    pub fn withdrawal(user_id: i64, amount: Money) -> Self {
        Self::new(OrderType::UserWithdrawal, user_id, amount)
    }

    pub fn admin_withdrawal(user_id: i64, amount: Money) -> Self {
        Self::new(OrderType::AdminWithdrawal, user_id, amount)
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_receiver(mut self, receiver: i64) -> Self {
        self.receiver_user_id = Some(receiver);
        self
    }

    pub fn with_provider(mut self, provider_id: i64) -> Self {
        self.top_up_provider_id = Some(provider_id);
        self
    }

    pub fn with_provider_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.provider_reference = Some(reference.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

//-----------------------------------------   TransactionType  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    /// Applies the sign convention for this entry type to an unsigned magnitude.
    pub fn signed(&self, magnitude: Money) -> Money {
        match self {
            TransactionType::Credit => magnitude.abs(),
            TransactionType::Debit => -magnitude.abs(),
        }
    }

    /// Returns true if the stored (signed) amount agrees with this type.
    pub fn matches_sign(&self, amount: Money) -> bool {
        match self {
            TransactionType::Credit => amount.is_positive(),
            TransactionType::Debit => amount.is_negative(),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Credit => write!(f, "credit"),
            TransactionType::Debit => write!(f, "debit"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            s => Err(ConversionError("transaction type", s.to_string())),
        }
    }
}

//-----------------------------------------  TransactionStatus ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Active,
    Cancelled,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Active => write!(f, "active"),
            TransactionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError("transaction status", s.to_string())),
        }
    }
}

//-----------------------------------------     Transaction    ---------------------------------------------------------
/// A signed ledger entry. Credits are stored positive and debits negative.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub status: TransactionStatus,
    pub description: Option<String>,
    /// `None` for entries generated by the system as a side effect of an order.
    pub created_by: Option<ActorId>,
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Manual entries are those not produced by an order transition. Only these may be edited or deleted.
    pub fn is_manual(&self) -> bool {
        self.order_id.is_none()
    }

    pub fn magnitude(&self) -> Money {
        self.amount.abs()
    }
}

//-----------------------------------------   NewTransaction   ---------------------------------------------------------
/// A ledger entry to be written. The amount is the unsigned magnitude; the stored sign follows `transaction_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: i64,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub description: Option<String>,
    pub created_by: Option<ActorId>,
    pub order_id: Option<i64>,
    pub gate: BalanceGate,
}

impl NewTransaction {
    pub fn credit(user_id: i64, amount: Money) -> Self {
        Self {
            user_id,
            transaction_type: TransactionType::Credit,
            amount,
            description: None,
            created_by: None,
            order_id: None,
            gate: BalanceGate::Enforce,
        }
    }

    pub fn debit(user_id: i64, amount: Money) -> Self {
        Self { transaction_type: TransactionType::Debit, ..Self::credit(user_id, amount) }
    }

    /// Builds the entry for a posting made on behalf of `order_id`. Such entries are system generated.
    pub fn from_posting(posting: Posting, order_id: i64) -> Self {
        Self {
            user_id: posting.user_id,
            transaction_type: posting.transaction_type,
            amount: posting.amount,
            description: Some(posting.description),
            created_by: None,
            order_id: Some(order_id),
            gate: posting.gate,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn created_by(mut self, actor: ActorId) -> Self {
        self.created_by = Some(actor);
        self
    }

    pub fn for_order(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_gate(mut self, gate: BalanceGate) -> Self {
        self.gate = gate;
        self
    }

    /// The signed amount as it will be stored.
    pub fn signed_amount(&self) -> Money {
        self.transaction_type.signed(self.amount)
    }
}

//-----------------------------------------  TransactionUpdate ---------------------------------------------------------
/// The fields of a manual ledger entry that may be changed after creation.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub transaction_type: Option<TransactionType>,
    /// The new magnitude. The stored sign is derived from the (new or existing) entry type.
    pub amount: Option<Money>,
    pub description: Option<String>,
}

impl TransactionUpdate {
    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_type.is_none() && self.amount.is_none() && self.description.is_none()
    }
}
