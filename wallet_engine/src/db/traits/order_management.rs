use crate::{
    db::traits::{OrderCreationResult, TransitionResult},
    db_types::{NewOrder, Order, OrderStatusType, Transaction},
    order_machine::{Posting, TransitionPlan},
    policies::ReversalPolicy,
    wallet_api::{errors::WalletError, order_objects::OrderQueryFilter},
};

/// The `OrderManagement` trait defines the storage side of the order lifecycle.
///
/// Deciding *what* a transition does is the job of [`crate::order_machine::plan_transition`]. Backends only carry
/// the plan out, atomically.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a validated order with the given initial status and, in the same database transaction, writes any
    /// postings that take effect at creation. The postings are linked to the new order. The owner and receiver are
    /// checked again under the lock, so a user removed since validation fails with `UserNotFound` or `ReceiverNotFound`.
    async fn insert_order(
        &self,
        order: NewOrder,
        status: OrderStatusType,
        postings: Vec<Posting>,
    ) -> Result<OrderCreationResult, WalletError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, WalletError>;

    /// Orders matching the filter, oldest first.
    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, WalletError>;

    async fn transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, WalletError>;

    /// Applies a transition plan to `order`.
    ///
    /// The status update is conditional on the order still having the status the plan was computed from. If another
    /// transition got there first, this fails with `InvalidOrderStatus` and nothing is written. Ledger effects,
    /// balance projection and the status change commit together or not at all.
    async fn apply_transition(
        &self,
        order: &Order,
        plan: &TransitionPlan,
        policy: ReversalPolicy,
    ) -> Result<TransitionResult, WalletError>;

    /// Soft-deletes a terminal order. Pending orders fail with `InvalidOrderStatus`.
    async fn archive_order(&self, order_id: i64) -> Result<Order, WalletError>;
}
