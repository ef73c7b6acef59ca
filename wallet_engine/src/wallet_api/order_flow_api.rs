use std::fmt::Debug;

use log::*;

use crate::{
    config::WalletConfig,
    db::traits::{AccountManagement, LedgerManagement, OrderManagement, TransitionResult},
    db_types::{ActorId, NewOrder, Order, Transaction},
    events::{
        EventProducers,
        LedgerHandlers,
        OrderCancelledEvent,
        OrderCreatedEvent,
        OrderStatusChangedEvent,
        WithdrawalApprovedEvent,
        WithdrawalDeniedEvent,
        WithdrawalRequestedEvent,
    },
    order_machine::{plan_transition, OrderAction, TransitionEvent},
    policies::{
        validate_amount,
        validate_provider,
        validate_receiver,
        validate_shape,
        validate_withdrawal_balance,
        AmountLimits,
        OrderTypePolicy,
        ReversalPolicy,
    },
    wallet_api::{
        errors::WalletError,
        ledger_api::{publish_cancelled, publish_posted},
        order_objects::{OrderQueryFilter, OrderResult},
    },
};

/// `OrderFlowApi` is the primary API for creating orders and moving them through their lifecycle.
///
/// Every business rule is checked before anything is written. Ledger effects are produced by the registered
/// [`LedgerHandlers`] and committed in the same database transaction as the status change. Observational events are
/// published only after that transaction has committed.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    handlers: LedgerHandlers,
    limits: AmountLimits,
    policy: ReversalPolicy,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?}, {:?}, {})", self.handlers, self.limits, self.policy)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self {
            db,
            producers,
            handlers: LedgerHandlers::default(),
            limits: AmountLimits::default(),
            policy: ReversalPolicy::default(),
        }
    }

    pub fn with_limits(mut self, limits: AmountLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_reversal_policy(mut self, policy: ReversalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Applies the limits and reversal policy from the configuration.
    pub fn with_config(self, config: &WalletConfig) -> Self {
        self.with_limits(config.limits).with_reversal_policy(config.reversal_policy)
    }

    pub fn with_ledger_handlers(mut self, handlers: LedgerHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn limits(&self) -> &AmountLimits {
        &self.limits
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + AccountManagement + LedgerManagement
{
    /// Validates and stores a new order.
    ///
    /// Most orders start out pending. Admin top-ups are the exception: they are created `Completed`, with the credit
    /// posted in the same database transaction, and no status-changed event is ever published for them.
    pub async fn create_order(&self, actor: Option<ActorId>, order: NewOrder) -> Result<Order, WalletError> {
        let order = self.validate_new_order(order).await?;
        let policy = OrderTypePolicy::for_type(order.order_type);
        let postings = if policy.initial_status.is_terminal() {
            self.handlers.postings_for(&(&order).into())?
        } else {
            vec![]
        };
        let result = self.db.insert_order(order, policy.initial_status, postings).await?;
        let order = result.order;
        info!(
            "📦️ Order #{} ({}) of {} created for user #{} with status {}",
            order.id, order.order_type, order.amount, order.user_id, order.status
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone(), actor)).await;
        if policy.is_withdrawal {
            self.producers.publish_withdrawal_requested(WithdrawalRequestedEvent { order: order.clone() }).await;
        }
        for change in result.posted {
            publish_posted(&self.producers, change).await;
        }
        Ok(order)
    }

    async fn validate_new_order(&self, mut order: NewOrder) -> Result<NewOrder, WalletError> {
        validate_shape(&order)?;
        validate_amount(order.order_type, order.amount, &self.limits)?;
        match self.db.fetch_user(order.user_id).await? {
            Some(owner) if owner.is_active() => {},
            _ => return Err(WalletError::UserNotFound(order.user_id)),
        }
        if let Some(receiver_id) = order.receiver_user_id {
            let receiver = self.db.fetch_user(receiver_id).await?;
            validate_receiver(order.user_id, receiver_id, receiver.as_ref())?;
        }
        if let Some(provider_id) = order.top_up_provider_id {
            let provider = self.db.fetch_top_up_provider(provider_id).await?;
            validate_provider(provider_id, provider.as_ref(), order.provider_reference.as_deref())?;
        }
        if OrderTypePolicy::for_type(order.order_type).is_withdrawal {
            let balance = self.db.compute_balance(order.user_id).await?;
            validate_withdrawal_balance(order.order_type, order.amount, balance)?;
        }
        if order.title.trim().is_empty() {
            order.title = order.order_type.default_title().to_string();
        }
        Ok(order)
    }

    /// Applies `action` to the order.
    ///
    /// Invalid (status, action) pairs fail with `InvalidOrderStatus` and change nothing. If posting the ledger effect
    /// fails, the order keeps its previous status.
    pub async fn transition_order(
        &self,
        order_id: i64,
        action: OrderAction,
        actor: Option<ActorId>,
        reason: Option<&str>,
    ) -> Result<Order, WalletError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(WalletError::OrderNotFound(order_id))?;
        let plan = plan_transition(&order, action, reason, &self.handlers).map_err(|e| {
            debug!("📦️ Order #{order_id} cannot be sent the {action} action. {e}");
            e
        })?;
        let result = self.db.apply_transition(&order, &plan, self.policy).await?;
        info!("📦️ Order #{order_id} {} → {} ({action})", plan.from, result.order.status);
        let updated = result.order.clone();
        self.publish_transition(result, &plan.events, action, actor, reason).await;
        Ok(updated)
    }

    async fn publish_transition(
        &self,
        result: TransitionResult,
        events: &[TransitionEvent],
        action: OrderAction,
        actor: Option<ActorId>,
        reason: Option<&str>,
    ) {
        let TransitionResult { old_order, order, posted, cancelled } = result;
        for change in posted {
            publish_posted(&self.producers, change).await;
        }
        for change in cancelled {
            publish_cancelled(&self.producers, change).await;
        }
        let reason = reason.map(str::trim).filter(|r| !r.is_empty()).map(String::from);
        for event in events {
            match event {
                TransitionEvent::StatusChanged => {
                    let ev = OrderStatusChangedEvent::new(old_order.clone(), order.clone(), action, actor);
                    self.producers.publish_order_status_changed(ev).await;
                },
                TransitionEvent::OrderCancelled => {
                    let ev = OrderCancelledEvent { order: order.clone(), reason: reason.clone() };
                    self.producers.publish_order_cancelled(ev).await;
                },
                TransitionEvent::WithdrawalApproved => {
                    let ev = WithdrawalApprovedEvent { order: order.clone(), actor };
                    self.producers.publish_withdrawal_approved(ev).await;
                },
                TransitionEvent::WithdrawalDenied => {
                    let ev = WithdrawalDeniedEvent { order: order.clone(), reason: reason.clone(), actor };
                    self.producers.publish_withdrawal_denied(ev).await;
                },
            }
        }
    }

    pub async fn confirm(&self, order_id: i64, actor: Option<ActorId>) -> Result<Order, WalletError> {
        self.transition_order(order_id, OrderAction::Confirm, actor, None).await
    }

    pub async fn approve(&self, order_id: i64, actor: Option<ActorId>) -> Result<Order, WalletError> {
        self.transition_order(order_id, OrderAction::Approve, actor, None).await
    }

    pub async fn reject(&self, order_id: i64, actor: Option<ActorId>, reason: Option<&str>) -> Result<Order, WalletError> {
        self.transition_order(order_id, OrderAction::Reject, actor, reason).await
    }

    pub async fn deny(&self, order_id: i64, actor: Option<ActorId>, reason: Option<&str>) -> Result<Order, WalletError> {
        self.transition_order(order_id, OrderAction::Deny, actor, reason).await
    }

    pub async fn refund(&self, order_id: i64, actor: Option<ActorId>, reason: Option<&str>) -> Result<Order, WalletError> {
        self.transition_order(order_id, OrderAction::Refund, actor, reason).await
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, WalletError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn search_orders(&self, filter: OrderQueryFilter) -> Result<OrderResult, WalletError> {
        trace!("📦️ Searching orders. {filter}");
        let orders = self.db.search_orders(filter).await?;
        Ok(orders.into())
    }

    /// Every ledger entry linked to the order, cancelled ones included.
    pub async fn transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, WalletError> {
        if self.db.fetch_order(order_id).await?.is_none() {
            return Err(WalletError::OrderNotFound(order_id));
        }
        self.db.transactions_for_order(order_id).await
    }

    /// Hides a terminal order from default searches. Its ledger entries are untouched.
    pub async fn archive_order(&self, order_id: i64, actor: Option<ActorId>) -> Result<Order, WalletError> {
        let order = self.db.archive_order(order_id).await?;
        match actor {
            Some(actor) => info!("📦️ Order #{order_id} archived by {actor}"),
            None => info!("📦️ Order #{order_id} archived"),
        }
        Ok(order)
    }
}
