use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{ledger, new_pool, orders, projector, providers, transactions, users, SqliteDatabaseError};
use crate::{
    db::traits::{
        AccountManagement,
        BalanceDiscrepancy,
        CancelOutcome,
        LedgerChange,
        LedgerManagement,
        OrderCreationResult,
        OrderManagement,
        TransitionResult,
    },
    db_types::{
        Money,
        NewOrder,
        NewTopUpProvider,
        NewTransaction,
        NewUser,
        Order,
        OrderStatusType,
        TopUpProvider,
        Transaction,
        TransactionUpdate,
        User,
    },
    order_machine::{LedgerEffect, Posting, TransitionPlan},
    policies::ReversalPolicy,
    wallet_api::{errors::WalletError, ledger_objects::TransactionQueryFilter, order_objects::OrderQueryFilter},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Created new SQLite pool for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl AccountManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, WalletError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }

    async fn deactivate_user(&self, user_id: i64) -> Result<User, WalletError> {
        let mut conn = self.pool.acquire().await?;
        users::deactivate_user(user_id, &mut conn).await
    }

    async fn create_top_up_provider(&self, provider: NewTopUpProvider) -> Result<TopUpProvider, WalletError> {
        let mut conn = self.pool.acquire().await?;
        providers::insert_provider(provider, &mut conn).await
    }

    async fn fetch_top_up_provider(&self, provider_id: i64) -> Result<Option<TopUpProvider>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        providers::fetch_provider(provider_id, &mut conn).await
    }

    async fn fetch_provider_by_code(&self, code: &str) -> Result<Option<TopUpProvider>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        providers::fetch_provider_by_code(code, &mut conn).await
    }

    async fn set_provider_active(&self, provider_id: i64, active: bool) -> Result<TopUpProvider, WalletError> {
        let mut conn = self.pool.acquire().await?;
        providers::set_active(provider_id, active, &mut conn).await
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn post_transaction(&self, entry: NewTransaction) -> Result<LedgerChange, WalletError> {
        let mut tx = self.pool.begin().await?;
        users::lock_users(&[entry.user_id], &mut tx).await?;
        let change = ledger::post(entry, &mut tx).await?;
        tx.commit().await?;
        Ok(change)
    }

    async fn cancel_transaction(
        &self,
        transaction_id: i64,
        policy: ReversalPolicy,
    ) -> Result<CancelOutcome, WalletError> {
        let mut tx = self.pool.begin().await?;
        users::lock_transaction_owner(transaction_id, &mut tx).await?;
        let outcome = ledger::cancel(transaction_id, policy, &mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn compute_balance(&self, user_id: i64) -> Result<Money, WalletError> {
        let mut conn = self.pool.acquire().await?;
        if users::fetch_user(user_id, &mut conn).await?.is_none() {
            return Err(WalletError::UserNotFound(user_id));
        }
        projector::compute_balance(user_id, &mut conn).await
    }

    async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction(transaction_id, &mut conn).await
    }

    async fn search_transactions(&self, filter: TransactionQueryFilter) -> Result<Vec<Transaction>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transactions(filter, &mut conn).await
    }

    async fn update_manual_transaction(
        &self,
        transaction_id: i64,
        update: TransactionUpdate,
        policy: ReversalPolicy,
    ) -> Result<LedgerChange, WalletError> {
        let mut tx = self.pool.begin().await?;
        users::lock_transaction_owner(transaction_id, &mut tx).await?;
        let change = ledger::update_manual(transaction_id, update, policy, &mut tx).await?;
        tx.commit().await?;
        Ok(change)
    }

    async fn delete_manual_transaction(
        &self,
        transaction_id: i64,
        policy: ReversalPolicy,
    ) -> Result<LedgerChange, WalletError> {
        let mut tx = self.pool.begin().await?;
        users::lock_transaction_owner(transaction_id, &mut tx).await?;
        let change = ledger::delete_manual(transaction_id, policy, &mut tx).await?;
        tx.commit().await?;
        Ok(change)
    }

    async fn rebuild_balance(&self, user_id: i64) -> Result<Money, WalletError> {
        let mut tx = self.pool.begin().await?;
        users::lock_users(&[user_id], &mut tx).await?;
        let balance = projector::project_balance(user_id, &mut tx).await?;
        tx.commit().await?;
        info!("🧮️ Balance for user #{user_id} rebuilt from the ledger: {balance}");
        Ok(balance)
    }

    async fn audit_balances(&self) -> Result<Vec<BalanceDiscrepancy>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        projector::audit_balances(&mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(
        &self,
        order: NewOrder,
        status: OrderStatusType,
        postings: Vec<Posting>,
    ) -> Result<OrderCreationResult, WalletError> {
        let mut tx = self.pool.begin().await?;
        let mut parties = vec![order.user_id];
        parties.extend(order.receiver_user_id);
        parties.extend(postings.iter().map(|p| p.user_id));
        users::lock_users(&parties, &mut tx).await?;
        if !users::is_active(order.user_id, &mut tx).await? {
            return Err(WalletError::UserNotFound(order.user_id));
        }
        if let Some(receiver_id) = order.receiver_user_id {
            if !users::is_active(receiver_id, &mut tx).await? {
                return Err(WalletError::ReceiverNotFound(receiver_id));
            }
        }
        let order = orders::insert_order(order, status, &mut tx).await?;
        let mut posted = Vec::with_capacity(postings.len());
        for posting in postings {
            let change = ledger::post(NewTransaction::from_posting(posting, order.id), &mut tx).await?;
            posted.push(change);
        }
        tx.commit().await?;
        Ok(OrderCreationResult { order, posted })
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(filter, &mut conn).await
    }

    async fn transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, WalletError> {
        let mut conn = self.pool.acquire().await?;
        transactions::transactions_for_order(order_id, &mut conn).await
    }

    async fn apply_transition(
        &self,
        order: &Order,
        plan: &TransitionPlan,
        policy: ReversalPolicy,
    ) -> Result<TransitionResult, WalletError> {
        let mut tx = self.pool.begin().await?;
        let mut parties = vec![order.user_id];
        parties.extend(order.receiver_user_id);
        if let LedgerEffect::Post(postings) = &plan.ledger {
            parties.extend(postings.iter().map(|p| p.user_id));
        }
        users::lock_users(&parties, &mut tx).await?;
        let updated = orders::apply_status_change(plan, &mut tx).await?;
        let mut posted = vec![];
        let mut cancelled = vec![];
        match &plan.ledger {
            LedgerEffect::None => {},
            LedgerEffect::Post(postings) => {
                for posting in postings {
                    let entry = NewTransaction::from_posting(posting.clone(), order.id);
                    posted.push(ledger::post(entry, &mut tx).await?);
                }
            },
            LedgerEffect::CancelLinked => {
                cancelled = ledger::cancel_linked(order.id, policy, &mut tx).await?;
            },
        }
        tx.commit().await?;
        debug!(
            "🗃️ Transition of order #{} to {} committed. {} entries posted, {} cancelled",
            order.id,
            updated.status,
            posted.len(),
            cancelled.len()
        );
        Ok(TransitionResult { old_order: order.clone(), order: updated, posted, cancelled })
    }

    async fn archive_order(&self, order_id: i64) -> Result<Order, WalletError> {
        let mut conn = self.pool.acquire().await?;
        orders::archive_order(order_id, &mut conn).await
    }
}
