//! Row-level access to the `transactions` table. None of these functions touch the cached balance; callers in
//! [`super::ledger`] are responsible for locking and projecting.
use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, NewTransaction, Transaction, TransactionStatus, TransactionType},
    wallet_api::{errors::WalletError, ledger_objects::TransactionQueryFilter},
};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, type, amount, status, description, created_by, order_id, created_at, updated_at";

pub async fn insert_transaction(entry: &NewTransaction, conn: &mut SqliteConnection) -> Result<Transaction, WalletError> {
    let sql = format!(
        "INSERT INTO transactions (user_id, type, amount, status, description, created_by, order_id) VALUES ($1, $2, \
         $3, $4, $5, $6, $7) RETURNING {TRANSACTION_COLUMNS}"
    );
    let transaction = sqlx::query_as::<_, Transaction>(&sql)
        .bind(entry.user_id)
        .bind(entry.transaction_type)
        .bind(entry.signed_amount())
        .bind(TransactionStatus::Active)
        .bind(entry.description.as_deref())
        .bind(entry.created_by)
        .bind(entry.order_id)
        .fetch_one(conn)
        .await?;
    trace!(
        "🗃️ Transaction #{} inserted: {} of {} for user #{}",
        transaction.id,
        transaction.transaction_type,
        transaction.amount,
        transaction.user_id
    );
    Ok(transaction)
}

pub async fn fetch_transaction(
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, WalletError> {
    let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1");
    let transaction = sqlx::query_as::<_, Transaction>(&sql).bind(transaction_id).fetch_optional(conn).await?;
    Ok(transaction)
}

/// Fetches transactions according to criteria specified in the `TransactionQueryFilter`.
///
/// Resulting transactions are ordered by `id` in ascending order.
pub async fn fetch_transactions(
    query: TransactionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, WalletError> {
    let mut builder = QueryBuilder::new(format!("SELECT {TRANSACTION_COLUMNS} FROM transactions "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(transaction_type) = query.transaction_type {
        where_clause.push("type = ");
        where_clause.push_bind_unseparated(transaction_type);
    }
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    match query.manual {
        Some(true) => {
            where_clause.push("order_id IS NULL");
        },
        Some(false) => {
            where_clause.push("order_id IS NOT NULL");
        },
        None => {},
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY id ASC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let transactions = builder.build_query_as::<Transaction>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_transactions: {}", transactions.len());
    Ok(transactions)
}

pub async fn transactions_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Transaction>, WalletError> {
    fetch_transactions(TransactionQueryFilter::default().with_order_id(order_id), conn).await
}

pub async fn active_transactions_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, WalletError> {
    fetch_transactions(TransactionQueryFilter::default().with_order_id(order_id).active(), conn).await
}

/// Flips an active entry to cancelled. Returns `None` if the entry was not active.
pub async fn mark_cancelled(transaction_id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, WalletError> {
    let sql = format!(
        "UPDATE transactions SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING \
         {TRANSACTION_COLUMNS}"
    );
    let transaction = sqlx::query_as::<_, Transaction>(&sql)
        .bind(TransactionStatus::Cancelled)
        .bind(transaction_id)
        .bind(TransactionStatus::Active)
        .fetch_optional(conn)
        .await?;
    Ok(transaction)
}

pub async fn rewrite_transaction(
    transaction_id: i64,
    transaction_type: TransactionType,
    signed_amount: Money,
    description: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Transaction, WalletError> {
    let sql = format!(
        "UPDATE transactions SET type = $1, amount = $2, description = $3, updated_at = CURRENT_TIMESTAMP WHERE id = \
         $4 RETURNING {TRANSACTION_COLUMNS}"
    );
    let transaction = sqlx::query_as::<_, Transaction>(&sql)
        .bind(transaction_type)
        .bind(signed_amount)
        .bind(description)
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?
        .ok_or(WalletError::TransactionNotFound(transaction_id))?;
    Ok(transaction)
}

pub async fn delete_transaction(transaction_id: i64, conn: &mut SqliteConnection) -> Result<(), WalletError> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = $1").bind(transaction_id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(WalletError::TransactionNotFound(transaction_id));
    }
    Ok(())
}
