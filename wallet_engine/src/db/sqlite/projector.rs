//! The balance projector.
//!
//! `users.wallet_amount` is a cache of the ledger sum. [`project_balance`] is the only code that writes it, and every
//! ledger write calls it for the affected owner before its database transaction commits.
use log::*;
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::users::all_user_ids, traits::BalanceDiscrepancy},
    db_types::Money,
    wallet_api::errors::WalletError,
};

/// The sum of the user's active signed entries.
pub async fn compute_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Money, WalletError> {
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE user_id = $1 AND status = 'active'",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(Money::from(sum))
}

/// Recomputes the user's balance from the ledger and stores it in the cache. Returns the new balance.
pub async fn project_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Money, WalletError> {
    let balance = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE users SET wallet_amount = (
            SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE user_id = $1 AND status = 'active'
        ), updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING wallet_amount"#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or(WalletError::UserNotFound(user_id))?;
    let balance = Money::from(balance);
    trace!("🧮️ Balance for user #{user_id} projected at {balance}");
    Ok(balance)
}

async fn cached_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Money>, WalletError> {
    let cached = sqlx::query_scalar::<_, i64>("SELECT wallet_amount FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(cached.map(Money::from))
}

/// Compares every user's cache against the ledger.
pub async fn audit_balances(conn: &mut SqliteConnection) -> Result<Vec<BalanceDiscrepancy>, WalletError> {
    let mut result = vec![];
    for user_id in all_user_ids(&mut *conn).await? {
        let Some(cached) = cached_balance(user_id, &mut *conn).await? else { continue };
        let derived = compute_balance(user_id, &mut *conn).await?;
        if cached != derived {
            error!("🧮️ Balance cache for user #{user_id} is {cached}, but the ledger sums to {derived}");
            result.push(BalanceDiscrepancy { user_id, cached, derived });
        }
    }
    debug!("🧮️ Balance audit complete. {} discrepancies found", result.len());
    Ok(result)
}
