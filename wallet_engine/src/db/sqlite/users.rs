use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    wallet_api::errors::WalletError,
};

const USER_COLUMNS: &str = "id, name, email, wallet_amount, created_at, updated_at, deleted_at";

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, WalletError> {
    let sql = format!("INSERT INTO users (name, email) VALUES ($1, $2) RETURNING {USER_COLUMNS}");
    let user = sqlx::query_as::<_, User>(&sql).bind(user.name).bind(user.email).fetch_one(conn).await?;
    debug!("🗃️ User #{} ({}) created", user.id, user.name);
    Ok(user)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, WalletError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql).bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn deactivate_user(user_id: i64, conn: &mut SqliteConnection) -> Result<User, WalletError> {
    let sql = format!(
        "UPDATE users SET deleted_at = COALESCE(deleted_at, CURRENT_TIMESTAMP), updated_at = CURRENT_TIMESTAMP WHERE \
         id = $1 RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or(WalletError::UserNotFound(user_id))?;
    info!("🗃️ User #{user_id} has been deactivated");
    Ok(user)
}

/// Takes the write lock for the given users by touching their rows. This MUST be the first statement in any
/// transaction that reads a balance it is about to act on.
///
/// Ids are locked in ascending order and duplicates are ignored, so two transactions locking the same pair of users
/// always do so in the same order. Fails with `UserNotFound` for the first id that has no row.
pub async fn lock_users(user_ids: &[i64], conn: &mut SqliteConnection) -> Result<(), WalletError> {
    let mut ids = user_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    for id in ids {
        let result = sqlx::query("UPDATE users SET updated_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(WalletError::UserNotFound(id));
        }
        trace!("🗃️ Lock taken for user #{id}");
    }
    Ok(())
}

/// True if the user exists and has not been removed. Call it after [`lock_users`] so the answer holds until commit.
pub async fn is_active(user_id: i64, conn: &mut SqliteConnection) -> Result<bool, WalletError> {
    let active = sqlx::query_scalar::<_, bool>("SELECT deleted_at IS NULL FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .unwrap_or(false);
    Ok(active)
}

pub async fn all_user_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, WalletError> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM users ORDER BY id").fetch_all(conn).await?;
    Ok(ids)
}

/// Takes the write lock for the owner of a ledger entry, for when only the entry id is known. Returns the owner's id,
/// or `TransactionNotFound` if there is no such entry.
pub async fn lock_transaction_owner(transaction_id: i64, conn: &mut SqliteConnection) -> Result<i64, WalletError> {
    let owner = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET updated_at = CURRENT_TIMESTAMP WHERE id = (SELECT user_id FROM transactions WHERE id = $1) \
         RETURNING id",
    )
    .bind(transaction_id)
    .fetch_optional(conn)
    .await?
    .ok_or(WalletError::TransactionNotFound(transaction_id))?;
    trace!("🗃️ Lock taken for user #{owner}, the owner of transaction #{transaction_id}");
    Ok(owner)
}
