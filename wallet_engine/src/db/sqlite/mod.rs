//! SQLite backend.
//!
//! The pool runs in WAL mode with a busy timeout. Every ledger-affecting unit of work opens a deferred transaction
//! whose *first* statement is a write to the affected user rows (see [`users::lock_users`]). That write takes the
//! database write lock, waiting out the busy timeout if another writer holds it, so the balance read that follows
//! can never be stale.
mod db;
mod errors;

pub mod ledger;
pub mod orders;
pub mod projector;
pub mod providers;
pub mod transactions;
pub mod users;

use std::{str::FromStr, time::Duration};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| SqliteDatabaseError::InvalidUrl(format!("{url}: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    debug!("🗃️ Opening SQLite pool at {url} with up to {max_connections} connections");
    let pool = SqlitePoolOptions::new().max_connections(max_connections.max(1)).connect_with(options).await?;
    Ok(pool)
}
