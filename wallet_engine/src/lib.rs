//! Wallet Engine
//!
//! The wallet engine is the ledger core of a merchant wallet. Users hold a balance, move money between each other, top
//! up through external providers and request withdrawals that an administrator approves.
//!
//! A user's balance is never a mutable value of record. It is derived from an append-only set of signed ledger entries
//! ([`db_types::Transaction`]), and the `wallet_amount` stored against each user is a cache that the balance projector
//! keeps in step inside every ledger write.
//!
//! The library is divided into the following sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly. Instead, use the public API provided by the engine. The exception is the data types used
//!    in the database. These are defined in the `db_types` module and are public.
//! 2. The order lifecycle: the per-type rules in [`policies`] and the transition table in [`order_machine`]. Both are
//!    pure, so every rule is checked before anything is written.
//! 3. The public API ([`mod@wallet_api`]). Specific backends need to implement the traits in [`mod@db`] in order to act
//!    as a backend for the API.
//!
//! The engine also provides a set of events that can be subscribed to ([`events`]). These events are emitted after
//! a change has committed. For example, when a transfer is confirmed, an `OrderStatusChanged` event is emitted along
//! with a `MoneyWithdrawn` event for the sender and a `MoneyAdded` event for the receiver.
mod db;

pub mod config;
pub mod db_types;
pub mod events;
pub mod order_machine;
pub mod policies;
pub mod wallet_api;

pub use config::WalletConfig;
#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{
    AccountManagement,
    BalanceDiscrepancy,
    CancelOutcome,
    LedgerChange,
    LedgerManagement,
    OrderCreationResult,
    OrderManagement,
    TransitionResult,
};
pub use wallet_api::{
    accounts_api::AccountApi,
    errors::WalletError,
    ledger_api::LedgerApi,
    ledger_objects,
    order_flow_api::OrderFlowApi,
    order_objects,
};
