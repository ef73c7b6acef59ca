//! # Wallet engine public API
//!
//! The `wallet_api` module exposes the programmatic API of the wallet engine. The API is modular, so that clients can
//! pick the functionality they need.
//!
//! * [`order_flow_api`] creates orders and moves them through their lifecycle (confirm, approve, reject, deny and
//!   refund), posting the ledger effects of each transition atomically.
//! * [`ledger_api`] gives direct access to the ledger: balances, statements, and manual entries made by
//!   administrators.
//! * [`accounts_api`] manages wallet holders and top-up providers.
//!
//! The other submodules in this module are support types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the backend traits required by the API, plus the event producers for any hooks you want to run.
//!
//! ```rust,ignore
//! use wallet_engine::{events::EventProducers, LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/wallet.db", 5).await?;
//! // SqliteDatabase implements LedgerManagement
//! let api = LedgerApi::new(db, EventProducers::default());
//! let balance = api.balance(user_id).await?;
//! ```

pub mod accounts_api;
pub mod errors;
pub mod ledger_api;
pub mod ledger_objects;
pub mod order_flow_api;
pub mod order_objects;
