//! # Database management and control.
//!
//! This module defines the interface contracts of the wallet engine's database *backends*.
//!
//! ## Ledger
//! A user's balance is never stored as a value of record. It is the sum of the user's active, signed ledger entries.
//! The `wallet_amount` column on the user is a cache kept in step by the balance projector, which every ledger write
//! calls before it commits.
//!
//! ## Traits
//! * [`LedgerManagement`] provides the ledger primitives: posting, cancelling and editing entries, and computing
//!   balances.
//! * [`OrderManagement`] stores orders and applies transition plans atomically.
//! * [`AccountManagement`] manages wallet holders and top-up providers.
mod account_management;
mod ledger_management;
mod order_management;

mod data_objects;

pub use account_management::AccountManagement;
pub use data_objects::{BalanceDiscrepancy, CancelOutcome, LedgerChange, OrderCreationResult, TransitionResult};
pub use ledger_management::LedgerManagement;
pub use order_management::OrderManagement;
