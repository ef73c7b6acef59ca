//! Events and event handlers.
//!
//! There are two kinds of handler. [`LedgerHandlers`] produce the ledger postings for a completing order and run inside
//! the transition's database transaction. Everything else is an observational hook ([`EventHooks`]): subscribers get
//! a copy of each event after the change has committed, and whatever they do cannot affect the ledger.
mod channel;
mod event_types;
mod hooks;
mod ledger_handlers;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
pub use ledger_handlers::{
    LedgerHandler,
    LedgerHandlers,
    OrderTerms,
    TopUpCreditHandler,
    TransferHandler,
    WithdrawalDebitHandler,
};
