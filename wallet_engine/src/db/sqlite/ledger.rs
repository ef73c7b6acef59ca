//! Ledger primitives that run on a connection the caller has already locked (see [`super::users::lock_users`]).
//! Each one finishes by projecting the owner's balance, so once the caller commits, the cache agrees with the ledger.
use log::*;
use sqlx::SqliteConnection;

use crate::{
    db::{
        sqlite::{projector, transactions},
        traits::{CancelOutcome, LedgerChange},
    },
    db_types::{Money, NewTransaction, Transaction, TransactionUpdate},
    policies::{BalanceGate, ReversalPolicy},
    wallet_api::errors::WalletError,
};

/// Writes a new active entry and projects the owner's balance.
pub async fn post(entry: NewTransaction, conn: &mut SqliteConnection) -> Result<LedgerChange, WalletError> {
    if !entry.amount.is_positive() {
        return Err(WalletError::InvalidAmount(entry.amount.to_string()));
    }
    if entry.signed_amount().is_negative() && entry.gate == BalanceGate::Enforce {
        let available = projector::compute_balance(entry.user_id, &mut *conn).await?;
        if available < entry.amount {
            debug!(
                "💰️ Debit of {} for user #{} refused. Only {available} is available.",
                entry.amount, entry.user_id
            );
            return Err(WalletError::InsufficientBalance { available, requested: entry.amount });
        }
    }
    let transaction = transactions::insert_transaction(&entry, &mut *conn).await?;
    let balance = projector::project_balance(entry.user_id, &mut *conn).await?;
    debug!(
        "💰️ {} of {} posted for user #{} as transaction #{}. Balance is now {balance}",
        transaction.transaction_type, entry.amount, entry.user_id, transaction.id
    );
    Ok(LedgerChange::created(transaction, balance))
}

/// Cancels a standalone entry and projects the owner's balance. An entry that is already cancelled is left alone.
///
/// Entries that belong to an order are refused with `ForbiddenModification`. They are only ever reversed together,
/// by rejecting, denying or refunding the order.
pub async fn cancel(
    transaction_id: i64,
    policy: ReversalPolicy,
    conn: &mut SqliteConnection,
) -> Result<CancelOutcome, WalletError> {
    let old = transactions::fetch_transaction(transaction_id, &mut *conn)
        .await?
        .ok_or(WalletError::TransactionNotFound(transaction_id))?;
    ensure_manual(&old)?;
    cancel_entry(old, policy, conn).await
}

/// Cancels every active entry linked to the order, in id order. Returns the entries that were cancelled.
pub async fn cancel_linked(
    order_id: i64,
    policy: ReversalPolicy,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerChange>, WalletError> {
    let linked = transactions::active_transactions_for_order(order_id, &mut *conn).await?;
    let mut result = Vec::with_capacity(linked.len());
    for entry in linked {
        if let CancelOutcome::Cancelled(change) = cancel_entry(entry, policy, &mut *conn).await? {
            result.push(change);
        }
    }
    trace!("💰️ {} entries linked to order #{order_id} cancelled", result.len());
    Ok(result)
}

async fn cancel_entry(
    old: Transaction,
    policy: ReversalPolicy,
    conn: &mut SqliteConnection,
) -> Result<CancelOutcome, WalletError> {
    let transaction_id = old.id;
    if !old.is_active() {
        debug!("💰️ Transaction #{transaction_id} is already cancelled. Nothing to do.");
        return Ok(CancelOutcome::AlreadyCancelled(old));
    }
    let before = projector::compute_balance(old.user_id, &mut *conn).await?;
    let Some(cancelled) = transactions::mark_cancelled(transaction_id, &mut *conn).await? else {
        return Ok(CancelOutcome::AlreadyCancelled(old));
    };
    let balance = projector::project_balance(old.user_id, &mut *conn).await?;
    check_reversal(old.user_id, before, balance, policy)?;
    debug!("💰️ Transaction #{transaction_id} cancelled. Balance for user #{} is now {balance}", old.user_id);
    Ok(CancelOutcome::Cancelled(LedgerChange::changed(old, cancelled, balance)))
}

fn ensure_manual(transaction: &Transaction) -> Result<(), WalletError> {
    if transaction.is_manual() {
        Ok(())
    } else {
        warn!(
            "💰️ Attempt to modify transaction #{}, which belongs to order #{}, was refused",
            transaction.id,
            transaction.order_id.unwrap_or_default()
        );
        Err(WalletError::ForbiddenModification(transaction.id))
    }
}

/// Rewrites an active manual entry and projects the owner's balance.
pub async fn update_manual(
    transaction_id: i64,
    update: TransactionUpdate,
    policy: ReversalPolicy,
    conn: &mut SqliteConnection,
) -> Result<LedgerChange, WalletError> {
    let old = transactions::fetch_transaction(transaction_id, &mut *conn)
        .await?
        .ok_or(WalletError::TransactionNotFound(transaction_id))?;
    ensure_manual(&old)?;
    if !old.is_active() {
        return Err(WalletError::ForbiddenModification(transaction_id));
    }
    if update.is_empty() {
        let balance = projector::compute_balance(old.user_id, &mut *conn).await?;
        return Ok(LedgerChange::changed(old.clone(), old, balance));
    }
    let transaction_type = update.transaction_type.unwrap_or(old.transaction_type);
    let magnitude = update.amount.unwrap_or_else(|| old.magnitude());
    if !magnitude.is_positive() {
        return Err(WalletError::InvalidAmount(magnitude.to_string()));
    }
    let description = update.description.or_else(|| old.description.clone());
    let before = projector::compute_balance(old.user_id, &mut *conn).await?;
    let new_amount = transaction_type.signed(magnitude);
    check_edit(old.user_id, before, new_amount - old.amount)?;
    let new = transactions::rewrite_transaction(
        transaction_id,
        transaction_type,
        new_amount,
        description.as_deref(),
        &mut *conn,
    )
    .await?;
    let balance = projector::project_balance(old.user_id, &mut *conn).await?;
    check_reversal(old.user_id, before, balance, policy)?;
    debug!("💰️ Manual transaction #{transaction_id} changed from {} to {}", old.amount, new.amount);
    Ok(LedgerChange::changed(old, new, balance))
}

/// Deletes a manual entry and projects the owner's balance.
pub async fn delete_manual(
    transaction_id: i64,
    policy: ReversalPolicy,
    conn: &mut SqliteConnection,
) -> Result<LedgerChange, WalletError> {
    let old = transactions::fetch_transaction(transaction_id, &mut *conn)
        .await?
        .ok_or(WalletError::TransactionNotFound(transaction_id))?;
    ensure_manual(&old)?;
    let before = projector::compute_balance(old.user_id, &mut *conn).await?;
    transactions::delete_transaction(transaction_id, &mut *conn).await?;
    let balance = projector::project_balance(old.user_id, &mut *conn).await?;
    check_reversal(old.user_id, before, balance, policy)?;
    info!("💰️ Manual transaction #{transaction_id} of {} for user #{} deleted", old.amount, old.user_id);
    Ok(LedgerChange::changed(old.clone(), old, balance))
}

/// Edits that lower the balance are gated like new debits: the result may not be negative.
fn check_edit(user_id: i64, before: Money, change: Money) -> Result<(), WalletError> {
    if !change.is_negative() || !(before + change).is_negative() {
        return Ok(());
    }
    debug!("💰️ Edit of a manual entry for user #{user_id} refused. Only {before} is available.");
    Err(WalletError::InsufficientBalance { available: before, requested: -change })
}

/// Applies the reversal policy to a change that took the balance from `before` to `after`.
fn check_reversal(user_id: i64, before: Money, after: Money, policy: ReversalPolicy) -> Result<(), WalletError> {
    if !after.is_negative() || after >= before {
        return Ok(());
    }
    match policy {
        ReversalPolicy::AllowNegative => {
            warn!("💰️ Reversal leaves user #{user_id} with a negative balance of {after}");
            Ok(())
        },
        ReversalPolicy::RejectNegative => {
            info!("💰️ Reversal refused. It would leave user #{user_id} with a balance of {after}");
            Err(WalletError::InsufficientBalance { available: before, requested: before - after })
        },
    }
}
