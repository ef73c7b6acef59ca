use wallet_engine::{
    db_types::{Money, NewOrder, TransactionStatus, TransactionType, TransactionUpdate},
    ledger_objects::{ManualEntry, TransactionQueryFilter},
    policies::ReversalPolicy,
    WalletError,
};

use crate::support::wallet::{money, TestWallet, ADMIN};

mod support;

#[tokio::test]
async fn credit_sets_balance() {
    let wallet = TestWallet::new().await;
    let alice = wallet.user("alice").await;
    assert_eq!(wallet.balance(alice.id).await, Money::zero());
    let tx = wallet.ledger.credit(alice.id, money("100"), "Opening balance", None).await.unwrap();
    assert_eq!(tx.transaction_type, TransactionType::Credit);
    assert_eq!(tx.amount, money("100.00"));
    assert_eq!(tx.status, TransactionStatus::Active);
    assert_eq!(tx.created_by, None);
    assert_eq!(wallet.balance(alice.id).await.to_string(), "100.00");
    assert_eq!(wallet.cached_balance(alice.id).await, money("100"));
    wallet.finish().await;
}

#[tokio::test]
async fn debit_beyond_balance_fails_and_writes_nothing() {
    let wallet = TestWallet::new().await;
    let alice = wallet.funded_user("alice", money("100")).await;
    let err = wallet.ledger.debit(alice.id, money("150"), "Too much", None).await.unwrap_err();
    assert_eq!(err, WalletError::InsufficientBalance { available: money("100"), requested: money("150") });
    assert_eq!(wallet.balance(alice.id).await, money("100"));
    let entries = wallet.ledger.list_transactions(TransactionQueryFilter::for_user(alice.id)).await.unwrap();
    assert_eq!(entries.len(), 1);
    wallet.finish().await;
}

#[tokio::test]
async fn debits_are_stored_negative() {
    let wallet = TestWallet::new().await;
    let alice = wallet.funded_user("alice", money("100")).await;
    let tx = wallet.ledger.debit(alice.id, money("30.25"), "Coffee beans", None).await.unwrap();
    assert_eq!(tx.transaction_type, TransactionType::Debit);
    assert_eq!(tx.amount, money("-30.25"));
    assert_eq!(tx.magnitude(), money("30.25"));
    assert!(wallet.ledger.has_sufficient_balance(alice.id, money("69.75")).await.unwrap());
    assert!(!wallet.ledger.has_sufficient_balance(alice.id, money("69.76")).await.unwrap());
    let statement = wallet.ledger.statement(alice.id).await.unwrap();
    assert_eq!(statement.balance, money("69.75"));
    assert!(statement.transactions.iter().all(|t| t.transaction_type.matches_sign(t.amount)));
    wallet.finish().await;
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let wallet = TestWallet::new().await;
    let alice = wallet.user("alice").await;
    let err = wallet.ledger.credit(alice.id, Money::zero(), "Nothing", None).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount(_)));
    let err = wallet.ledger.debit(alice.id, money("-5"), "Negative", None).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount(_)));
    wallet.finish().await;
}

#[tokio::test]
async fn unknown_users_are_reported() {
    let wallet = TestWallet::new().await;
    let err = wallet.ledger.credit(404, money("1"), "Nobody", None).await.unwrap_err();
    assert_eq!(err, WalletError::UserNotFound(404));
    assert_eq!(wallet.ledger.balance(404).await.unwrap_err(), WalletError::UserNotFound(404));
    wallet.finish().await;
}

#[tokio::test]
async fn cancelling_twice_changes_nothing_further() {
    let wallet = TestWallet::new().await;
    let alice = wallet.funded_user("alice", money("100")).await;
    let debit = wallet.ledger.debit(alice.id, money("40"), "Groceries", None).await.unwrap();
    assert_eq!(wallet.balance(alice.id).await, money("60"));
    let cancelled = wallet.ledger.cancel_transaction(debit.id).await.unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
    assert_eq!(wallet.balance(alice.id).await, money("100"));
    let again = wallet.ledger.cancel_transaction(debit.id).await.unwrap();
    assert_eq!(again.status, TransactionStatus::Cancelled);
    assert_eq!(wallet.balance(alice.id).await, money("100"));
    assert_eq!(wallet.cached_balance(alice.id).await, money("100"));
    let err = wallet.ledger.cancel_transaction(9999).await.unwrap_err();
    assert_eq!(err, WalletError::TransactionNotFound(9999));
    wallet.finish().await;
}

#[tokio::test]
async fn cancelled_entries_are_kept_but_not_counted() {
    let wallet = TestWallet::new().await;
    let alice = wallet.user("alice").await;
    let credit = wallet.ledger.credit(alice.id, money("25"), "Gift", None).await.unwrap();
    wallet.ledger.credit(alice.id, money("10"), "Gift", None).await.unwrap();
    wallet.ledger.cancel_transaction(credit.id).await.unwrap();
    let all = wallet.ledger.list_transactions(TransactionQueryFilter::for_user(alice.id)).await.unwrap();
    assert_eq!(all.len(), 2);
    let active = wallet.ledger.list_transactions(TransactionQueryFilter::for_user(alice.id).active()).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(wallet.balance(alice.id).await, money("10"));
    wallet.finish().await;
}

#[tokio::test]
async fn manual_entries_record_the_actor() {
    let wallet = TestWallet::new().await;
    let alice = wallet.funded_user("alice", money("20")).await;
    let entry = ManualEntry::credit(alice.id, money("5")).with_description("Goodwill");
    let tx = wallet.ledger.create_manual_transaction(ADMIN, entry).await.unwrap();
    assert_eq!(tx.created_by, Some(ADMIN));
    assert!(tx.is_manual());
    assert_eq!(wallet.balance(alice.id).await, money("25"));
    let err = wallet.ledger.create_manual_transaction(ADMIN, ManualEntry::debit(alice.id, money("26"))).await.unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance { .. }));
    let manual = wallet.ledger.list_transactions(TransactionQueryFilter::for_user(alice.id).manual_only()).await.unwrap();
    assert_eq!(manual.len(), 2);
    wallet.finish().await;
}

#[tokio::test]
async fn manual_edits_reproject_the_balance() {
    let wallet = TestWallet::new().await;
    let alice = wallet.funded_user("alice", money("200")).await;
    let tx = wallet.ledger.create_manual_transaction(ADMIN, ManualEntry::credit(alice.id, money("50"))).await.unwrap();
    let update = TransactionUpdate::default().with_amount(money("75")).with_description("Corrected");
    let edited = wallet.ledger.update_manual_transaction(ADMIN, tx.id, update).await.unwrap();
    assert_eq!(edited.amount, money("75"));
    assert_eq!(edited.description.as_deref(), Some("Corrected"));
    assert_eq!(wallet.cached_balance(alice.id).await, money("275"));
    let update = TransactionUpdate::default().with_type(TransactionType::Debit);
    let flipped = wallet.ledger.update_manual_transaction(ADMIN, tx.id, update).await.unwrap();
    assert_eq!(flipped.amount, money("-75"));
    assert_eq!(wallet.balance(alice.id).await, money("125"));
    let deleted = wallet.ledger.delete_manual_transaction(ADMIN, tx.id).await.unwrap();
    assert_eq!(deleted.id, tx.id);
    assert_eq!(wallet.balance(alice.id).await, money("200"));
    assert_eq!(wallet.ledger.fetch_transaction(tx.id).await.unwrap(), None);
    wallet.finish().await;
}

#[tokio::test]
async fn order_entries_cannot_be_modified() {
    let wallet = TestWallet::new().await;
    let alice = wallet.user("alice").await;
    let card = wallet.provider("card", false).await;
    let order = wallet.orders.create_order(Some(ADMIN), NewOrder::admin_top_up(alice.id, money("30"), card.id)).await.unwrap();
    let entries = wallet.orders.transactions_for_order(order.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    let id = entries[0].id;
    let update = TransactionUpdate::default().with_amount(money("300"));
    let err = wallet.ledger.update_manual_transaction(ADMIN, id, update).await.unwrap_err();
    assert_eq!(err, WalletError::ForbiddenModification(id));
    let err = wallet.ledger.delete_manual_transaction(ADMIN, id).await.unwrap_err();
    assert_eq!(err, WalletError::ForbiddenModification(id));
    let err = wallet.ledger.cancel_transaction(id).await.unwrap_err();
    assert_eq!(err, WalletError::ForbiddenModification(id));
    assert!(wallet.ledger.fetch_transaction(id).await.unwrap().unwrap().is_active());
    assert_eq!(wallet.balance(alice.id).await, money("30"));
    wallet.finish().await;
}

#[tokio::test]
async fn transfer_legs_cannot_be_cancelled_one_at_a_time() {
    let wallet = TestWallet::new().await;
    let alice = wallet.funded_user("alice", money("50")).await;
    let bob = wallet.user("bob").await;
    let order = wallet.orders.create_order(None, NewOrder::transfer(alice.id, bob.id, money("20"))).await.unwrap();
    wallet.orders.confirm(order.id, None).await.unwrap();
    let legs = wallet.orders.transactions_for_order(order.id).await.unwrap();
    assert_eq!(legs.len(), 2);
    for leg in &legs {
        let err = wallet.ledger.cancel_transaction(leg.id).await.unwrap_err();
        assert_eq!(err, WalletError::ForbiddenModification(leg.id));
    }
    assert_eq!(wallet.balance(alice.id).await, money("30"));
    assert_eq!(wallet.balance(bob.id).await, money("20"));
    wallet.orders.refund(order.id, Some(ADMIN), None).await.unwrap();
    assert_eq!(wallet.balance(alice.id).await, money("50"));
    assert_eq!(wallet.balance(bob.id).await, Money::zero());
    let err = wallet.ledger.cancel_transaction(legs[0].id).await.unwrap_err();
    assert_eq!(err, WalletError::ForbiddenModification(legs[0].id));
    wallet.finish().await;
}

#[tokio::test]
async fn manual_edits_cannot_overdraw() {
    let wallet = TestWallet::new().await;
    let alice = wallet.funded_user("alice", money("100")).await;
    let tx = wallet.ledger.create_manual_transaction(ADMIN, ManualEntry::debit(alice.id, money("10"))).await.unwrap();
    assert_eq!(wallet.balance(alice.id).await, money("90"));
    let update = TransactionUpdate::default().with_amount(money("500"));
    let err = wallet.ledger.update_manual_transaction(ADMIN, tx.id, update).await.unwrap_err();
    assert_eq!(err, WalletError::InsufficientBalance { available: money("90"), requested: money("490") });
    let unchanged = wallet.ledger.fetch_transaction(tx.id).await.unwrap().unwrap();
    assert_eq!(unchanged.amount, money("-10"));
    let update = TransactionUpdate::default().with_amount(money("100"));
    let edited = wallet.ledger.update_manual_transaction(ADMIN, tx.id, update).await.unwrap();
    assert_eq!(edited.amount, money("-100"));
    assert_eq!(wallet.balance(alice.id).await, Money::zero());
    let credit = wallet.ledger.create_manual_transaction(ADMIN, ManualEntry::credit(alice.id, money("5"))).await.unwrap();
    let update = TransactionUpdate::default().with_type(TransactionType::Debit);
    let err = wallet.ledger.update_manual_transaction(ADMIN, credit.id, update).await.unwrap_err();
    assert_eq!(err, WalletError::InsufficientBalance { available: money("5"), requested: money("10") });
    assert_eq!(wallet.cached_balance(alice.id).await, money("5"));
    wallet.finish().await;
}

#[tokio::test]
async fn cancelled_manual_entries_cannot_be_edited() {
    let wallet = TestWallet::new().await;
    let alice = wallet.user("alice").await;
    let tx = wallet.ledger.create_manual_transaction(ADMIN, ManualEntry::credit(alice.id, money("5"))).await.unwrap();
    wallet.ledger.cancel_transaction(tx.id).await.unwrap();
    let update = TransactionUpdate::default().with_amount(money("6"));
    let err = wallet.ledger.update_manual_transaction(ADMIN, tx.id, update).await.unwrap_err();
    assert_eq!(err, WalletError::ForbiddenModification(tx.id));
    wallet.finish().await;
}

#[tokio::test]
async fn reversals_may_go_negative_by_default() {
    let wallet = TestWallet::new().await;
    let alice = wallet.user("alice").await;
    let credit = wallet.ledger.credit(alice.id, money("100"), "Deposit", None).await.unwrap();
    wallet.ledger.debit(alice.id, money("80"), "Spent", None).await.unwrap();
    wallet.ledger.cancel_transaction(credit.id).await.unwrap();
    assert_eq!(wallet.balance(alice.id).await, money("-80"));
    assert_eq!(wallet.cached_balance(alice.id).await, money("-80"));
    wallet.finish().await;
}

#[tokio::test]
async fn strict_reversal_policy_rolls_back() {
    let wallet = TestWallet::with_policy(ReversalPolicy::RejectNegative).await;
    let alice = wallet.user("alice").await;
    let credit = wallet.ledger.credit(alice.id, money("100"), "Deposit", None).await.unwrap();
    wallet.ledger.debit(alice.id, money("80"), "Spent", None).await.unwrap();
    let err = wallet.ledger.cancel_transaction(credit.id).await.unwrap_err();
    assert_eq!(err, WalletError::InsufficientBalance { available: money("20"), requested: money("100") });
    let credit = wallet.ledger.fetch_transaction(credit.id).await.unwrap().unwrap();
    assert!(credit.is_active());
    assert_eq!(wallet.balance(alice.id).await, money("20"));
    assert_eq!(wallet.cached_balance(alice.id).await, money("20"));
    wallet.finish().await;
}

#[tokio::test]
async fn projection_can_be_rebuilt() {
    let wallet = TestWallet::new().await;
    let alice = wallet.funded_user("alice", money("12.34")).await;
    sqlx::query("UPDATE users SET wallet_amount = 0 WHERE id = $1")
        .bind(alice.id)
        .execute(wallet.db.pool())
        .await
        .unwrap();
    let audit = wallet.ledger.audit_balances().await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].user_id, alice.id);
    assert_eq!(audit[0].cached, Money::zero());
    assert_eq!(audit[0].derived, money("12.34"));
    let balance = wallet.ledger.rebuild_balance(alice.id).await.unwrap();
    assert_eq!(balance, money("12.34"));
    wallet.finish().await;
}
