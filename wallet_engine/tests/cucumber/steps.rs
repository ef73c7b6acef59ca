use cucumber::{then, when};
use wallet_engine::{
    db_types::{Money, NewOrder, OrderStatusType},
    order_machine::OrderAction,
};

use crate::cucumber::WalletWorld;

fn amount(s: &str) -> Money {
    s.parse().expect("Not a valid amount")
}

#[when(expr = "'{word}' is credited {word} for {string}")]
async fn credit(world: &mut WalletWorld, name: String, value: String, description: String) {
    let id = world.user_id(&name);
    let result = world.system().ledger.credit(id, amount(&value), &description, None).await;
    world.record(result);
}

#[when(expr = "'{word}' is debited {word} for {string}")]
async fn debit(world: &mut WalletWorld, name: String, value: String, description: String) {
    let id = world.user_id(&name);
    let result = world.system().ledger.debit(id, amount(&value), &description, None).await;
    world.record(result);
}

#[when(expr = "'{word}' sends {word} to '{word}' in order [{word}]")]
async fn create_transfer(world: &mut WalletWorld, sender: String, value: String, receiver: String, label: String) {
    let order = NewOrder::transfer(world.user_id(&sender), world.user_id(&receiver), amount(&value));
    create_order(world, order, label).await;
}

#[when(expr = "'{word}' requests a withdrawal of {word} in order [{word}]")]
async fn create_withdrawal(world: &mut WalletWorld, name: String, value: String, label: String) {
    let order = NewOrder::withdrawal(world.user_id(&name), amount(&value));
    create_order(world, order, label).await;
}

#[when(expr = "'{word}' tops up {word} via '{word}' in order [{word}]")]
async fn create_top_up(world: &mut WalletWorld, name: String, value: String, provider: String, label: String) {
    let order = NewOrder::top_up(world.user_id(&name), amount(&value), world.provider_id(&provider));
    create_order(world, order, label).await;
}

#[when(expr = "'{word}' tops up {word} via '{word}' with reference {string} in order [{word}]")]
async fn create_top_up_with_reference(
    world: &mut WalletWorld,
    name: String,
    value: String,
    provider: String,
    reference: String,
    label: String,
) {
    let order = NewOrder::top_up(world.user_id(&name), amount(&value), world.provider_id(&provider))
        .with_provider_reference(reference);
    create_order(world, order, label).await;
}

#[when(expr = "an admin tops up {word} for '{word}' via '{word}' in order [{word}]")]
async fn create_admin_top_up(world: &mut WalletWorld, value: String, name: String, provider: String, label: String) {
    let order = NewOrder::admin_top_up(world.user_id(&name), amount(&value), world.provider_id(&provider));
    create_order(world, order, label).await;
}

async fn create_order(world: &mut WalletWorld, order: NewOrder, label: String) {
    let result = world.system().orders.create_order(None, order).await;
    if let Some(order) = world.record(result) {
        world.orders.insert(label, order.id);
    }
}

//             order [t1] receives the confirm action
#[when(expr = "order [{word}] receives the {word} action")]
async fn transition(world: &mut WalletWorld, label: String, action: String) {
    let action = action.parse::<OrderAction>().expect("Not a valid action");
    apply(world, label, action, None).await;
}

#[when(expr = "order [{word}] receives the {word} action with reason {string}")]
async fn transition_with_reason(world: &mut WalletWorld, label: String, action: String, reason: String) {
    let action = action.parse::<OrderAction>().expect("Not a valid action");
    apply(world, label, action, Some(reason)).await;
}

async fn apply(world: &mut WalletWorld, label: String, action: OrderAction, reason: Option<String>) {
    let id = world.order_id(&label);
    let orders = &world.system().orders;
    let result = match action {
        OrderAction::Archive => orders.archive_order(id, None).await,
        action => orders.transition_order(id, action, None, reason.as_deref()).await,
    };
    world.record(result);
}

#[when(expr = "ledger entry {int} of order [{word}] is cancelled")]
async fn cancel_entry(world: &mut WalletWorld, index: usize, label: String) {
    let id = world.order_id(&label);
    let entries = world.system().orders.transactions_for_order(id).await.expect("Error fetching entries");
    let entry = entries.get(index - 1).expect("No such ledger entry");
    let result = world.system().ledger.cancel_transaction(entry.id).await;
    world.record(result);
}

#[then(expr = "the balance of '{word}' is {word}")]
async fn check_balance(world: &mut WalletWorld, name: String, value: String) {
    let balance = world.balance(&name).await;
    assert_eq!(balance, amount(&value), "Balance of {name} is incorrect");
}

#[then(expr = "order [{word}] has status {word}")]
async fn check_status(world: &mut WalletWorld, label: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let order = world.order(&label).await;
    assert_eq!(order.status, expected, "Order {label} has the wrong status");
}

#[then(expr = "order [{word}] has {int} ledger entries, {int} of them active")]
async fn check_entries(world: &mut WalletWorld, label: String, total: usize, active: usize) {
    let id = world.order_id(&label);
    let entries = world.system().orders.transactions_for_order(id).await.expect("Error fetching entries");
    assert_eq!(entries.len(), total, "Wrong number of ledger entries for order {label}");
    assert_eq!(entries.iter().filter(|t| t.is_active()).count(), active, "Wrong number of active entries");
}

#[then(expr = "the description of order [{word}] contains {string}")]
async fn check_description(world: &mut WalletWorld, label: String, text: String) {
    let order = world.order(&label).await;
    let description = order.description.unwrap_or_default();
    assert!(description.contains(&text), "Expected '{text}' in '{description}'");
}

#[then(expr = "the operation fails with {word}")]
async fn check_failure(world: &mut WalletWorld, code: String) {
    let err = world.last_error.take().expect("The operation did not fail");
    assert_eq!(err.code(), code, "Unexpected error: {err}");
}

#[then("the operation succeeds")]
async fn check_success(world: &mut WalletWorld) {
    if let Some(e) = world.last_error.take() {
        panic!("The operation failed: {e}");
    }
}

#[then("every cached balance agrees with the ledger")]
async fn check_consistency(world: &mut WalletWorld) {
    let discrepancies = world.system().ledger.audit_balances().await.expect("Error auditing balances");
    assert!(discrepancies.is_empty(), "{discrepancies:?}");
}
