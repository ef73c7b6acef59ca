use cucumber::given;
use wallet_engine::{
    db_types::{NewTopUpProvider, NewUser},
    policies::ReversalPolicy,
    WalletConfig,
};

use crate::cucumber::{wallet_world::WalletSystem, WalletWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut WalletWorld) {
    let system = WalletSystem::new(&WalletConfig::default()).await;
    world.system = Some(system);
}

#[given("a fresh install that rejects negative reversals")]
async fn fresh_strict_database(world: &mut WalletWorld) {
    let config = WalletConfig::default().with_reversal_policy(ReversalPolicy::RejectNegative);
    world.system = Some(WalletSystem::new(&config).await);
}

#[given(expr = "a user named '{word}'")]
async fn new_user(world: &mut WalletWorld, name: String) {
    let user = world.system().accounts.create_user(NewUser::new(name.as_str())).await.expect("Error creating user");
    world.users.insert(name, user.id);
}

#[given(expr = "a user named '{word}' with a balance of {word}")]
async fn new_funded_user(world: &mut WalletWorld, name: String, amount: String) {
    new_user(world, name.clone()).await;
    let id = world.user_id(&name);
    let amount = amount.parse().expect("Not a valid amount");
    world.system().ledger.credit(id, amount, "Opening balance", None).await.expect("Error funding user");
}

#[given(expr = "a top-up provider '{word}'")]
async fn new_provider(world: &mut WalletWorld, code: String) {
    let provider = NewTopUpProvider::new(code.to_uppercase(), code.clone());
    let provider = world.system().accounts.create_top_up_provider(provider).await.expect("Error creating provider");
    world.providers.insert(code, provider.id);
}

#[given(expr = "a top-up provider '{word}' that requires a reference")]
async fn new_strict_provider(world: &mut WalletWorld, code: String) {
    let provider = NewTopUpProvider::new(code.to_uppercase(), code.clone()).requiring_reference();
    let provider = world.system().accounts.create_top_up_provider(provider).await.expect("Error creating provider");
    world.providers.insert(code, provider.id);
}
