use std::{collections::HashMap, fmt::Debug};

use cucumber::World;
use log::*;
use wallet_engine::{
    db_types::{Money, Order},
    events::EventProducers,
    AccountApi,
    LedgerApi,
    OrderFlowApi,
    SqliteDatabase,
    WalletConfig,
    WalletError,
};

use crate::support::prepare_env::{prepare_test_env, random_db_path};

#[derive(Default, Debug, World)]
pub struct WalletWorld {
    pub system: Option<WalletSystem>,
    /// Wallet holders, by the name used in the feature file.
    pub users: HashMap<String, i64>,
    /// Orders, by the label used in the feature file.
    pub orders: HashMap<String, i64>,
    pub providers: HashMap<String, i64>,
    /// The error from the most recent step that was allowed to fail.
    pub last_error: Option<WalletError>,
}

pub struct WalletSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub accounts: AccountApi<SqliteDatabase>,
    pub ledger: LedgerApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
}

impl Debug for WalletSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletSystem ({})", self.db_path)
    }
}

impl WalletSystem {
    pub async fn new(config: &WalletConfig) -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("🚀️ Created database: {db_path}");
        let producers = EventProducers::default();
        let accounts = AccountApi::new(db.clone());
        let ledger = LedgerApi::new(db.clone(), producers.clone()).with_config(config);
        let orders = OrderFlowApi::new(db.clone(), producers).with_config(config);
        Self { db_path, db, accounts, ledger, orders }
    }
}

impl WalletWorld {
    pub fn system(&self) -> &WalletSystem {
        self.system.as_ref().expect("Wallet not initialised")
    }

    pub fn user_id(&self, name: &str) -> i64 {
        *self.users.get(name).unwrap_or_else(|| panic!("No user named {name}"))
    }

    pub fn order_id(&self, label: &str) -> i64 {
        *self.orders.get(label).unwrap_or_else(|| panic!("No order labelled {label}"))
    }

    pub fn provider_id(&self, code: &str) -> i64 {
        *self.providers.get(code).unwrap_or_else(|| panic!("No provider with code {code}"))
    }

    pub async fn order(&self, label: &str) -> Order {
        let id = self.order_id(label);
        self.system().orders.fetch_order(id).await.expect("Error fetching order").expect("Order has gone missing")
    }

    pub async fn balance(&self, name: &str) -> Money {
        let id = self.user_id(name);
        self.system().ledger.balance(id).await.expect("Error fetching balance")
    }

    /// Records the outcome of a step that is allowed to fail.
    pub fn record<T>(&mut self, result: Result<T, WalletError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🚀️ Step failed as permitted: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}
