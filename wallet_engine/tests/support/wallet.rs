use wallet_engine::{
    db_types::{ActorId, Money, NewTopUpProvider, NewUser, TopUpProvider, User},
    events::EventProducers,
    policies::{AmountLimits, ReversalPolicy},
    AccountApi,
    LedgerApi,
    LedgerManagement,
    OrderFlowApi,
    SqliteDatabase,
};

use super::prepare_env::{prepare_test_env, random_db_path, tear_down};

pub const ADMIN: ActorId = ActorId(9000);

/// A wallet engine on a fresh, migrated database.
pub struct TestWallet {
    pub db: SqliteDatabase,
    pub accounts: AccountApi<SqliteDatabase>,
    pub ledger: LedgerApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
}

impl TestWallet {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default(), ReversalPolicy::default()).await
    }

    pub async fn with_policy(policy: ReversalPolicy) -> Self {
        Self::with_producers(EventProducers::default(), policy).await
    }

    pub async fn with_producers(producers: EventProducers, policy: ReversalPolicy) -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let accounts = AccountApi::new(db.clone());
        let ledger = LedgerApi::new(db.clone(), producers.clone()).with_reversal_policy(policy);
        let orders = OrderFlowApi::new(db.clone(), producers)
            .with_reversal_policy(policy)
            .with_limits(AmountLimits { max_transfer: Money::from_major(1_000), max_top_up: Money::from_major(5_000) });
        Self { db, accounts, ledger, orders }
    }

    pub async fn user(&self, name: &str) -> User {
        self.accounts.create_user(NewUser::new(name)).await.expect("Error creating user")
    }

    /// A user whose balance starts at `amount`, funded by a system credit.
    pub async fn funded_user(&self, name: &str, amount: Money) -> User {
        let user = self.user(name).await;
        if amount.is_positive() {
            self.ledger.credit(user.id, amount, "Opening balance", None).await.expect("Error funding user");
        }
        user
    }

    pub async fn provider(&self, code: &str, requires_reference: bool) -> TopUpProvider {
        let mut provider = NewTopUpProvider::new(code.to_uppercase().as_str(), code);
        if requires_reference {
            provider = provider.requiring_reference();
        }
        self.accounts.create_top_up_provider(provider).await.expect("Error creating provider")
    }

    pub async fn balance(&self, user_id: i64) -> Money {
        self.ledger.balance(user_id).await.expect("Error fetching balance")
    }

    /// The cached balance, as stored against the user.
    pub async fn cached_balance(&self, user_id: i64) -> Money {
        self.accounts.fetch_user(user_id).await.expect("Error fetching user").expect("No such user").wallet_amount
    }

    /// Asserts that every cached balance agrees with the ledger.
    pub async fn assert_consistent(&self) {
        let discrepancies = self.db.audit_balances().await.expect("Error auditing balances");
        assert!(discrepancies.is_empty(), "Cached balances disagree with the ledger: {discrepancies:?}");
    }

    pub async fn finish(self) {
        self.assert_consistent().await;
        tear_down(&self.db).await;
    }
}

pub fn money(s: &str) -> Money {
    s.parse().expect("Not a valid amount")
}
