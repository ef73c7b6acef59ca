use crate::{
    db_types::{NewTopUpProvider, NewUser, TopUpProvider, User},
    wallet_api::errors::WalletError,
};

/// The `AccountManagement` trait defines behaviour for managing wallet holders and top-up providers.
///
/// Neither is ever hard-deleted. Users are soft-removed, after which they can no longer own new orders or receive
/// transfers; providers are deactivated.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn create_user(&self, user: NewUser) -> Result<User, WalletError>;

    /// Fetches the user with the given id, including soft-removed users. If no user exists, `None` is returned.
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, WalletError>;

    /// Soft-removes the user. The user's ledger and cached balance are left as they are.
    async fn deactivate_user(&self, user_id: i64) -> Result<User, WalletError>;

    /// Fails with [`WalletError::DuplicateProviderCode`] if the code is already taken.
    async fn create_top_up_provider(&self, provider: NewTopUpProvider) -> Result<TopUpProvider, WalletError>;

    async fn fetch_top_up_provider(&self, provider_id: i64) -> Result<Option<TopUpProvider>, WalletError>;

    async fn fetch_provider_by_code(&self, code: &str) -> Result<Option<TopUpProvider>, WalletError>;

    async fn set_provider_active(&self, provider_id: i64, active: bool) -> Result<TopUpProvider, WalletError>;
}
