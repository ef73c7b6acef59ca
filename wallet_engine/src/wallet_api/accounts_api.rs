//! Unifies API for managing wallet holders and top-up providers.

use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::AccountManagement,
    db_types::{NewTopUpProvider, NewUser, TopUpProvider, User},
    wallet_api::errors::WalletError,
};

/// The `AccountApi` provides a unified API for managing users and top-up providers.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User, WalletError> {
        self.db.create_user(user).await
    }

    /// Fetches the user for the given id. If no user exists, `None` is returned.
    pub async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, WalletError> {
        self.db.fetch_user(user_id).await
    }

    /// Soft-removes the user. They keep their ledger, but can no longer own new orders or receive transfers.
    pub async fn deactivate_user(&self, user_id: i64) -> Result<User, WalletError> {
        self.db.deactivate_user(user_id).await
    }

    pub async fn create_top_up_provider(&self, provider: NewTopUpProvider) -> Result<TopUpProvider, WalletError> {
        let code = provider.code.trim().to_string();
        if code.is_empty() {
            return Err(WalletError::InvalidTopUpProvider("the provider code cannot be empty".into()));
        }
        let provider = NewTopUpProvider { code, ..provider };
        let result = self.db.create_top_up_provider(provider).await?;
        info!("🧑️ Top-up provider '{}' ({}) registered", result.code, result.name);
        Ok(result)
    }

    pub async fn fetch_top_up_provider(&self, provider_id: i64) -> Result<Option<TopUpProvider>, WalletError> {
        self.db.fetch_top_up_provider(provider_id).await
    }

    pub async fn fetch_provider_by_code(&self, code: &str) -> Result<Option<TopUpProvider>, WalletError> {
        self.db.fetch_provider_by_code(code.trim()).await
    }

    pub async fn set_provider_active(&self, provider_id: i64, active: bool) -> Result<TopUpProvider, WalletError> {
        self.db.set_provider_active(provider_id, active).await
    }
}
