use log::*;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::errors::is_unique_violation,
    db_types::{NewTopUpProvider, TopUpProvider},
    wallet_api::errors::WalletError,
};

const PROVIDER_COLUMNS: &str = "id, name, code, is_active, requires_reference, created_at, updated_at";

pub async fn insert_provider(
    provider: NewTopUpProvider,
    conn: &mut SqliteConnection,
) -> Result<TopUpProvider, WalletError> {
    let sql = format!(
        "INSERT INTO top_up_providers (name, code, requires_reference) VALUES ($1, $2, $3) RETURNING \
         {PROVIDER_COLUMNS}"
    );
    let code = provider.code.clone();
    let result = sqlx::query_as::<_, TopUpProvider>(&sql)
        .bind(provider.name)
        .bind(provider.code)
        .bind(provider.requires_reference)
        .fetch_one(conn)
        .await;
    match result {
        Ok(p) => {
            debug!("🗃️ Top-up provider '{}' created with id {}", p.code, p.id);
            Ok(p)
        },
        Err(e) if is_unique_violation(&e) => Err(WalletError::DuplicateProviderCode(code)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_provider(provider_id: i64, conn: &mut SqliteConnection) -> Result<Option<TopUpProvider>, WalletError> {
    let sql = format!("SELECT {PROVIDER_COLUMNS} FROM top_up_providers WHERE id = $1");
    let provider = sqlx::query_as::<_, TopUpProvider>(&sql).bind(provider_id).fetch_optional(conn).await?;
    Ok(provider)
}

pub async fn fetch_provider_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<TopUpProvider>, WalletError> {
    let sql = format!("SELECT {PROVIDER_COLUMNS} FROM top_up_providers WHERE code = $1");
    let provider = sqlx::query_as::<_, TopUpProvider>(&sql).bind(code).fetch_optional(conn).await?;
    Ok(provider)
}

pub async fn set_active(provider_id: i64, active: bool, conn: &mut SqliteConnection) -> Result<TopUpProvider, WalletError> {
    let sql = format!(
        "UPDATE top_up_providers SET is_active = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING \
         {PROVIDER_COLUMNS}"
    );
    let provider = sqlx::query_as::<_, TopUpProvider>(&sql)
        .bind(active)
        .bind(provider_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| WalletError::InvalidTopUpProvider(format!("provider #{provider_id} does not exist")))?;
    info!("🗃️ Top-up provider '{}' is now {}", provider.code, if active { "active" } else { "inactive" });
    Ok(provider)
}
