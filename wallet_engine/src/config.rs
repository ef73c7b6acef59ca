use std::env;

use log::*;
use wallet_common::{parse_or_default, Money};

use crate::policies::{AmountLimits, ReversalPolicy};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/wallet.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Per-category ceilings applied to new orders.
    pub limits: AmountLimits,
    /// Governs reversals (cancellations, refunds, manual edits) that would leave a negative derived balance.
    pub reversal_policy: ReversalPolicy,
    /// Capacity of each observational event channel.
    pub event_buffer_size: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            limits: AmountLimits::default(),
            reversal_policy: ReversalPolicy::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl WalletConfig {
    pub fn new(database_url: &str) -> Self {
        Self { database_url: database_url.to_string(), ..Default::default() }
    }

    pub fn with_limits(mut self, limits: AmountLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_reversal_policy(mut self, policy: ReversalPolicy) -> Self {
        self.reversal_policy = policy;
        self
    }

    /// Loads the configuration from `WALLET_*` environment variables. Invalid values are logged and replaced by their
    /// defaults, so this never fails.
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let database_url = env::var("WALLET_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ WALLET_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections =
            parse_or_default("WALLET_DB_MAX_CONNECTIONS", env::var("WALLET_DB_MAX_CONNECTIONS").ok(), defaults.max_connections);
        let max_transfer = parse_or_default::<Money>(
            "WALLET_MAX_TRANSFER_AMOUNT",
            env::var("WALLET_MAX_TRANSFER_AMOUNT").ok(),
            defaults.limits.max_transfer,
        );
        let max_top_up = parse_or_default::<Money>(
            "WALLET_MAX_TOP_UP_AMOUNT",
            env::var("WALLET_MAX_TOP_UP_AMOUNT").ok(),
            defaults.limits.max_top_up,
        );
        let limits = sanitize_limits(AmountLimits { max_transfer, max_top_up }, defaults.limits);
        let reversal_policy =
            parse_or_default("WALLET_REVERSAL_POLICY", env::var("WALLET_REVERSAL_POLICY").ok(), defaults.reversal_policy);
        let event_buffer_size = parse_or_default(
            "WALLET_EVENT_BUFFER_SIZE",
            env::var("WALLET_EVENT_BUFFER_SIZE").ok(),
            defaults.event_buffer_size,
        )
        .max(1);
        info!(
            "🪛️ Wallet limits: transfers up to {}, top-ups up to {}. Reversal policy: {reversal_policy}",
            limits.max_transfer, limits.max_top_up
        );
        Self { database_url, max_connections, limits, reversal_policy, event_buffer_size }
    }
}

/// A ceiling of zero or less would reject every order, which is never what an operator meant.
fn sanitize_limits(limits: AmountLimits, defaults: AmountLimits) -> AmountLimits {
    let max_transfer = if limits.max_transfer.is_positive() {
        limits.max_transfer
    } else {
        warn!("🪛️ WALLET_MAX_TRANSFER_AMOUNT must be positive. Using the default, {}.", defaults.max_transfer);
        defaults.max_transfer
    };
    let max_top_up = if limits.max_top_up.is_positive() {
        limits.max_top_up
    } else {
        warn!("🪛️ WALLET_MAX_TOP_UP_AMOUNT must be positive. Using the default, {}.", defaults.max_top_up);
        defaults.max_top_up
    };
    AmountLimits { max_transfer, max_top_up }
}
