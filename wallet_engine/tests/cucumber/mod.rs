pub mod setups;
pub mod steps;
pub mod wallet_world;

pub use wallet_world::WalletWorld;
