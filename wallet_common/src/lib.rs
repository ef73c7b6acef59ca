mod helpers;
mod money;

pub mod op;

pub use helpers::parse_or_default;
pub use money::{Money, MoneyConversionError, MINOR_UNITS};
