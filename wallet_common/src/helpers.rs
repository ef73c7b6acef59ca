use std::{fmt::Display, str::FromStr};

use log::error;

/// Parses an optional configuration value. Missing values silently yield the default; values that are present but
/// fail to parse are logged against `name` and also yield the default.
pub fn parse_or_default<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => default,
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_or_default_falls_back() {
        assert_eq!(parse_or_default("N", Some("12".into()), 5u32), 12);
        assert_eq!(parse_or_default("N", Some("twelve".into()), 5u32), 5);
        assert_eq!(parse_or_default("N", None, 5u32), 5);
    }
}
