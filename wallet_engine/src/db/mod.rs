//! Storage for the wallet engine. The traits describe what a backend has to provide, and `sqlite` is the backend
//! that ships with the crate.
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;
