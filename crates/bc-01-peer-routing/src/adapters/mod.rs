//! # Adapters
//!
//! - `SystemTimeSource` - wall clock in milliseconds
//! - `InMemoryPeerStore` - volatile per-network peer store
//! - `StaticConfigProvider` - configuration built in code
//! - `TomlConfigProvider` - config file loading (requires "toml-config" feature)

/// Configuration providers
pub mod config;
/// Peer persistence
pub mod store;
/// Time source adapters
pub mod time;

pub use config::StaticConfigProvider;
pub use store::InMemoryPeerStore;
pub use time::SystemTimeSource;

#[cfg(feature = "toml-config")]
pub use config::{ConfigError, TomlConfigProvider};
