use crate::domain::DiscoveryConfig;
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - Hardcoded config for testing/development
// ============================================================================

/// Static configuration provider.
///
/// Useful for testing and embedding. For production, use `TomlConfigProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: DiscoveryConfig,
}

impl StaticConfigProvider {
    /// Create with default config and no seed peers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the seed peer URIs.
    #[must_use]
    pub fn with_seed_peers(mut self, seeds: Vec<String>) -> Self {
        self.config.seed_peers = seeds;
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn discovery_config(&self) -> DiscoveryConfig {
        self.config.clone()
    }
}

// ============================================================================
// TomlConfigProvider - Config file loading (requires "toml-config" feature)
// ============================================================================

#[cfg(feature = "toml-config")]
mod toml_config {
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    use serde::Deserialize;
    use thiserror::Error;

    use super::*;
    use crate::domain::{KademliaConfig, PeerDiscoveryError};

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct ConfigFile {
        #[serde(default)]
        kademlia: KademliaSection,
        #[serde(default)]
        bootstrap: BootstrapSection,
        #[serde(default)]
        tasks: TasksSection,
    }

    #[derive(Debug, Deserialize, Default)]
    #[serde(deny_unknown_fields)]
    struct KademliaSection {
        bucket_size: Option<usize>,
        alpha: Option<usize>,
        max_lookup_rounds: Option<usize>,
        broadcast_size: Option<usize>,
    }

    #[derive(Debug, Deserialize, Default)]
    #[serde(deny_unknown_fields)]
    struct BootstrapSection {
        #[serde(default)]
        seed_peers: Vec<String>,
        #[serde(default)]
        is_seed_node: bool,
    }

    #[derive(Debug, Deserialize, Default)]
    #[serde(deny_unknown_fields)]
    struct TasksSection {
        rpc_timeout_ms: Option<u64>,
        health_check_interval_ms: Option<u64>,
        self_refresh_interval_ms: Option<u64>,
        refresh_interval_ms: Option<u64>,
        copy_live_interval_ms: Option<u64>,
        live_peer_age_ms: Option<u64>,
        keep_alive_interval_ms: Option<u64>,
    }

    /// TOML-based configuration provider.
    ///
    /// Missing keys fall back to [`DiscoveryConfig::default`]; the result is
    /// validated before it is returned.
    ///
    /// # Config File Format
    ///
    /// ```toml
    /// [kademlia]
    /// bucket_size = 16
    /// alpha = 3
    /// max_lookup_rounds = 8
    /// broadcast_size = 6
    ///
    /// [bootstrap]
    /// seed_peers = [
    ///     "ynode://75bff16c@172.16.10.150:32918",
    /// ]
    /// is_seed_node = false
    ///
    /// [tasks]
    /// rpc_timeout_ms = 3000
    /// health_check_interval_ms = 2000
    /// self_refresh_interval_ms = 60000
    /// refresh_interval_ms = 7000
    /// copy_live_interval_ms = 30000
    /// live_peer_age_ms = 30000
    /// keep_alive_interval_ms = 60000
    /// ```
    #[derive(Debug, Clone)]
    pub struct TomlConfigProvider {
        config: DiscoveryConfig,
    }

    impl TomlConfigProvider {
        /// Load configuration from a TOML file.
        ///
        /// # Errors
        ///
        /// Returns error if the file cannot be read, parsed or validated.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;

            Self::parse(&content)
        }

        /// Parse configuration from a TOML string.
        pub fn parse(content: &str) -> Result<Self, ConfigError> {
            let file: ConfigFile =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

            let defaults = DiscoveryConfig::default();
            let kd = defaults.kademlia;
            let kc = file.kademlia;
            let tc = file.tasks;
            let ms = |value: Option<u64>, fallback: Duration| {
                value.map_or(fallback, Duration::from_millis)
            };

            let config = DiscoveryConfig {
                kademlia: KademliaConfig {
                    bucket_size: kc.bucket_size.unwrap_or(kd.bucket_size),
                    alpha: kc.alpha.unwrap_or(kd.alpha),
                    max_lookup_rounds: kc.max_lookup_rounds.unwrap_or(kd.max_lookup_rounds),
                    broadcast_size: kc.broadcast_size.unwrap_or(kd.broadcast_size),
                },
                seed_peers: file.bootstrap.seed_peers,
                rpc_timeout: ms(tc.rpc_timeout_ms, defaults.rpc_timeout),
                health_check_interval: ms(
                    tc.health_check_interval_ms,
                    defaults.health_check_interval,
                ),
                self_refresh_interval: ms(
                    tc.self_refresh_interval_ms,
                    defaults.self_refresh_interval,
                ),
                refresh_interval: ms(tc.refresh_interval_ms, defaults.refresh_interval),
                copy_live_interval: ms(tc.copy_live_interval_ms, defaults.copy_live_interval),
                live_peer_age: ms(tc.live_peer_age_ms, defaults.live_peer_age),
                keep_alive_interval: ms(tc.keep_alive_interval_ms, defaults.keep_alive_interval),
                is_seed_node: file.bootstrap.is_seed_node,
            };
            config.validate()?;

            Ok(Self { config })
        }
    }

    impl ConfigProvider for TomlConfigProvider {
        fn discovery_config(&self) -> DiscoveryConfig {
            self.config.clone()
        }
    }

    /// Errors that can occur during config loading.
    #[derive(Debug, Clone, Error)]
    pub enum ConfigError {
        /// File I/O error.
        #[error("failed to read {path}: {error}")]
        Io {
            /// Path of the file that failed to load.
            path: String,
            /// Error message from the I/O operation.
            error: String,
        },
        /// TOML parsing error.
        #[error("failed to parse config: {0}")]
        Parse(String),
        /// Values parsed but rejected.
        #[error(transparent)]
        Invalid(#[from] PeerDiscoveryError),
    }
}

#[cfg(feature = "toml-config")]
pub use toml_config::{ConfigError, TomlConfigProvider};
