//! Value Objects for Peer Routing

use std::time::Duration;

use super::errors::PeerDiscoveryError;

/// Outcome of inserting a peer into a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Peer was already a member; moved to the front and touched.
    Updated,
    /// Peer became a new member of the bucket.
    Added,
    /// Bucket was full; peer is waiting on the replacement list.
    QueuedAsReplacement,
}

/// Answer to a liveness ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong;

/// Kademlia tuning parameters.
///
/// Injected into every `RoutingTable`; two tables with different configs
/// never interfere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KademliaConfig {
    /// Bucket size and replacement list size (default: 16)
    pub bucket_size: usize,
    /// Peers queried concurrently per lookup round (default: 3)
    pub alpha: usize,
    /// Round ceiling of an iterative lookup (default: 8)
    pub max_lookup_rounds: usize,
    /// Number of peers returned by `broadcast_peers` (default: 6)
    pub broadcast_size: usize,
}

impl Default for KademliaConfig {
    fn default() -> Self {
        Self {
            bucket_size: 16,
            alpha: 3,
            max_lookup_rounds: 8,
            broadcast_size: 6,
        }
    }
}

impl KademliaConfig {
    /// Create a config suitable for testing (smaller values)
    pub fn for_testing() -> Self {
        Self {
            bucket_size: 2,
            alpha: 2,
            max_lookup_rounds: 4,
            broadcast_size: 3,
        }
    }

    /// Reject values that would make the table unusable.
    pub fn validate(&self) -> Result<(), PeerDiscoveryError> {
        if self.bucket_size == 0 {
            return Err(PeerDiscoveryError::InvalidConfig(
                "bucket_size must be at least 1".into(),
            ));
        }
        if self.alpha == 0 {
            return Err(PeerDiscoveryError::InvalidConfig(
                "alpha must be at least 1".into(),
            ));
        }
        if self.max_lookup_rounds == 0 {
            return Err(PeerDiscoveryError::InvalidConfig(
                "max_lookup_rounds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Full configuration of the discovery subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Table parameters.
    pub kademlia: KademliaConfig,
    /// Seed peer URIs (`ynode://PUBKEY@HOST:PORT`).
    pub seed_peers: Vec<String>,
    /// Deadline of every outbound ping / find-peers call.
    pub rpc_timeout: Duration,
    /// Period of the revalidation ping.
    pub health_check_interval: Duration,
    /// Period of the owner-targeted refresh.
    pub self_refresh_interval: Duration,
    /// Period of the random-target refresh.
    pub refresh_interval: Duration,
    /// Period of live-peer persistence.
    pub copy_live_interval: Duration,
    /// Minimum `last_seen` age for a peer to be persisted.
    pub live_peer_age: Duration,
    /// Period of the keep-alive ping to every seed peer.
    pub keep_alive_interval: Duration,
    /// This node is itself a seed and never pings the other seeds.
    pub is_seed_node: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            kademlia: KademliaConfig::default(),
            seed_peers: Vec::new(),
            rpc_timeout: Duration::from_secs(3),
            health_check_interval: Duration::from_secs(2),
            self_refresh_interval: Duration::from_secs(60),
            refresh_interval: Duration::from_secs(7),
            copy_live_interval: Duration::from_secs(30),
            live_peer_age: Duration::from_secs(30),
            keep_alive_interval: Duration::from_secs(60),
            is_seed_node: false,
        }
    }
}

impl DiscoveryConfig {
    /// Short timeouts and intervals for tests.
    pub fn for_testing() -> Self {
        Self {
            kademlia: KademliaConfig::for_testing(),
            seed_peers: Vec::new(),
            rpc_timeout: Duration::from_millis(200),
            health_check_interval: Duration::from_millis(50),
            self_refresh_interval: Duration::from_millis(100),
            refresh_interval: Duration::from_millis(100),
            copy_live_interval: Duration::from_millis(100),
            live_peer_age: Duration::from_secs(30),
            keep_alive_interval: Duration::from_millis(100),
            is_seed_node: false,
        }
    }

    /// Validate tunables. Seed URIs are checked when the group parses them.
    pub fn validate(&self) -> Result<(), PeerDiscoveryError> {
        self.kademlia.validate()?;
        if self.rpc_timeout.is_zero() {
            return Err(PeerDiscoveryError::InvalidConfig(
                "rpc_timeout must be non-zero".into(),
            ));
        }
        for (name, interval) in [
            ("health_check_interval", self.health_check_interval),
            ("self_refresh_interval", self.self_refresh_interval),
            ("refresh_interval", self.refresh_interval),
            ("copy_live_interval", self.copy_live_interval),
            ("keep_alive_interval", self.keep_alive_interval),
        ] {
            if interval.is_zero() {
                return Err(PeerDiscoveryError::InvalidConfig(format!(
                    "{name} must be non-zero"
                )));
            }
        }
        Ok(())
    }
}
