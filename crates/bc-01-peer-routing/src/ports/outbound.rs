//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces this subsystem **requires** the host application
//! to implement.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DiscoveryConfig, NetworkId, Peer, PeerIdentity, Pong, Timestamp};

/// Errors from the peer transport.
///
/// The routing layer treats every variant as "the peer did not answer"; the
/// distinction only matters for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialError {
    /// No response within the RPC timeout
    #[error("peer did not respond in time")]
    Timeout,

    /// Connection could not be established
    #[error("peer unreachable: {0}")]
    Unreachable(String),

    /// Remote answered with an error
    #[error("peer rejected request: {0}")]
    Rejected(String),
}

/// Errors from the peer store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend failure
    #[error("peer store backend error: {0}")]
    Backend(String),
}

/// Client side of the peer RPC protocol.
///
/// Implementations own connections and serialization. They must be
/// `Send + Sync`: lookups issue several requests concurrently.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct GrpcDialer { /* channel pool */ }
///
/// #[async_trait]
/// impl PeerDialer for GrpcDialer {
///     async fn ping(
///         &self,
///         network: &NetworkId,
///         from: &Peer,
///         to: &Peer,
///     ) -> Result<Pong, DialError> {
///         let channel = self.channel(to).await?;
///         channel
///             .ping(network, from.uri())
///             .await
///             .map_err(|e| DialError::Unreachable(e.to_string()))
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait PeerDialer: Send + Sync {
    /// Liveness probe from `from` (always our own node) to `to`.
    async fn ping(&self, network: &NetworkId, from: &Peer, to: &Peer) -> Result<Pong, DialError>;

    /// Ask `remote` for the peers it knows closest to `target`.
    async fn find_peers(
        &self,
        network: &NetworkId,
        remote: &Peer,
        target: &PeerIdentity,
    ) -> Result<Vec<Peer>, DialError>;

    /// Addresses of peers with an open channel, for diagnostics.
    fn active_peer_list(&self) -> Vec<String>;
}

/// Persistent per-network peer set.
///
/// Upsert is last-write-wins keyed by peer identity.
pub trait PeerStore: Send + Sync {
    /// Insert or overwrite `peer` under `network`.
    fn upsert(&self, network: &NetworkId, peer: &Peer) -> Result<(), StoreError>;

    /// Number of peers stored for `network`.
    fn size(&self, network: &NetworkId) -> Result<usize, StoreError>;

    /// Whether `id` is stored for `network`.
    fn contains(&self, network: &NetworkId, id: &PeerIdentity) -> Result<bool, StoreError>;

    /// Every peer stored for `network`.
    fn load(&self, network: &NetworkId) -> Result<Vec<Peer>, StoreError>;
}

/// Abstract interface for time-related operations.
///
/// Enables deterministic testing by injecting controllable time sources.
/// Production implementations use system time; tests use fixed timestamps.
pub trait TimeSource: Send + Sync {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Abstract interface for configuration loading.
pub trait ConfigProvider: Send + Sync {
    /// Full discovery configuration: Kademlia tunables, seed peers and task
    /// intervals.
    fn discovery_config(&self) -> DiscoveryConfig;
}
