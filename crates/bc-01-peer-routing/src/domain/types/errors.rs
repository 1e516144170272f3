//! Domain Errors for Peer Routing

use thiserror::Error;

/// Errors surfaced by the routing domain.
///
/// Transport failures are not represented here; they are liveness signals
/// (see `ports::outbound::DialError`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerDiscoveryError {
    /// Unparseable `ynode://` address (scheme, key or host)
    #[error("expecting URL in the format ynode://PUBKEY@HOST:PORT, got {0}")]
    InvalidPeerUri(String),

    /// Port missing, zero or out of range
    #[error("invalid peer port: {0}")]
    InvalidPort(String),

    /// Malformed network (branch) identifier
    #[error("invalid network id: {0}")]
    InvalidNetworkId(String),

    /// Attempted to add the table owner to its own table
    #[error("cannot add local node to routing table")]
    SelfConnection,

    /// Rejected configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
