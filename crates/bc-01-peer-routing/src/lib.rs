//! # Peer Routing Subsystem
//!
//! **Subsystem ID:** 1
//!
//! Kademlia-style peer tables for Branch-Chain nodes. Every logical network
//! (branch) gets its own routing table; tables are fed by seed peers, by
//! persisted peers, by inbound pings and by iterative lookups, and kept
//! healthy by periodic revalidation.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** identities, shared-prefix distance, k-buckets with
//!   replacement lists, the routing table (synchronous, no I/O)
//! - **Ports Layer:** `PeerDialer`, `PeerStore`, `TimeSource`,
//!   `ConfigProvider` and the inbound `PeerDiscoveryApi`
//! - **Service Layer:** `PeerTableGroup` (tables per network, lookups) and
//!   `PeerTask` (tokio loops)
//! - **Adapters Layer:** system clock, in-memory store, static and TOML
//!   configuration
//!
//! ## Example
//!
//! ```rust
//! use bc_01_peer_routing::{AddOutcome, KademliaConfig, Peer, RoutingTable, Timestamp};
//!
//! let now = Timestamp::from_millis(1_000);
//! let owner = Peer::parse("ynode://75bff16c@172.16.10.150:32918", now).unwrap();
//! let mut table = RoutingTable::new(owner, KademliaConfig::default());
//!
//! let peer = Peer::parse("ynode://aa01@172.16.10.151:32918", now).unwrap();
//! assert_eq!(table.add_peer(peer.clone(), now).unwrap(), AddOutcome::Added);
//! assert_eq!(table.closest_peers(peer.identity(), 1), vec![peer]);
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Test utilities (FixedTimeSource, MockDialer, ...)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Domain entities
pub use domain::{
    AddOutcome, DiscoveryConfig, Distance, KademliaConfig, NetworkId, Peer, PeerBucket,
    PeerDiscoveryError, PeerIdentity, Pong, RoutingTable, RoutingTableStats, Timestamp,
    NUM_BUCKETS,
};

// Domain services
pub use domain::{bucket_index, common_prefix_len, find_closest, sort_peers_by_distance};

// Port traits
pub use ports::{
    ConfigProvider, DialError, PeerDialer, PeerDiscoveryApi, PeerStore, StoreError, TimeSource,
};

// Service
pub use service::{HealthCheck, LookupReport, PeerTableGroup, PeerTask, SharedTable};
