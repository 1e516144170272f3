//! # Driving Ports (Inbound API)
//!
//! Handlers the transport server invokes for incoming peer RPCs, and the
//! read-only views exposed to the admin gateway.

use std::collections::BTreeMap;

use crate::domain::{NetworkId, Peer, PeerIdentity, Pong, RoutingTableStats, Timestamp};

/// Primary API for interacting with the peer routing subsystem.
///
/// # Example
///
/// ```rust,ignore
/// use bc_01_peer_routing::ports::PeerDiscoveryApi;
///
/// fn serve_find_peers<T: PeerDiscoveryApi>(
///     api: &T,
///     network: NetworkId,
///     from: Peer,
///     target: PeerIdentity,
/// ) {
///     let closest = api.on_find_peers_received(&network, from, &target);
///     println!("answering with {} peers", closest.len());
/// }
/// ```
pub trait PeerDiscoveryApi {
    /// A remote node pinged us.
    ///
    /// `from` is added to (or bumped in) the network's table.
    fn on_ping_received(&self, network: &NetworkId, from: Peer) -> Pong;

    /// A remote node asked for the peers closest to `target`.
    ///
    /// The answer (at most `bucket_size` peers) is computed before `from` is
    /// added, so a first-time requester is not echoed back to itself.
    fn on_find_peers_received(
        &self,
        network: &NetworkId,
        from: Peer,
        target: &PeerIdentity,
    ) -> Vec<Peer>;

    /// Networks with a routing table.
    fn networks(&self) -> Vec<NetworkId>;

    /// Addresses of peers with an open transport channel.
    fn active_peer_list(&self) -> Vec<String>;

    /// Members of every non-empty bucket, keyed by bucket index.
    fn bucket_peers(&self, network: &NetworkId) -> BTreeMap<usize, Vec<Peer>>;

    /// `host:port` of every member.
    fn all_peer_addresses(&self, network: &NetworkId) -> Vec<String>;

    /// Members seen strictly after `since`, freshest first.
    fn latest_peers(&self, network: &NetworkId, since: Timestamp) -> Vec<Peer>;

    /// Table statistics; `None` for an unknown network.
    fn stats(&self, network: &NetworkId) -> Option<RoutingTableStats>;
}
