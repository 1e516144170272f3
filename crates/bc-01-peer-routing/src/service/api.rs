use std::collections::BTreeMap;

use tracing::debug;

use super::core::PeerTableGroup;
use crate::domain::{NetworkId, Peer, PeerIdentity, Pong, RoutingTableStats, Timestamp};
use crate::ports::PeerDiscoveryApi;

impl PeerDiscoveryApi for PeerTableGroup {
    fn on_ping_received(&self, network: &NetworkId, from: Peer) -> Pong {
        let address = from.address();
        if let Err(e) = self.add_peer(network, from) {
            debug!("[bc-01] Ignoring ping from {}: {}", address, e);
        }
        Pong
    }

    fn on_find_peers_received(
        &self,
        network: &NetworkId,
        from: Peer,
        target: &PeerIdentity,
    ) -> Vec<Peer> {
        let now = self.now();
        let table = self.create_table(network);
        let mut table = table.lock();

        let closest = table.closest_peers(target, self.config.kademlia.bucket_size);
        if let Err(e) = table.add_peer(from, now) {
            debug!("[bc-01] Not adding find_peers requester: {}", e);
        }
        closest
    }

    fn networks(&self) -> Vec<NetworkId> {
        PeerTableGroup::networks(self)
    }

    fn active_peer_list(&self) -> Vec<String> {
        PeerTableGroup::active_peer_list(self)
    }

    fn bucket_peers(&self, network: &NetworkId) -> BTreeMap<usize, Vec<Peer>> {
        self.table(network)
            .map(|table| table.lock().bucket_peers())
            .unwrap_or_default()
    }

    fn all_peer_addresses(&self, network: &NetworkId) -> Vec<String> {
        self.table(network)
            .map(|table| table.lock().all_peer_addresses())
            .unwrap_or_default()
    }

    fn latest_peers(&self, network: &NetworkId, since: Timestamp) -> Vec<Peer> {
        PeerTableGroup::latest_peers(self, network, since)
    }

    fn stats(&self, network: &NetworkId) -> Option<RoutingTableStats> {
        let now = self.now();
        self.table(network).map(|table| table.lock().stats(now))
    }
}
