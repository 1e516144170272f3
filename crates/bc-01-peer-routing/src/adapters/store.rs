use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::{NetworkId, Peer, PeerIdentity};
use crate::ports::{PeerStore, StoreError};

/// Volatile peer store keyed by network, then identity.
///
/// Used by tests and by nodes that do not persist their peer set across
/// restarts.
#[derive(Debug, Default)]
pub struct InMemoryPeerStore {
    peers: RwLock<HashMap<NetworkId, HashMap<PeerIdentity, Peer>>>,
}

impl InMemoryPeerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `network` with `peers`.
    #[must_use]
    pub fn with_peers(self, network: NetworkId, peers: impl IntoIterator<Item = Peer>) -> Self {
        {
            let mut map = self.peers.write();
            let entry = map.entry(network).or_default();
            for peer in peers {
                entry.insert(*peer.identity(), peer);
            }
        }
        self
    }
}

impl PeerStore for InMemoryPeerStore {
    fn upsert(&self, network: &NetworkId, peer: &Peer) -> Result<(), StoreError> {
        self.peers
            .write()
            .entry(*network)
            .or_default()
            .insert(*peer.identity(), peer.clone());
        Ok(())
    }

    fn size(&self, network: &NetworkId) -> Result<usize, StoreError> {
        Ok(self.peers.read().get(network).map_or(0, HashMap::len))
    }

    fn contains(&self, network: &NetworkId, id: &PeerIdentity) -> Result<bool, StoreError> {
        Ok(self
            .peers
            .read()
            .get(network)
            .is_some_and(|peers| peers.contains_key(id)))
    }

    fn load(&self, network: &NetworkId) -> Result<Vec<Peer>, StoreError> {
        Ok(self
            .peers
            .read()
            .get(network)
            .map(|peers| peers.values().cloned().collect())
            .unwrap_or_default())
    }
}
