use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::{
    AddOutcome, DiscoveryConfig, NetworkId, Peer, PeerDiscoveryError, PeerIdentity,
    RoutingTable, Timestamp,
};
use crate::ports::{PeerDialer, PeerStore, TimeSource};

/// A routing table shared between the inbound handlers and the tasks.
pub type SharedTable = Arc<Mutex<RoutingTable>>;

/// One routing table per network, plus the collaborators that feed them.
///
/// Tables are created lazily the first time a network is touched. Creation
/// happens under the map's write lock, so concurrent callers always end up
/// with the same table.
///
/// Table mutexes are only ever held for synchronous work; every RPC runs
/// with no lock held.
///
/// # Example
///
/// ```rust,ignore
/// use bc_01_peer_routing::service::PeerTableGroup;
///
/// let group = PeerTableGroup::new(owner, config, dialer, store, Arc::new(SystemTimeSource))?;
/// group.create_table(&NetworkId::from_name("yggdrash"));
/// let report = group.refresh_all().await;
/// ```
pub struct PeerTableGroup {
    pub(crate) owner: Peer,
    pub(crate) config: DiscoveryConfig,
    seed_peers: Vec<Peer>,
    tables: RwLock<HashMap<NetworkId, SharedTable>>,
    pub(crate) dialer: Arc<dyn PeerDialer>,
    pub(crate) store: Arc<dyn PeerStore>,
    pub(crate) time_source: Arc<dyn TimeSource>,
}

impl PeerTableGroup {
    /// Create a group for `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a seed URI cannot
    /// be parsed.
    pub fn new(
        owner: Peer,
        config: DiscoveryConfig,
        dialer: Arc<dyn PeerDialer>,
        store: Arc<dyn PeerStore>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, PeerDiscoveryError> {
        config.validate()?;

        let now = time_source.now();
        let seed_peers = config
            .seed_peers
            .iter()
            .map(|uri| Peer::parse(uri, now))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "[bc-01] Peer table group for {} with {} seed peers",
            owner.uri(),
            seed_peers.len()
        );

        Ok(Self {
            owner,
            config,
            seed_peers,
            tables: RwLock::new(HashMap::new()),
            dialer,
            store,
            time_source,
        })
    }

    /// Replace the seed peers parsed from the configuration.
    ///
    /// Only affects tables created afterwards.
    #[must_use]
    pub fn with_seed_peers(mut self, seeds: Vec<Peer>) -> Self {
        self.seed_peers = seeds;
        self
    }

    /// Our own node.
    pub fn owner(&self) -> &Peer {
        &self.owner
    }

    /// Get the configuration
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Configured seed peers.
    pub fn seed_peers(&self) -> &[Peer] {
        &self.seed_peers
    }

    /// Whether `id` is one of the configured seeds.
    pub fn is_seed(&self, id: &PeerIdentity) -> bool {
        self.seed_peers.iter().any(|s| s.identity() == id)
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Get the table of `network`, creating and bootstrapping it if needed.
    pub fn create_table(&self, network: &NetworkId) -> SharedTable {
        if let Some(table) = self.tables.read().get(network) {
            return Arc::clone(table);
        }

        let mut tables = self.tables.write();
        // Another caller may have won the race between the two locks
        if let Some(table) = tables.get(network) {
            return Arc::clone(table);
        }

        let mut table = RoutingTable::new(self.owner.clone(), self.config.kademlia.clone());
        self.populate(network, &mut table);
        let table = Arc::new(Mutex::new(table));
        tables.insert(*network, Arc::clone(&table));
        info!("[bc-01] Created routing table for network {}", network);
        table
    }

    /// Table of `network`, if it exists.
    pub fn table(&self, network: &NetworkId) -> Option<SharedTable> {
        self.tables.read().get(network).cloned()
    }

    /// Networks with a table, in a stable order.
    pub fn networks(&self) -> Vec<NetworkId> {
        let mut networks: Vec<NetworkId> = self.tables.read().keys().copied().collect();
        networks.sort();
        networks
    }

    /// Whether `network` has a table.
    pub fn contains_network(&self, network: &NetworkId) -> bool {
        self.tables.read().contains_key(network)
    }

    /// Refill an empty table from the store, then from the seeds.
    ///
    /// Returns the resulting member count.
    pub fn bootstrap(&self, network: &NetworkId) -> usize {
        let table = self.create_table(network);
        let mut table = table.lock();
        if table.is_empty() {
            self.populate(network, &mut table);
        }
        table.len()
    }

    /// Persisted peers first; seeds only if nothing was persisted.
    fn populate(&self, network: &NetworkId, table: &mut RoutingTable) {
        let now = self.now();

        let stored = self.store.load(network).unwrap_or_else(|e| {
            warn!("[bc-01] Failed to load stored peers of {}: {}", network, e);
            Vec::new()
        });
        let from_store = table.load_peers(stored, now);

        let from_seeds = if table.is_empty() {
            table.load_peers(self.seed_peers.iter().cloned(), now)
        } else {
            0
        };

        info!(
            "[bc-01] Bootstrapped {} with {} stored and {} seed peers",
            network, from_store, from_seeds
        );
    }

    /// Add `peer` to the table of `network`.
    pub fn add_peer(
        &self,
        network: &NetworkId,
        peer: Peer,
    ) -> Result<AddOutcome, PeerDiscoveryError> {
        let now = self.now();
        let table = self.create_table(network);
        let outcome = table.lock().add_peer(peer, now);
        outcome
    }

    /// Remove a peer from the table of `network`.
    ///
    /// Seed peers are never dropped this way.
    pub fn drop_peer(&self, network: &NetworkId, id: &PeerIdentity) -> Option<Peer> {
        if self.is_seed(id) {
            debug!("[bc-01] Keeping seed peer {:?} in {}", id, network);
            return None;
        }
        let table = self.table(network)?;
        let dropped = table.lock().drop_peer(id);
        dropped
    }

    /// Drop a disconnected peer from every table.
    ///
    /// Returns the number of tables it was removed from.
    pub fn peer_disconnected(&self, id: &PeerIdentity) -> usize {
        self.networks()
            .iter()
            .filter(|network| self.drop_peer(network, id).is_some())
            .count()
    }

    /// Up to `limit` members of `network` closest to `target`.
    pub fn closest_peers(
        &self,
        network: &NetworkId,
        target: &PeerIdentity,
        limit: usize,
    ) -> Vec<Peer> {
        self.table(network)
            .map(|table| table.lock().closest_peers(target, limit))
            .unwrap_or_default()
    }

    /// Peers to relay broadcasts to: the members closest to ourselves.
    pub fn broadcast_peers(&self, network: &NetworkId) -> Vec<Peer> {
        self.closest_peers(network, self.owner.identity(), self.config.kademlia.broadcast_size)
    }

    /// Members of `network` seen strictly after `since`, freshest first.
    pub fn latest_peers(&self, network: &NetworkId, since: Timestamp) -> Vec<Peer> {
        self.table(network)
            .map(|table| table.lock().latest_peers(since))
            .unwrap_or_default()
    }

    /// Addresses of peers with an open transport channel.
    pub fn active_peer_list(&self) -> Vec<String> {
        self.dialer.active_peer_list()
    }
}
