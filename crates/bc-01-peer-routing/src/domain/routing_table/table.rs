//! Main RoutingTable implementation.

use std::collections::BTreeMap;

use rand::Rng;

use crate::domain::{
    bucket_index, find_closest, sort_peers_by_recency, AddOutcome, KademliaConfig, NetworkId,
    Peer, PeerDiscoveryError, PeerIdentity, Timestamp,
};
use crate::ports::{PeerStore, StoreError};

use super::bucket::PeerBucket;
use super::config::NUM_BUCKETS;
use super::stats::RoutingTableStats;

/// Kademlia routing table of one network.
///
/// Peer `P` lives in bucket `common_prefix_len(owner, P)`: bucket 0 holds the
/// most distant half of the ID space, bucket 255 the closest peers. Every
/// identity appears at most once in the whole table, either as a member or
/// as a replacement of its bucket.
///
/// The table is plain data. Callers share it behind a single mutex so that
/// member and replacement lists change atomically with respect to each other.
#[derive(Debug)]
pub struct RoutingTable {
    /// Our own node (never stored in a bucket)
    owner: Peer,
    /// 256 buckets, one for each shared-prefix length
    buckets: Vec<PeerBucket>,
    /// Bucket capacity and lookup tunables
    config: KademliaConfig,
}

impl RoutingTable {
    /// Create a new routing table with eagerly allocated buckets.
    pub fn new(owner: Peer, config: KademliaConfig) -> Self {
        let buckets = (0..NUM_BUCKETS)
            .map(|depth| PeerBucket::new(depth, config.bucket_size))
            .collect();

        Self {
            owner,
            buckets,
            config,
        }
    }

    /// Our own node.
    pub fn owner(&self) -> &Peer {
        &self.owner
    }

    /// Get the configuration
    pub fn config(&self) -> &KademliaConfig {
        &self.config
    }

    /// Total member count across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(PeerBucket::len).sum()
    }

    /// Check if no bucket has members.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(PeerBucket::is_empty)
    }

    /// Number of buckets with at least one member.
    pub fn buckets_used(&self) -> usize {
        self.buckets.iter().filter(|b| !b.is_empty()).count()
    }

    /// Insert or refresh a peer in its bucket.
    ///
    /// The owner is rejected with `SelfConnection`.
    pub fn add_peer(
        &mut self,
        peer: Peer,
        now: Timestamp,
    ) -> Result<AddOutcome, PeerDiscoveryError> {
        if peer.identity() == self.owner.identity() {
            return Err(PeerDiscoveryError::SelfConnection);
        }
        let idx = self.index_of(peer.identity());
        Ok(self.buckets[idx].add_peer(peer, now))
    }

    /// Add peers from a persisted or configured list.
    ///
    /// Entries pointing at the owner (by identity or by address) are skipped.
    /// Returns how many peers became or stayed members.
    pub fn load_peers(&mut self, peers: impl IntoIterator<Item = Peer>, now: Timestamp) -> usize {
        let owner_address = self.owner.address();
        peers
            .into_iter()
            .filter(|p| p.address() != owner_address)
            .filter_map(|p| self.add_peer(p, now).ok())
            .filter(|outcome| *outcome != AddOutcome::QueuedAsReplacement)
            .count()
    }

    /// Remove a member from its bucket.
    pub fn drop_peer(&mut self, id: &PeerIdentity) -> Option<Peer> {
        let idx = self.index_of(id);
        self.buckets[idx].drop_peer(id)
    }

    /// Move a member to the front of its bucket.
    pub fn bump(&mut self, id: &PeerIdentity, now: Timestamp) -> bool {
        let idx = self.index_of(id);
        self.buckets[idx].bump(id, now)
    }

    /// Bucket that holds (or would hold) `id`.
    pub fn bucket_by_peer(&self, id: &PeerIdentity) -> &PeerBucket {
        &self.buckets[self.index_of(id)]
    }

    /// Bucket at `index`, if in range.
    pub fn bucket_by_index(&self, index: usize) -> Option<&PeerBucket> {
        self.buckets.get(index)
    }

    /// Check if `id` is a member of any bucket.
    pub fn contains(&self, id: &PeerIdentity) -> bool {
        self.bucket_by_peer(id).contains(id)
    }

    /// Up to `limit` members closest to `target` by XOR, closest first.
    pub fn closest_peers(&self, target: &PeerIdentity, limit: usize) -> Vec<Peer> {
        find_closest(self.all_peers(), target, limit)
    }

    /// Members seen strictly after `since`, freshest first.
    pub fn latest_peers(&self, since: Timestamp) -> Vec<Peer> {
        let mut latest: Vec<Peer> = self
            .iter_peers()
            .filter(|p| p.last_seen > since)
            .cloned()
            .collect();
        sort_peers_by_recency(&mut latest);
        latest
    }

    /// Tail member of a bucket that has a replacement waiting.
    ///
    /// The scan starts at a random bucket and wraps around, so every bucket
    /// with replacements is eventually revalidated. Full buckets without
    /// replacements are never proposed.
    pub fn peer_to_revalidate(&self) -> Option<Peer> {
        let start = rand::thread_rng().gen_range(0..NUM_BUCKETS);
        self.peer_to_revalidate_from(start)
    }

    pub(crate) fn peer_to_revalidate_from(&self, start: usize) -> Option<Peer> {
        (0..NUM_BUCKETS)
            .map(|offset| &self.buckets[(start + offset) % NUM_BUCKETS])
            .find(|bucket| bucket.has_replacements())
            .and_then(|bucket| bucket.last_peer().cloned())
    }

    /// Replace a member that failed its health check.
    ///
    /// Returns the promoted replacement, or `None` if the peer was simply
    /// dropped.
    pub fn pick_replacement(&mut self, failed: &PeerIdentity, now: Timestamp) -> Option<Peer> {
        let idx = self.index_of(failed);
        self.buckets[idx].replace(failed, now)
    }

    /// All members, bucket by bucket, front to tail within a bucket.
    pub fn all_peers(&self) -> Vec<Peer> {
        self.iter_peers().cloned().collect()
    }

    /// `host:port` of every member.
    pub fn all_peer_addresses(&self) -> Vec<String> {
        self.iter_peers().map(Peer::address).collect()
    }

    /// `ynode://` URI of every member.
    pub fn peer_uris(&self) -> Vec<String> {
        self.iter_peers().map(Peer::uri).collect()
    }

    /// Members of every non-empty bucket, keyed by bucket index.
    pub fn bucket_peers(&self) -> BTreeMap<usize, Vec<Peer>> {
        self.buckets
            .iter()
            .filter(|b| !b.is_empty())
            .map(|b| (b.depth(), b.peers().cloned().collect()))
            .collect()
    }

    /// Members whose `last_seen` is more than `age_ms` old at `now`.
    pub fn peers_older_than(&self, now: Timestamp, age_ms: u64) -> Vec<Peer> {
        self.iter_peers()
            .filter(|p| now.millis_since(p.last_seen) > age_ms)
            .cloned()
            .collect()
    }

    /// Persist members not seen for more than `age_threshold_ms`.
    ///
    /// Each such peer is upserted into `store` under `network`; returns how
    /// many were written. Stops at the first store error.
    pub fn copy_live_peers(
        &self,
        network: &NetworkId,
        store: &dyn PeerStore,
        now: Timestamp,
        age_threshold_ms: u64,
    ) -> Result<usize, StoreError> {
        let mut copied = 0;
        for peer in self.peers_older_than(now, age_threshold_ms) {
            store.upsert(network, &peer)?;
            copied += 1;
        }
        Ok(copied)
    }

    /// Get routing table statistics
    pub fn stats(&self, now: Timestamp) -> RoutingTableStats {
        let oldest_peer_age_ms = self
            .iter_peers()
            .map(|p| now.millis_since(p.last_seen))
            .max()
            .unwrap_or(0);

        RoutingTableStats {
            total_peers: self.len(),
            buckets_used: self.buckets_used(),
            replacement_count: self.buckets.iter().map(|b| b.replacements().len()).sum(),
            oldest_peer_age_ms,
        }
    }

    fn iter_peers(&self) -> impl Iterator<Item = &Peer> {
        self.buckets.iter().flat_map(PeerBucket::peers)
    }

    fn index_of(&self, id: &PeerIdentity) -> usize {
        bucket_index(self.owner.identity(), id)
    }
}
