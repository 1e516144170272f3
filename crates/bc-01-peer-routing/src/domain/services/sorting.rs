//! Peer orderings: closeness to a target and recency.

use std::cmp::Ordering;

use super::distance::cmp_by_distance;
use crate::domain::{Peer, PeerIdentity};

/// Sort peers by XOR distance from `target` (closest first).
pub fn sort_peers_by_distance(peers: &mut [Peer], target: &PeerIdentity) {
    peers.sort_by(|a, b| cmp_by_distance(target, a.identity(), b.identity()));
}

/// Up to `limit` peers closest to `target`, closest first.
pub fn find_closest(
    peers: impl IntoIterator<Item = Peer>,
    target: &PeerIdentity,
    limit: usize,
) -> Vec<Peer> {
    let mut all: Vec<Peer> = peers.into_iter().collect();
    sort_peers_by_distance(&mut all, target);
    all.truncate(limit);
    all
}

/// Most recently seen first; identity breaks ties.
pub fn cmp_by_recency(a: &Peer, b: &Peer) -> Ordering {
    b.last_seen
        .cmp(&a.last_seen)
        .then_with(|| a.identity().cmp(b.identity()))
}

/// Sort peers by recency (freshest first).
pub fn sort_peers_by_recency(peers: &mut [Peer]) {
    peers.sort_by(cmp_by_recency);
}
