//! Tests for the bucket and routing table

use super::*;
use crate::adapters::InMemoryPeerStore;
use crate::domain::{
    AddOutcome, KademliaConfig, NetworkId, Peer, PeerDiscoveryError, PeerIdentity, Timestamp,
};
use crate::ports::PeerStore;

fn owner() -> Peer {
    Peer::with_identity(
        PeerIdentity::new([0u8; 32]),
        "10.0.0.1",
        32918,
        Timestamp::from_millis(0),
    )
}

/// Peer landing in bucket `depth` (< 248) of a table owned by the all-zero
/// identity; `tag` tells apart peers of the same bucket.
fn peer_at(depth: usize, tag: u8, last_seen: u64) -> Peer {
    let mut bytes = [0u8; 32];
    bytes[depth / 8] = 0b1000_0000 >> (depth % 8);
    bytes[31] = tag;
    Peer::with_identity(
        PeerIdentity::new(bytes),
        format!("192.168.{depth}.{tag}"),
        32918,
        Timestamp::from_millis(last_seen),
    )
}

fn table() -> RoutingTable {
    // bucket_size = 2
    RoutingTable::new(owner(), KademliaConfig::for_testing())
}

fn ids(peers: &[Peer]) -> Vec<PeerIdentity> {
    peers.iter().map(|p| *p.identity()).collect()
}

fn bucket_ids(bucket: &PeerBucket) -> Vec<PeerIdentity> {
    bucket.peers().map(|p| *p.identity()).collect()
}

// =============================================================================
// PeerBucket
// =============================================================================

#[test]
fn test_bucket_add_until_full_then_queue() {
    let mut bucket = PeerBucket::new(0, 2);
    let now = Timestamp::from_millis(100);

    assert_eq!(bucket.add_peer(peer_at(0, 1, 0), now), AddOutcome::Added);
    assert_eq!(bucket.add_peer(peer_at(0, 2, 0), now), AddOutcome::Added);
    assert!(bucket.is_full());
    assert_eq!(
        bucket.add_peer(peer_at(0, 3, 0), now),
        AddOutcome::QueuedAsReplacement
    );

    assert_eq!(bucket.len(), 2);
    assert_eq!(bucket.replacements().len(), 1);
    assert!(bucket.is_replacement(peer_at(0, 3, 0).identity()));
    assert!(!bucket.contains(peer_at(0, 3, 0).identity()));
}

#[test]
fn test_bucket_new_member_joins_at_tail() {
    let mut bucket = PeerBucket::new(0, 4);
    let p1 = peer_at(0, 1, 0);
    let p2 = peer_at(0, 2, 0);

    bucket.add_peer(p1.clone(), Timestamp::from_millis(10));
    bucket.add_peer(p2.clone(), Timestamp::from_millis(20));

    assert_eq!(bucket.peers().next(), Some(&p1));
    assert_eq!(bucket.last_peer(), Some(&p2));
}

#[test]
fn test_bucket_readd_moves_to_front() {
    let mut bucket = PeerBucket::new(0, 4);
    let p1 = peer_at(0, 1, 0);
    let p2 = peer_at(0, 2, 0);

    bucket.add_peer(p1.clone(), Timestamp::from_millis(10));
    bucket.add_peer(p2.clone(), Timestamp::from_millis(20));

    let outcome = bucket.add_peer(p2.clone(), Timestamp::from_millis(30));

    assert_eq!(outcome, AddOutcome::Updated);
    assert_eq!(bucket.len(), 2, "duplicate add must not grow the bucket");
    assert_eq!(bucket.peers().next(), Some(&p2));
    assert_eq!(
        bucket.find(p2.identity()).map(|p| p.last_seen),
        Some(Timestamp::from_millis(30))
    );
    assert_eq!(bucket.last_peer(), Some(&p1));
}

#[test]
fn test_bucket_bump_tail_becomes_head() {
    let mut bucket = PeerBucket::new(0, 4);
    let p1 = peer_at(0, 1, 0);
    let p2 = peer_at(0, 2, 0);
    let p3 = peer_at(0, 3, 0);
    for (i, p) in [&p1, &p2, &p3].into_iter().enumerate() {
        bucket.add_peer(p.clone(), Timestamp::from_millis(i as u64 + 1));
    }
    assert_eq!(bucket_ids(&bucket), ids(&[p1.clone(), p2.clone(), p3.clone()]));

    assert!(bucket.bump(p3.identity(), Timestamp::from_millis(10)));
    assert_eq!(bucket_ids(&bucket), ids(&[p3.clone(), p1.clone(), p2.clone()]));

    // Bumping the head keeps the order
    assert!(bucket.bump(p3.identity(), Timestamp::from_millis(11)));
    assert_eq!(bucket_ids(&bucket), ids(&[p3.clone(), p1, p2]));
    assert_eq!(
        bucket.find(p3.identity()).map(|p| p.last_seen),
        Some(Timestamp::from_millis(11))
    );
}

#[test]
fn test_bucket_replacements_bounded_and_deduplicated() {
    let mut bucket = PeerBucket::new(0, 2);
    let now = Timestamp::from_millis(1);
    for tag in 1..=2 {
        bucket.add_peer(peer_at(0, tag, 0), now);
    }
    for tag in 3..=6 {
        bucket.add_peer(peer_at(0, tag, 0), now);
    }
    assert_eq!(bucket.replacements().len(), 2);

    // Newest two survive, freshest first
    let queued: Vec<_> = bucket.replacements().map(|p| *p.identity()).collect();
    assert_eq!(queued, vec![*peer_at(0, 6, 0).identity(), *peer_at(0, 5, 0).identity()]);

    // Re-queuing an existing replacement moves it to the front without duplicating
    bucket.add_peer(peer_at(0, 5, 0), now);
    let queued: Vec<_> = bucket.replacements().map(|p| *p.identity()).collect();
    assert_eq!(queued, vec![*peer_at(0, 5, 0).identity(), *peer_at(0, 6, 0).identity()]);
}

#[test]
fn test_bucket_drop_does_not_promote() {
    let mut bucket = PeerBucket::new(0, 1);
    let now = Timestamp::from_millis(1);
    let p1 = peer_at(0, 1, 0);
    bucket.add_peer(p1.clone(), now);
    bucket.add_peer(peer_at(0, 2, 0), now);

    assert_eq!(bucket.drop_peer(p1.identity()), Some(p1));
    assert!(bucket.is_empty());
    assert!(bucket.has_replacements());
}

#[test]
fn test_bucket_replace_without_replacements_drops() {
    let mut bucket = PeerBucket::new(0, 2);
    let p1 = peer_at(0, 1, 0);
    bucket.add_peer(p1.clone(), Timestamp::from_millis(1));

    assert_eq!(bucket.replace(p1.identity(), Timestamp::from_millis(2)), None);
    assert!(bucket.is_empty());

    // Absent peer is a no-op
    assert_eq!(bucket.replace(p1.identity(), Timestamp::from_millis(3)), None);
}

#[test]
fn test_bucket_replace_tail_promotes_latest_replacement() {
    let mut bucket = PeerBucket::new(0, 2);
    let p1 = peer_at(0, 1, 0);
    let p2 = peer_at(0, 2, 0);
    let p3 = peer_at(0, 3, 0);
    bucket.add_peer(p1.clone(), Timestamp::from_millis(1));
    bucket.add_peer(p2.clone(), Timestamp::from_millis(2));
    assert_eq!(
        bucket.add_peer(p3.clone(), Timestamp::from_millis(3)),
        AddOutcome::QueuedAsReplacement
    );

    let promoted = bucket.replace(p2.identity(), Timestamp::from_millis(4));

    assert_eq!(promoted, Some(p3.clone()));
    assert_eq!(bucket_ids(&bucket), ids(&[p3, p1]));
    assert!(!bucket.has_replacements());
}

#[test]
fn test_bucket_replace_non_tail_only_drops() {
    let mut bucket = PeerBucket::new(0, 2);
    let p1 = peer_at(0, 1, 0);
    let p2 = peer_at(0, 2, 0);
    bucket.add_peer(p1.clone(), Timestamp::from_millis(1));
    bucket.add_peer(p2.clone(), Timestamp::from_millis(2));
    bucket.add_peer(peer_at(0, 3, 0), Timestamp::from_millis(3));

    // p1 is the front member, not the tail
    assert_eq!(bucket.replace(p1.identity(), Timestamp::from_millis(4)), None);
    assert_eq!(bucket_ids(&bucket), ids(&[p2]));
    assert!(bucket.has_replacements());
}

// =============================================================================
// RoutingTable: membership
// =============================================================================

#[test]
fn test_table_rejects_owner() {
    let mut table = table();

    assert_eq!(
        table.add_peer(owner(), Timestamp::from_millis(1)),
        Err(PeerDiscoveryError::SelfConnection)
    );
    assert!(table.is_empty());
}

#[test]
fn test_table_places_peer_by_shared_prefix() {
    let mut table = table();
    let now = Timestamp::from_millis(1);

    for depth in [0, 1, 9, 200] {
        table.add_peer(peer_at(depth, 1, 0), now).unwrap();
    }

    assert_eq!(table.len(), 4);
    assert_eq!(table.buckets_used(), 4);
    for depth in [0, 1, 9, 200] {
        let bucket = table.bucket_by_index(depth).unwrap();
        assert_eq!(bucket.depth(), depth);
        assert!(bucket.contains(peer_at(depth, 1, 0).identity()));
    }
    assert!(table.bucket_by_index(NUM_BUCKETS).is_none());

    let map = table.bucket_peers();
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![0, 1, 9, 200]);
}

#[test]
fn test_table_duplicate_add_keeps_single_entry() {
    let mut table = table();
    let p = peer_at(3, 1, 0);

    assert_eq!(table.add_peer(p.clone(), Timestamp::from_millis(1)), Ok(AddOutcome::Added));
    assert_eq!(table.add_peer(p.clone(), Timestamp::from_millis(2)), Ok(AddOutcome::Updated));

    assert_eq!(table.len(), 1);
    assert_eq!(table.all_peers()[0].last_seen, Timestamp::from_millis(2));
}

#[test]
fn test_table_bump_and_drop() {
    let mut table = table();
    let p = peer_at(5, 1, 0);
    table.add_peer(p.clone(), Timestamp::from_millis(1)).unwrap();

    assert!(table.bump(p.identity(), Timestamp::from_millis(9)));
    assert_eq!(table.all_peers()[0].last_seen, Timestamp::from_millis(9));

    assert!(table.drop_peer(p.identity()).is_some());
    assert!(!table.contains(p.identity()));
    assert!(!table.bump(p.identity(), Timestamp::from_millis(10)));
    assert!(table.drop_peer(p.identity()).is_none());
}

#[test]
fn test_load_peers_skips_owner_address() {
    let mut table = table();
    let same_address = Peer::new("ab", "10.0.0.1", 32918, Timestamp::from_millis(0)).unwrap();
    let other = Peer::new("ab", "10.0.0.2", 32918, Timestamp::from_millis(0)).unwrap();

    let loaded = table.load_peers(
        [same_address, other.clone(), owner()],
        Timestamp::from_millis(5),
    );

    assert_eq!(loaded, 1);
    assert_eq!(table.all_peers(), vec![other]);
}

// =============================================================================
// RoutingTable: replacement and revalidation
// =============================================================================

#[test]
fn test_failed_tail_replaced_by_queued_peer() {
    let mut table = table();
    let p1 = peer_at(0, 1, 0);
    let p2 = peer_at(0, 2, 0);
    let p3 = peer_at(0, 3, 0);

    table.add_peer(p1.clone(), Timestamp::from_millis(1)).unwrap();
    table.add_peer(p2.clone(), Timestamp::from_millis(2)).unwrap();
    assert_eq!(
        table.add_peer(p3.clone(), Timestamp::from_millis(3)),
        Ok(AddOutcome::QueuedAsReplacement)
    );
    assert!(!table.contains(p3.identity()));

    let candidate = table.peer_to_revalidate().unwrap();
    assert_eq!(candidate, p2, "tail member is revalidated");

    let promoted = table.pick_replacement(candidate.identity(), Timestamp::from_millis(4));

    assert_eq!(promoted, Some(p3.clone()));
    let bucket = table.bucket_by_index(0).unwrap();
    assert_eq!(bucket_ids(bucket), ids(&[p3, p1]));
    assert!(!table.contains(p2.identity()));
    assert!(!bucket.has_replacements());
}

#[test]
fn test_full_bucket_without_replacements_not_revalidated() {
    let mut table = table();
    table.add_peer(peer_at(0, 1, 0), Timestamp::from_millis(1)).unwrap();
    table.add_peer(peer_at(0, 2, 0), Timestamp::from_millis(2)).unwrap();

    assert!(table.bucket_by_index(0).unwrap().is_full());
    assert_eq!(table.peer_to_revalidate(), None);
}

#[test]
fn test_revalidation_scan_wraps_around() {
    let mut table = table();
    for tag in 1..=3 {
        table.add_peer(peer_at(4, tag, 0), Timestamp::from_millis(tag as u64)).unwrap();
    }

    // Bucket 4 holds tags 1 and 2; tag 3 waits as replacement
    let expected = Some(peer_at(4, 2, 0));
    assert_eq!(table.peer_to_revalidate_from(0), expected);
    assert_eq!(table.peer_to_revalidate_from(4), expected);
    assert_eq!(table.peer_to_revalidate_from(200), expected);
}

// =============================================================================
// RoutingTable: queries
// =============================================================================

#[test]
fn test_closest_peers_ordered_by_xor() {
    let mut table = RoutingTable::new(owner(), KademliaConfig::default());
    let peers: Vec<Peer> = (0..6).map(|d| peer_at(d * 10, 1, 0)).collect();
    for p in &peers {
        table.add_peer(p.clone(), Timestamp::from_millis(1)).unwrap();
    }

    // Target sits inside bucket 50's subtree
    let target = *peer_at(50, 7, 0).identity();
    let closest = table.closest_peers(&target, 3);

    assert_eq!(closest.len(), 3);
    assert_eq!(closest[0], peer_at(50, 1, 0));
    for pair in closest.windows(2) {
        assert!(target.xor(pair[0].identity()) < target.xor(pair[1].identity()));
    }
    assert_eq!(table.closest_peers(&target, 100).len(), 6);
}

#[test]
fn test_latest_peers_strictly_after_since() {
    let mut table = RoutingTable::new(owner(), KademliaConfig::default());
    table.add_peer(peer_at(1, 1, 0), Timestamp::from_millis(100)).unwrap();
    table.add_peer(peer_at(2, 1, 0), Timestamp::from_millis(200)).unwrap();
    table.add_peer(peer_at(3, 1, 0), Timestamp::from_millis(300)).unwrap();

    let latest = table.latest_peers(Timestamp::from_millis(200));
    assert_eq!(latest, vec![peer_at(3, 1, 0)]);

    let latest = table.latest_peers(Timestamp::from_millis(99));
    assert_eq!(ids(&latest), ids(&[peer_at(3, 1, 0), peer_at(2, 1, 0), peer_at(1, 1, 0)]));

    assert!(table.latest_peers(Timestamp::from_millis(300)).is_empty());
}

#[test]
fn test_addresses_and_uris() {
    let mut table = table();
    let p = Peer::parse("ynode://ab12@10.0.0.9:32918", Timestamp::from_millis(0)).unwrap();
    table.add_peer(p, Timestamp::from_millis(1)).unwrap();

    assert_eq!(table.all_peer_addresses(), vec!["10.0.0.9:32918".to_string()]);
    assert_eq!(table.peer_uris(), vec!["ynode://ab12@10.0.0.9:32918".to_string()]);
}

#[test]
fn test_stats() {
    let mut table = table();
    table.add_peer(peer_at(0, 1, 0), Timestamp::from_millis(100)).unwrap();
    table.add_peer(peer_at(0, 2, 0), Timestamp::from_millis(400)).unwrap();
    table.add_peer(peer_at(0, 3, 0), Timestamp::from_millis(500)).unwrap();
    table.add_peer(peer_at(7, 1, 0), Timestamp::from_millis(600)).unwrap();

    let stats = table.stats(Timestamp::from_millis(1000));

    assert_eq!(stats.total_peers, 3);
    assert_eq!(stats.buckets_used, 2);
    assert_eq!(stats.replacement_count, 1);
    assert_eq!(stats.oldest_peer_age_ms, 900);
}

// =============================================================================
// RoutingTable: persistence
// =============================================================================

#[test]
fn test_copy_live_peers_uses_age_threshold() {
    let mut table = RoutingTable::new(owner(), KademliaConfig::default());
    let stale = peer_at(1, 1, 0);
    let fresh = peer_at(2, 1, 0);
    table.add_peer(stale.clone(), Timestamp::from_millis(1_000)).unwrap();
    table.add_peer(fresh.clone(), Timestamp::from_millis(50_000)).unwrap();

    let network = NetworkId::from_name("yggdrash");
    let store = InMemoryPeerStore::new();

    let copied = table
        .copy_live_peers(&network, &store, Timestamp::from_millis(60_000), 30_000)
        .unwrap();

    assert_eq!(copied, 1);
    assert_eq!(store.size(&network).unwrap(), 1);
    assert!(store.contains(&network, stale.identity()).unwrap());
    assert!(!store.contains(&network, fresh.identity()).unwrap());
}
