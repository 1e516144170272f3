//! K-Bucket with replacement list.

use std::collections::VecDeque;

use crate::domain::{AddOutcome, Peer, PeerIdentity, Timestamp};

/// A k-bucket storing up to `capacity` peers at one shared-prefix depth.
///
/// Members join at the tail and move to the front whenever they are seen
/// again, so the front holds the most recently confirmed peer and the tail
/// the revalidation candidate. Replacements are kept freshest first.
/// When the bucket is full, newcomers wait on the replacement list instead
/// of evicting a member; a member is only replaced after it fails a health
/// check (see [`PeerBucket::replace`]).
///
/// All operations assume the caller holds the owning table's lock.
#[derive(Debug, Clone)]
pub struct PeerBucket {
    depth: usize,
    capacity: usize,
    pub(crate) peers: VecDeque<Peer>,
    pub(crate) replacements: VecDeque<Peer>,
}

impl PeerBucket {
    /// Create an empty bucket for peers sharing `depth` leading bits with
    /// the owner.
    pub fn new(depth: usize, capacity: usize) -> Self {
        Self {
            depth,
            capacity,
            peers: VecDeque::with_capacity(capacity),
            replacements: VecDeque::new(),
        }
    }

    /// Shared-prefix length of every peer in this bucket.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Maximum members (and maximum replacements).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Check if the bucket has no members.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Check if the bucket is full.
    pub fn is_full(&self) -> bool {
        self.peers.len() >= self.capacity
    }

    /// Members, front to tail.
    pub fn peers(&self) -> impl ExactSizeIterator<Item = &Peer> {
        self.peers.iter()
    }

    /// Replacement candidates, most recently queued first.
    pub fn replacements(&self) -> impl ExactSizeIterator<Item = &Peer> {
        self.replacements.iter()
    }

    /// Whether any replacement candidate is waiting.
    pub fn has_replacements(&self) -> bool {
        !self.replacements.is_empty()
    }

    /// Tail member; the revalidation candidate.
    pub fn last_peer(&self) -> Option<&Peer> {
        self.peers.back()
    }

    /// Check if `id` is a member.
    pub fn contains(&self, id: &PeerIdentity) -> bool {
        self.position(id).is_some()
    }

    /// Check if `id` waits on the replacement list.
    pub fn is_replacement(&self, id: &PeerIdentity) -> bool {
        self.replacements.iter().any(|p| p.identity() == id)
    }

    /// Look up a member by identity.
    pub fn find(&self, id: &PeerIdentity) -> Option<&Peer> {
        self.peers.iter().find(|p| p.identity() == id)
    }

    /// Insert or refresh `peer`.
    ///
    /// - member: moved to the front and touched → `Updated`
    /// - room left: appended at the tail → `Added`
    /// - full: queued at the front of the replacements, evicting the oldest
    ///   replacement if needed → `QueuedAsReplacement`
    pub fn add_peer(&mut self, mut peer: Peer, now: Timestamp) -> AddOutcome {
        if self.bump(peer.identity(), now) {
            return AddOutcome::Updated;
        }

        peer.touch(now);

        if !self.is_full() {
            self.remove_replacement(peer.identity());
            self.peers.push_back(peer);
            self.check_invariants();
            return AddOutcome::Added;
        }

        self.remove_replacement(peer.identity());
        self.replacements.push_front(peer);
        self.replacements.truncate(self.capacity);
        self.check_invariants();
        AddOutcome::QueuedAsReplacement
    }

    /// Remove a member. Replacements are never promoted here.
    pub fn drop_peer(&mut self, id: &PeerIdentity) -> Option<Peer> {
        self.position(id).and_then(|pos| self.peers.remove(pos))
    }

    /// Move a member to the front and touch it. Returns false if absent.
    pub fn bump(&mut self, id: &PeerIdentity, now: Timestamp) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        if let Some(mut peer) = self.peers.remove(pos) {
            peer.touch(now);
            self.peers.push_front(peer);
        }
        true
    }

    /// Swap a member that failed its health check for a replacement.
    ///
    /// Only the tail member is swapped, and only if a replacement is
    /// waiting; the most recently queued replacement takes the front slot.
    /// In every other case `failed` is just dropped (a no-op if absent).
    pub fn replace(&mut self, failed: &PeerIdentity, now: Timestamp) -> Option<Peer> {
        let is_tail = self.last_peer().is_some_and(|p| p.identity() == failed);

        if !is_tail || self.replacements.is_empty() {
            self.drop_peer(failed);
            return None;
        }

        self.peers.pop_back();
        let mut promoted = self.replacements.pop_front()?;
        promoted.touch(now);
        self.peers.push_front(promoted.clone());
        self.check_invariants();
        Some(promoted)
    }

    fn position(&self, id: &PeerIdentity) -> Option<usize> {
        self.peers.iter().position(|p| p.identity() == id)
    }

    fn remove_replacement(&mut self, id: &PeerIdentity) {
        self.replacements.retain(|p| p.identity() != id);
    }

    fn check_invariants(&self) {
        debug_assert!(self.peers.len() <= self.capacity, "bucket over capacity");
        debug_assert!(
            self.replacements.len() <= self.capacity,
            "replacement list over capacity"
        );
        debug_assert!(
            self.replacements
                .iter()
                .all(|r| !self.peers.iter().any(|p| p == r)),
            "peer present in both members and replacements"
        );
    }
}
