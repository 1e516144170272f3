//! Test utilities for peer routing.
//!
//! Deterministic clocks and a scripted dialer. Enable with the `test-utils`
//! feature flag.
//!
//! # Example
//!
//! ```rust
//! use bc_01_peer_routing::test_utils::FixedTimeSource;
//! use bc_01_peer_routing::ports::TimeSource;
//!
//! let time_source = FixedTimeSource::new(1000);
//! assert_eq!(time_source.now().as_millis(), 1000);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{NetworkId, Peer, PeerIdentity, Pong, Timestamp};
use crate::ports::{DialError, PeerDialer, TimeSource};

/// A time source that returns a fixed timestamp (milliseconds).
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    timestamp: u64,
}

impl FixedTimeSource {
    /// Create a new fixed time source.
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }

    /// Get the configured timestamp value.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.timestamp)
    }
}

/// A time source tests can move forward.
#[derive(Debug, Default)]
pub struct ControllableTimeSource {
    millis: AtomicU64,
}

impl ControllableTimeSource {
    /// Start at `millis`.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(by, Ordering::SeqCst);
    }

    /// Jump to `millis`.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ControllableTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Scripted in-process dialer.
///
/// Every peer answers pings and returns no peers unless told otherwise.
/// Calls are recorded so tests can assert on traffic.
#[derive(Debug, Default)]
pub struct MockDialer {
    answers: Mutex<HashMap<PeerIdentity, Vec<Peer>>>,
    unreachable: Mutex<HashSet<PeerIdentity>>,
    delays: Mutex<HashMap<PeerIdentity, Duration>>,
    active: Mutex<Vec<String>>,
    pings: Mutex<Vec<PeerIdentity>>,
    finds: Mutex<Vec<(PeerIdentity, PeerIdentity)>>,
}

impl MockDialer {
    /// Create a dialer where every peer is reachable and knows nobody.
    pub fn new() -> Self {
        Self::default()
    }

    /// `remote` answers every `find_peers` with `peers`.
    pub fn with_answer(self, remote: &Peer, peers: Vec<Peer>) -> Self {
        self.set_answer(remote, peers);
        self
    }

    /// Replace the `find_peers` answer of `remote`.
    pub fn set_answer(&self, remote: &Peer, peers: Vec<Peer>) {
        self.answers.lock().insert(*remote.identity(), peers);
    }

    /// Make every call to `remote` fail with `Unreachable`.
    pub fn set_unreachable(&self, remote: &Peer) {
        self.unreachable.lock().insert(*remote.identity());
    }

    /// Delay every answer of `remote`.
    pub fn set_delay(&self, remote: &Peer, delay: Duration) {
        self.delays.lock().insert(*remote.identity(), delay);
    }

    /// Set the addresses reported by `active_peer_list`.
    pub fn set_active(&self, addresses: Vec<String>) {
        *self.active.lock() = addresses;
    }

    /// Pings sent to `remote` so far.
    pub fn ping_count(&self, remote: &Peer) -> usize {
        self.pings
            .lock()
            .iter()
            .filter(|id| *id == remote.identity())
            .count()
    }

    /// `(remote, target)` of every `find_peers` call so far.
    pub fn find_calls(&self) -> Vec<(PeerIdentity, PeerIdentity)> {
        self.finds.lock().clone()
    }

    async fn respond(&self, remote: &PeerIdentity) -> Result<(), DialError> {
        let delay = self.delays.lock().get(remote).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.lock().contains(remote) {
            return Err(DialError::Unreachable(remote.short()));
        }
        Ok(())
    }
}

#[async_trait]
impl PeerDialer for MockDialer {
    async fn ping(&self, _network: &NetworkId, _from: &Peer, to: &Peer) -> Result<Pong, DialError> {
        self.pings.lock().push(*to.identity());
        self.respond(to.identity()).await?;
        Ok(Pong)
    }

    async fn find_peers(
        &self,
        _network: &NetworkId,
        remote: &Peer,
        target: &PeerIdentity,
    ) -> Result<Vec<Peer>, DialError> {
        self.finds.lock().push((*remote.identity(), *target));
        self.respond(remote.identity()).await?;
        let answer = self.answers.lock().get(remote.identity()).cloned();
        Ok(answer.unwrap_or_default())
    }

    fn active_peer_list(&self) -> Vec<String> {
        self.active.lock().clone()
    }
}
