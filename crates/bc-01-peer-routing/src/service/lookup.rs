//! Network lookups: self refresh and iterative refresh toward a target.

use std::collections::HashSet;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, trace};

use super::core::PeerTableGroup;
use crate::domain::{AddOutcome, NetworkId, Peer, PeerIdentity, Pong};
use crate::ports::DialError;

/// What a lookup did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupReport {
    /// Query rounds issued
    pub rounds: usize,
    /// Peers that answered
    pub queried: usize,
    /// Peers that failed or timed out
    pub failed: usize,
    /// Peers that became new table members
    pub discovered: usize,
}

impl LookupReport {
    fn absorb(&mut self, other: LookupReport) {
        self.rounds += other.rounds;
        self.queried += other.queried;
        self.failed += other.failed;
        self.discovered += other.discovered;
    }
}

impl PeerTableGroup {
    /// Ping `to` with the RPC deadline applied.
    pub(crate) async fn ping(&self, network: &NetworkId, to: &Peer) -> Result<Pong, DialError> {
        match timeout(self.config.rpc_timeout, self.dialer.ping(network, &self.owner, to)).await {
            Ok(result) => result,
            Err(_) => Err(DialError::Timeout),
        }
    }

    /// Ask `remote` for peers near `target` with the RPC deadline applied.
    async fn find_peers(
        &self,
        network: &NetworkId,
        remote: &Peer,
        target: &PeerIdentity,
    ) -> Result<Vec<Peer>, DialError> {
        match timeout(
            self.config.rpc_timeout,
            self.dialer.find_peers(network, remote, target),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DialError::Timeout),
        }
    }

    /// Query `batch` concurrently and merge every answer into the table.
    async fn query_round(
        &self,
        network: &NetworkId,
        batch: &[Peer],
        target: &PeerIdentity,
    ) -> LookupReport {
        let queries = batch
            .iter()
            .map(|peer| self.find_peers(network, peer, target));
        let answers = join_all(queries).await;

        let mut report = LookupReport {
            rounds: usize::from(!batch.is_empty()),
            ..LookupReport::default()
        };
        for (peer, answer) in batch.iter().zip(answers) {
            match answer {
                Ok(found) => {
                    trace!("[bc-01] {} returned {} peers", peer.address(), found.len());
                    report.queried += 1;
                    report.discovered += self.merge(network, found);
                }
                Err(e) => {
                    debug!("[bc-01] find_peers to {} failed: {}", peer.address(), e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Add lookup results to the table; returns how many became members.
    fn merge(&self, network: &NetworkId, found: Vec<Peer>) -> usize {
        let now = self.now();
        let owner_address = self.owner.address();
        let table = self.create_table(network);
        let mut table = table.lock();

        let added = found
            .into_iter()
            .filter(|peer| peer.address() != owner_address)
            .filter_map(|peer| table.add_peer(peer, now).ok())
            .filter(|outcome| *outcome == AddOutcome::Added)
            .count();
        added
    }

    /// Ask every known peer of `network` for the peers closest to us.
    ///
    /// Bootstraps the table first if it is empty. One round, no iteration.
    pub async fn self_refresh(&self, network: &NetworkId) -> LookupReport {
        let table = self.create_table(network);
        if table.lock().is_empty() {
            self.bootstrap(network);
        }
        let peers = table.lock().all_peers();

        let target = *self.owner.identity();
        let report = self.query_round(network, &peers, &target).await;
        debug!(
            "[bc-01] Self refresh of {}: {} answered, {} failed, {} new",
            network, report.queried, report.failed, report.discovered
        );
        report
    }

    /// Self refresh every network.
    pub async fn self_refresh_all(&self) -> LookupReport {
        let mut total = LookupReport::default();
        for network in self.networks() {
            total.absorb(self.self_refresh(&network).await);
        }
        total
    }

    /// Iterative lookup of `target` in `network`.
    ///
    /// Each round queries up to `alpha` of the closest peers not yet asked.
    /// The lookup ends when a round does not bring a strictly closer peer,
    /// when every close peer has been asked, or after `max_lookup_rounds`.
    pub async fn refresh(&self, network: &NetworkId, target: &PeerIdentity) -> LookupReport {
        let k = self.config.kademlia.bucket_size;
        let alpha = self.config.kademlia.alpha;
        let table = self.create_table(network);

        let mut report = LookupReport::default();
        let mut closest = table.lock().closest_peers(target, k);
        if closest.is_empty() {
            report.absorb(self.self_refresh(network).await);
            closest = table.lock().closest_peers(target, k);
        }

        let mut asked: HashSet<PeerIdentity> = HashSet::new();
        let mut best = closest.first().map(|p| target.xor(p.identity()));

        for _ in 0..self.config.kademlia.max_lookup_rounds {
            let batch: Vec<Peer> = closest
                .iter()
                .filter(|p| !asked.contains(p.identity()))
                .take(alpha)
                .cloned()
                .collect();
            if batch.is_empty() {
                break;
            }
            asked.extend(batch.iter().map(|p| *p.identity()));

            report.absorb(self.query_round(network, &batch, target).await);

            closest = table.lock().closest_peers(target, k);
            let round_best = closest.first().map(|p| target.xor(p.identity()));
            let improved = match (best, round_best) {
                (Some(before), Some(after)) => after < before,
                (None, Some(_)) => true,
                _ => false,
            };
            best = round_best;
            if !improved {
                break;
            }
        }

        debug!(
            "[bc-01] Lookup of {} in {}: {} rounds, {} answered, {} failed, {} new",
            target.short(),
            network,
            report.rounds,
            report.queried,
            report.failed,
            report.discovered
        );
        report
    }

    /// Lookup of a fresh random target in every network.
    pub async fn refresh_all(&self) -> LookupReport {
        let mut total = LookupReport::default();
        for network in self.networks() {
            let target = PeerIdentity::random();
            total.absorb(self.refresh(&network, &target).await);
        }
        if total.discovered > 0 {
            info!("[bc-01] Refresh discovered {} new peers", total.discovered);
        }
        total
    }
}
