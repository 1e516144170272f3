//! Periodic maintenance of the peer tables.
//!
//! Independent loops share one [`PeerTableGroup`]:
//!
//! | Loop          | Default period | Work                                    |
//! |---------------|----------------|-----------------------------------------|
//! | health check  | 2s             | ping one revalidation candidate / table |
//! | refresh       | 7s             | lookup of a random target               |
//! | self refresh  | 60s            | ask known peers for our neighbourhood   |
//! | copy live     | 30s            | persist long-lived peers                |
//! | keep alive    | 60s            | ping every seed on every network        |
//!
//! Seed nodes do not run the keep-alive loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::core::PeerTableGroup;
use crate::domain::{NetworkId, Peer};

/// Result of one revalidation ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheck {
    /// Candidate answered and was bumped.
    Alive(Peer),
    /// Candidate failed; `promoted` took its slot, if a replacement existed.
    Replaced {
        /// The peer that did not answer
        failed: Peer,
        /// Replacement moved into the bucket
        promoted: Option<Peer>,
    },
}

/// Background driver for health checks, refreshes and persistence.
#[derive(Clone)]
pub struct PeerTask {
    group: Arc<PeerTableGroup>,
}

impl PeerTask {
    /// Create a task driver over `group`.
    pub fn new(group: Arc<PeerTableGroup>) -> Self {
        Self { group }
    }

    /// The driven group.
    pub fn group(&self) -> &Arc<PeerTableGroup> {
        &self.group
    }

    /// Revalidate one peer of `network`.
    ///
    /// Returns `None` if the network is unknown or no bucket has a
    /// replacement waiting.
    pub async fn health_check_network(&self, network: &NetworkId) -> Option<HealthCheck> {
        let table = self.group.table(network)?;
        let candidate = table.lock().peer_to_revalidate()?;

        match self.group.ping(network, &candidate).await {
            Ok(_) => {
                let now = self.group.now();
                table.lock().bump(candidate.identity(), now);
                debug!("[bc-01] {} is alive", candidate.address());
                Some(HealthCheck::Alive(candidate))
            }
            Err(e) => {
                let now = self.group.now();
                let promoted = table.lock().pick_replacement(candidate.identity(), now);
                match &promoted {
                    Some(replacement) => info!(
                        "[bc-01] Replaced {} ({}) with {} in {}",
                        candidate.address(),
                        e,
                        replacement.address(),
                        network
                    ),
                    None => info!(
                        "[bc-01] Dropped {} ({}) from {}",
                        candidate.address(),
                        e,
                        network
                    ),
                }
                Some(HealthCheck::Replaced {
                    failed: candidate,
                    promoted,
                })
            }
        }
    }

    /// Revalidate one peer per network.
    pub async fn health_check(&self) -> Vec<(NetworkId, HealthCheck)> {
        let mut results = Vec::new();
        for network in self.group.networks() {
            if let Some(outcome) = self.health_check_network(&network).await {
                results.push((network, outcome));
            }
        }
        results
    }

    /// Ping every configured seed on every network.
    ///
    /// Keeps our node known to the seeds. Answers do not change the tables.
    /// Returns how many pings were answered; a seed node pings nobody.
    pub async fn keep_alive_seeds(&self) -> usize {
        if self.group.config().is_seed_node {
            return 0;
        }

        let owner = self.group.owner();
        let seeds: Vec<&Peer> = self
            .group
            .seed_peers()
            .iter()
            .filter(|seed| seed.identity() != owner.identity())
            .filter(|seed| seed.address() != owner.address())
            .collect();

        let mut answered = 0;
        for network in self.group.networks() {
            let pings = seeds.iter().map(|seed| self.group.ping(&network, seed));
            for (seed, result) in seeds.iter().zip(join_all(pings).await) {
                match result {
                    Ok(_) => answered += 1,
                    Err(e) => warn!(
                        "[bc-01] Keep-alive to seed {} on {} failed: {}",
                        seed.address(),
                        network,
                        e
                    ),
                }
            }
        }
        debug!(
            "[bc-01] Keep-alive from {} to {} seeds: {} answered",
            owner.address(),
            seeds.len(),
            answered
        );
        answered
    }

    /// Start all loops. They stop once `shutdown` turns `true` or its sender
    /// is dropped.
    pub fn spawn(&self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let config = self.group.config();
        info!("[bc-01] Starting peer tasks");

        let mut handles = vec![
            self.spawn_loop(
                "health_check",
                config.health_check_interval,
                shutdown.clone(),
                |task| async move {
                    task.health_check().await;
                },
            ),
            self.spawn_loop(
                "refresh",
                config.refresh_interval,
                shutdown.clone(),
                |task| async move {
                    task.group.refresh_all().await;
                },
            ),
            self.spawn_loop(
                "self_refresh",
                config.self_refresh_interval,
                shutdown.clone(),
                |task| async move {
                    task.group.self_refresh_all().await;
                },
            ),
            self.spawn_loop(
                "copy_live_node",
                config.copy_live_interval,
                shutdown.clone(),
                |task| async move {
                    task.group.copy_live_node();
                },
            ),
        ];

        if config.is_seed_node {
            debug!("[bc-01] Seed node, keep-alive loop disabled");
        } else {
            handles.push(self.spawn_loop(
                "keep_alive_seeds",
                config.keep_alive_interval,
                shutdown,
                |task| async move {
                    task.keep_alive_seeds().await;
                },
            ));
        }
        handles
    }

    fn spawn_loop<F, Fut>(
        &self,
        name: &'static str,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
        job: F,
    ) -> JoinHandle<()>
    where
        F: Fn(PeerTask) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => job(task.clone()).await,
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("[bc-01] {} loop stopped", name);
        })
    }
}
