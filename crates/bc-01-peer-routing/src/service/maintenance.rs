use tracing::{debug, warn};

use super::core::PeerTableGroup;

impl PeerTableGroup {
    /// Persist long-lived members of every table.
    ///
    /// A member qualifies once its `last_seen` is older than the configured
    /// `live_peer_age`. Store failures are logged and skip the rest of that
    /// network. Returns the number of peers written.
    pub fn copy_live_node(&self) -> usize {
        let now = self.now();
        let age_ms = u64::try_from(self.config.live_peer_age.as_millis()).unwrap_or(u64::MAX);
        let mut copied = 0;

        for network in self.networks() {
            let Some(table) = self.table(&network) else {
                continue;
            };
            let result = table
                .lock()
                .copy_live_peers(&network, self.store.as_ref(), now, age_ms);
            match result {
                Ok(count) => copied += count,
                Err(e) => warn!("[bc-01] Failed to persist peers of {}: {}", network, e),
            }
        }

        debug!("[bc-01] Persisted {} live peers", copied);
        copied
    }
}
