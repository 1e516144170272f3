//! Routing table statistics.

/// Snapshot of a routing table, for diagnostics endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTableStats {
    /// Total number of peers in buckets
    pub total_peers: usize,
    /// Number of buckets with at least one peer
    pub buckets_used: usize,
    /// Peers waiting on replacement lists
    pub replacement_count: usize,
    /// Age of the least recently seen peer in milliseconds
    pub oldest_peer_age_ms: u64,
}
