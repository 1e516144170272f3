//! Routing Table Implementation
//!
//! Per-network Kademlia table: 256 buckets, each with a bounded replacement
//! list used to backfill members that fail their health check.

mod bucket;
mod config;
mod stats;
mod table;

pub use bucket::PeerBucket;
pub use config::NUM_BUCKETS;
pub use stats::RoutingTableStats;
pub use table::RoutingTable;

#[cfg(test)]
mod tests;
