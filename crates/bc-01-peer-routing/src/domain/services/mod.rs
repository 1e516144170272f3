//! Domain Services - Pure functions for Kademlia operations
//!
//! All functions in this module are pure (no I/O, no state mutation)
//! and deterministic (same inputs → same outputs).

mod distance;
mod sorting;

pub use distance::{bucket_index, cmp_by_distance, common_prefix_len};
pub use sorting::{cmp_by_recency, find_closest, sort_peers_by_distance, sort_peers_by_recency};
