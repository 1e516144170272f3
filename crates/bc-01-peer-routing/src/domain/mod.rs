//! Domain Layer - Pure business logic with no I/O
//!
//! This module contains the core Kademlia routing logic:
//! - Peer identities, URIs and shared-prefix distance
//! - Closeness and recency orderings
//! - K-buckets with replacement lists
//! - The per-network routing table

pub mod routing_table;
pub mod services;
/// Core domain types (entities, values, errors)
pub mod types;

pub use routing_table::*;
pub use services::*;
pub use types::*;
