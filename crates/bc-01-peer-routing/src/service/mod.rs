//! # Peer Table Service
//!
//! `PeerTableGroup` owns one routing table per network and implements the
//! `PeerDiscoveryApi` handlers. Lookups go out through the `PeerDialer`
//! port; `PeerTask` runs the periodic health check, refreshes and
//! persistence on tokio.

// Semantic submodules
mod api;
mod core;
mod lookup;
mod maintenance;
mod task;

// Re-export public API
pub use core::{PeerTableGroup, SharedTable};
pub use lookup::LookupReport;
pub use task::{HealthCheck, PeerTask};
