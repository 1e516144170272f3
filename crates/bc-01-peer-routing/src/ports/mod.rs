//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** handlers the transport layer calls when a
//!   remote peer talks to us, plus diagnostics for the gateway
//! - **Driven Ports (Outbound):** transport, persistence, clock and
//!   configuration this subsystem requires from adapters

pub mod inbound;
pub mod outbound;

pub use inbound::PeerDiscoveryApi;
pub use outbound::{ConfigProvider, DialError, PeerDialer, PeerStore, StoreError, TimeSource};
