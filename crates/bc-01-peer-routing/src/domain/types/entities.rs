//! Core Domain Entities for Peer Routing
//!
//! A peer is addressed on the wire by its `ynode://PUBKEY@HOST:PORT` URI and
//! routed by a 256-bit identity derived from that URI's authority.

use std::fmt;
use std::hash::{Hash, Hasher};

use rand::RngCore;
use sha3::{Digest, Sha3_256};

use super::errors::PeerDiscoveryError;

/// URI scheme of a Branch-Chain node address.
pub const YNODE_SCHEME: &str = "ynode";

/// Number of bits in a [`PeerIdentity`].
pub const IDENTITY_BITS: usize = 256;

/// 256-bit routing identifier of a peer.
///
/// Derived as SHA3-256 over `pubkey@host:port`, so two endpoints sharing a
/// key but listening on different ports are distinct peers. Identities are
/// compared for routing only through [`PeerIdentity::distance`] and
/// [`PeerIdentity::xor`]; the byte order is used solely as a tie-breaker.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerIdentity(pub [u8; 32]);

impl PeerIdentity {
    /// Create an identity from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the identity of the endpoint `pubkey@host:port`.
    pub fn derive(pubkey: &str, host: &str, port: u16) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(pubkey.as_bytes());
        hasher.update(b"@");
        hasher.update(host.as_bytes());
        hasher.update(b":");
        hasher.update(port.to_string().as_bytes());
        Self(hasher.finalize().into())
    }

    /// A uniformly random identity, used as a lookup target.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Number of leading bits shared with `other`.
    ///
    /// Symmetric. Identical identities share all 256 bits.
    pub fn distance(&self, other: &PeerIdentity) -> Distance {
        crate::domain::services::common_prefix_len(self, other)
    }

    /// Bytewise XOR with `other`; its big-endian magnitude orders peers by
    /// closeness to a target.
    pub fn xor(&self, other: &PeerIdentity) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }
        out
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerIdentity({})", hex::encode(self.0))
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl AsRef<[u8]> for PeerIdentity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Shared-prefix length between two identities.
///
/// Larger means closer. Doubles as the bucket index when one side is the
/// table owner. Ranges over `0..=256`; 256 only for identical identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Distance(pub u16);

impl Distance {
    /// Distance between an identity and itself.
    pub const IDENTICAL: Distance = Distance(IDENTITY_BITS as u16);

    /// Create a new Distance value.
    pub fn new(shared_bits: u16) -> Self {
        Self(shared_bits.min(IDENTITY_BITS as u16))
    }

    /// Number of leading bits shared.
    pub fn shared_bits(&self) -> u16 {
        self.0
    }

    /// Bucket holding a peer at this distance from the owner.
    ///
    /// The identical sentinel maps onto the last bucket.
    pub fn bucket_index(&self) -> usize {
        (self.0 as usize).min(IDENTITY_BITS - 1)
    }
}

/// Identifier of a logical network (branch).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(pub [u8; 20]);

impl NetworkId {
    /// Create a network id from raw bytes.
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive a network id from a human readable branch name.
    pub fn from_name(name: &str) -> Self {
        let digest = Sha3_256::digest(name.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }

    /// Parse a 40-character hex network id.
    pub fn from_hex(s: &str) -> Result<Self, PeerDiscoveryError> {
        let decoded =
            hex::decode(s).map_err(|_| PeerDiscoveryError::InvalidNetworkId(s.to_string()))?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| PeerDiscoveryError::InvalidNetworkId(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// An addressable network endpoint.
///
/// Equality and hashing use the identity only; host, port and `last_seen`
/// are mutable attributes.
#[derive(Debug, Clone)]
pub struct Peer {
    identity: PeerIdentity,
    pubkey: String,
    host: String,
    port: u16,
    /// Last time this peer was added or bumped.
    pub last_seen: Timestamp,
}

impl Peer {
    /// Create a peer from its parts, validating host and port.
    pub fn new(
        pubkey: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        last_seen: Timestamp,
    ) -> Result<Self, PeerDiscoveryError> {
        let pubkey = pubkey.into();
        let host = host.into();

        if pubkey.is_empty() || !pubkey.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PeerDiscoveryError::InvalidPeerUri(format!(
                "public key must be non-empty hex: {pubkey:?}"
            )));
        }
        if host.is_empty() || host.contains(['/', '@', ' ']) {
            return Err(PeerDiscoveryError::InvalidPeerUri(format!(
                "invalid host: {host:?}"
            )));
        }
        if port == 0 {
            return Err(PeerDiscoveryError::InvalidPort(port.to_string()));
        }

        Ok(Self {
            identity: PeerIdentity::derive(&pubkey, &host, port),
            pubkey,
            host,
            port,
            last_seen,
        })
    }

    /// Create a peer with an explicit identity.
    ///
    /// Used when the identity is known out of band (tests, fixtures with
    /// hand-picked distances).
    pub fn with_identity(
        identity: PeerIdentity,
        host: impl Into<String>,
        port: u16,
        last_seen: Timestamp,
    ) -> Self {
        Self {
            identity,
            pubkey: hex::encode(identity.0),
            host: host.into(),
            port,
            last_seen,
        }
    }

    /// Parse a `ynode://PUBKEY@HOST:PORT` URI.
    pub fn parse(uri: &str, now: Timestamp) -> Result<Self, PeerDiscoveryError> {
        let invalid = || PeerDiscoveryError::InvalidPeerUri(uri.to_string());

        let (scheme, rest) = uri.split_once("://").ok_or_else(invalid)?;
        if scheme != YNODE_SCHEME {
            return Err(invalid());
        }
        let (pubkey, address) = rest.split_once('@').ok_or_else(invalid)?;
        let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let port: u16 = port
            .parse()
            .map_err(|_| PeerDiscoveryError::InvalidPort(port.to_string()))?;

        Self::new(pubkey, host, port, now)
    }

    /// Routing identity.
    pub fn identity(&self) -> &PeerIdentity {
        &self.identity
    }

    /// Hex public key.
    pub fn pubkey(&self) -> &str {
        &self.pubkey
    }

    /// Host name or IP.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Listening port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `ynode://PUBKEY@HOST:PORT`.
    pub fn uri(&self) -> String {
        format!("{}://{}@{}:{}", YNODE_SCHEME, self.pubkey, self.host, self.port)
    }

    /// Whether this peer listens on a loopback host.
    pub fn is_local(&self) -> bool {
        self.host == "127.0.0.1" || self.host == "localhost"
    }

    /// Refresh `last_seen`.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_seen = now;
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for Peer {}

impl Hash for Peer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Unix timestamp in milliseconds.
///
/// Values are clamped to a reasonable maximum so that arithmetic in age and
/// recency comparisons cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Maximum reasonable timestamp (year 9999).
    pub const MAX_REASONABLE: u64 = 253_402_300_799_000;

    /// Create a new timestamp from milliseconds, clamping to MAX_REASONABLE.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.min(Self::MAX_REASONABLE))
    }

    /// Create a timestamp from whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self::from_millis(secs.saturating_mul(1000))
    }

    /// Milliseconds since the epoch.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Add milliseconds (saturating at MAX_REASONABLE).
    pub fn add_millis(&self, millis: u64) -> Self {
        Self::from_millis(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed between `earlier` and `self` (0 if negative).
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render_uri() {
        let uri = "ynode://75bff16c@127.0.0.1:32918";
        let peer = Peer::parse(uri, Timestamp::from_millis(5)).unwrap();

        assert_eq!(peer.pubkey(), "75bff16c");
        assert_eq!(peer.host(), "127.0.0.1");
        assert_eq!(peer.port(), 32918);
        assert_eq!(peer.uri(), uri);
        assert_eq!(peer.address(), "127.0.0.1:32918");
        assert!(peer.is_local());
    }

    #[test]
    fn test_malformed_uris_are_rejected() {
        let now = Timestamp::default();
        for uri in [
            "http://75bff16c@127.0.0.1:32918",
            "ynode://127.0.0.1:32918",
            "ynode://75bff16c@127.0.0.1",
            "ynode://75bff16c@:32918",
            "ynode://zz@127.0.0.1:32918",
            "75bff16c@127.0.0.1:32918",
        ] {
            assert!(
                matches!(
                    Peer::parse(uri, now),
                    Err(PeerDiscoveryError::InvalidPeerUri(_))
                ),
                "{uri} must be rejected"
            );
        }

        assert!(matches!(
            Peer::parse("ynode://75bff16c@127.0.0.1:99999", now),
            Err(PeerDiscoveryError::InvalidPort(_))
        ));
        assert!(matches!(
            Peer::parse("ynode://75bff16c@127.0.0.1:0", now),
            Err(PeerDiscoveryError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_peer_equality_ignores_mutable_attributes() {
        let mut a = Peer::parse("ynode://75bff16c@127.0.0.1:32918", Timestamp::from_millis(1))
            .unwrap();
        let b = Peer::parse("ynode://75bff16c@127.0.0.1:32918", Timestamp::from_millis(9))
            .unwrap();
        a.touch(Timestamp::from_millis(100));

        assert_eq!(a, b);
    }

    #[test]
    fn test_same_key_different_port_is_distinct_peer() {
        let a = Peer::parse("ynode://75bff16c@127.0.0.1:32918", Timestamp::default()).unwrap();
        let b = Peer::parse("ynode://75bff16c@127.0.0.1:32919", Timestamp::default()).unwrap();

        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_debug_shows_every_byte() {
        let mut a = [0u8; 32];
        a[0] = 0x80;
        let mut b = a;
        b[31] = 0x02;

        let debug_a = format!("{:?}", PeerIdentity::new(a));
        let debug_b = format!("{:?}", PeerIdentity::new(b));

        assert_ne!(debug_a, debug_b);
        assert!(debug_b.ends_with("02)"));
        assert_eq!(debug_b.len(), "PeerIdentity()".len() + 64);
    }

    #[test]
    fn test_network_id_hex_round_trip() {
        let id = NetworkId::from_name("yeed");
        assert_eq!(NetworkId::from_hex(&id.to_string()).unwrap(), id);
        assert!(NetworkId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let ts = Timestamp::from_secs(100);
        assert_eq!(ts.as_millis(), 100_000);
        assert_eq!(ts.add_millis(50).millis_since(ts), 50);
        assert_eq!(ts.millis_since(ts.add_millis(50)), 0);
    }
}
