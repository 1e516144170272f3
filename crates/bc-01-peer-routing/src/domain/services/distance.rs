//! Kademlia distance calculations.

use std::cmp::Ordering;

use crate::domain::{Distance, PeerIdentity};

/// Count the leading bits shared by `a` and `b`.
///
/// # Properties
/// - Symmetric: `common_prefix_len(a, b) == common_prefix_len(b, a)`
/// - Self: `common_prefix_len(a, a) == Distance::IDENTICAL` (256)
/// - Equivalent to `256 - highest_set_bit(a XOR b) - 1` for `a != b`
pub fn common_prefix_len(a: &PeerIdentity, b: &PeerIdentity) -> Distance {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    for i in 0..32 {
        let xor = a_bytes[i] ^ b_bytes[i];
        if xor != 0 {
            return Distance::new((i as u16) * 8 + xor.leading_zeros() as u16);
        }
    }

    Distance::IDENTICAL
}

/// Bucket index of `remote` in the table owned by `local`.
#[inline]
pub fn bucket_index(local: &PeerIdentity, remote: &PeerIdentity) -> usize {
    common_prefix_len(local, remote).bucket_index()
}

/// Compare `a` and `b` by XOR closeness to `target` (closer is `Less`).
///
/// Ties cannot occur for distinct identities; equal XOR means `a == b`, so
/// the identity bytes break the remaining tie deterministically.
pub fn cmp_by_distance(target: &PeerIdentity, a: &PeerIdentity, b: &PeerIdentity) -> Ordering {
    target
        .xor(a)
        .cmp(&target.xor(b))
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}
