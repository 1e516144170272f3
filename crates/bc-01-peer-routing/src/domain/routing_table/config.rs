//! Routing table constants.

use crate::domain::IDENTITY_BITS;

/// Number of k-buckets (one per possible shared-prefix length)
pub const NUM_BUCKETS: usize = IDENTITY_BITS;
