//! Channel identity: stable 32-bit hashes over hierarchical channel names.

use serde::{Deserialize, Serialize};

/// Persisted identity of a rig channel. The hash is the only cross-session
/// identity a channel has; remapping matches purely on id equality, so the
/// hashing function must stay stable across rebuilds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

/// Pluggable hash over a channel's identity string (its full hierarchical
/// path for joints, its plain name for custom channels).
pub type ChannelHasher = fn(&str) -> ChannelId;

/// Default hasher: FNV-1a, 32-bit. Deterministic and dependency-free.
pub fn hash_channel_name(name: &str) -> ChannelId {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut h = OFFSET;
    for b in name.as_bytes() {
        h ^= u32::from(*b);
        h = h.wrapping_mul(PRIME);
    }
    ChannelId(h)
}
