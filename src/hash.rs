//! Hash/Index Service: derives `K` approximately-independent index streams
//! from an input byte string.
//!
//! Each variant (classic, counting, scalable) calls [`indexes`] with its own
//! bin count and hash count; nothing below this module knows it is backing a
//! Bloom filter.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// The `i`'th digest of `item`, per the reference construction
/// `d_i = H(i_be32 || item)`. `H` is xxh3-64, a stable non-cryptographic
/// hash; any input string and index produce the same digest on every
/// platform and every run.
pub fn digest(item: &[u8], i: u32) -> u64 {
    let mut buf = Vec::with_capacity(4 + item.len());
    buf.extend_from_slice(&i.to_be_bytes());
    buf.extend_from_slice(item);
    xxh3_64_with_seed(&buf, 0)
}

/// The `hashes` bin positions for `item` in a storage of `bins` bins.
/// Positions may repeat across hashes; callers tolerate this.
pub fn indexes(item: &[u8], hashes: usize, bins: usize) -> Vec<usize> {
    debug_assert!(hashes >= 1);
    debug_assert!(bins >= 1);

    (0..hashes as u32)
        .map(|i| (digest(item, i) % bins as u64) as usize)
        .collect()
}
