//! Counting Bloom filter: each bin is a small saturating counter instead of
//! a single bit, supporting insertion with a multiplicity, decrement, and a
//! minimum-of-counters value query.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::envelope::{self, TYPE_COUNTING};
use crate::error::{BloomError, Result};
use crate::hash;
use crate::params::Params;

/// Encode `v` as `n` little-endian octets. `v` must be representable in `n`
/// bytes (`v < 256^n`).
pub fn int_to_bytes(v: u64, n: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        out.push(((v >> (8 * i)) & 0xff) as u8);
    }
    out
}

/// Decode `n`-byte little-endian unsigned integer.
pub fn bytes_to_int(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | ((b as u64) << (8 * i)))
}

fn bin_bytes_for(bin_size: u32) -> usize {
    let mut n = 1;
    while 256u64.pow(n as u32) < bin_size as u64 + 1 {
        n += 1;
    }
    n
}

/// A Bloom filter whose bins are saturating counters rather than single bits.
///
/// ```
/// use bloomtrio::CountingBloom;
///
/// let mut cb = CountingBloom::new(1000, 0.01, 10).unwrap();
/// cb.add(b"test", 3);
/// assert_eq!(cb.value(b"test"), 3);
/// cb.add(b"test", 2);
/// assert_eq!(cb.value(b"test"), 5);
/// ```
pub struct CountingBloom {
    params: Params,
    bin_size: u32,
    bin_bytes: usize,
    bf: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct CountingBody {
    capacity: usize,
    error_ratio: f64,
    bins: usize,
    hashes: usize,
    bin_size: u32,
    bin_bytes: usize,
    bf: String,
}

impl CountingBloom {
    /// Create a new counting filter. `bin_size` is the per-counter
    /// saturation ceiling and must be in `[1, 255]`.
    pub fn new(capacity: usize, error_ratio: f64, bin_size: u32) -> Result<CountingBloom> {
        if !(1..=255).contains(&bin_size) {
            return Err(BloomError::InvalidParameters {
                reason: format!("bin_size must be in [1, 255], got {bin_size}"),
            });
        }

        let params = Params::new(capacity, error_ratio)?;
        let bin_bytes = bin_bytes_for(bin_size);

        tracing::debug!(
            capacity,
            error_ratio,
            bins = params.bins,
            hashes = params.hashes,
            bin_size,
            "new counting bloom filter"
        );

        Ok(CountingBloom {
            bf: vec![0u8; params.bins * bin_bytes],
            params,
            bin_size,
            bin_bytes,
        })
    }

    pub fn capacity(&self) -> usize {
        self.params.capacity
    }

    pub fn hashes(&self) -> usize {
        self.params.hashes
    }

    pub fn len(&self) -> usize {
        self.params.bins
    }

    pub fn is_empty(&self) -> bool {
        self.bf.iter().all(|&b| b == 0)
    }

    pub fn bin_size(&self) -> u32 {
        self.bin_size
    }

    fn positions(&self, item: &[u8]) -> Vec<usize> {
        hash::indexes(item, self.params.hashes, self.params.bins)
    }

    fn counter_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = index * self.bin_bytes;
        start..start + self.bin_bytes
    }

    /// Direct counter read by bin index (not by key). Used by diagnostics
    /// and by tests exercising the saturation edges directly.
    pub fn bin(&self, index: usize) -> u64 {
        bytes_to_int(&self.bf[self.counter_range(index)])
    }

    /// Direct counter increment by bin index, saturating at `bin_size`.
    pub fn increment_bin(&mut self, index: usize, amount: u64) {
        let current = self.bin(index);
        let next = (current + amount).min(self.bin_size as u64);
        let bytes = int_to_bytes(next, self.bin_bytes);
        self.bf[self.counter_range(index)].copy_from_slice(&bytes);
    }

    /// Direct counter decrement by bin index, saturating at 0.
    pub fn decrement_bin(&mut self, index: usize, amount: u64) {
        let current = self.bin(index);
        let next = current.saturating_sub(amount);
        let bytes = int_to_bytes(next, self.bin_bytes);
        self.bf[self.counter_range(index)].copy_from_slice(&bytes);
    }

    /// Add `amount` to each of `item`'s counters, saturating at `bin_size`.
    /// Always succeeds for this in-memory backing store.
    pub fn add(&mut self, item: &[u8], amount: u64) -> bool {
        tracing::trace!(bytes = item.len(), amount, "counting bloom add");
        for pos in self.positions(item) {
            self.increment_bin(pos, amount);
        }
        true
    }

    /// Subtract `amount` from each of `item`'s counters, saturating at 0.
    /// No aliasing correction: decrementing a never-inserted key may
    /// corrupt counters shared with other keys.
    pub fn decrement(&mut self, item: &[u8], amount: u64) {
        for pos in self.positions(item) {
            self.decrement_bin(pos, amount);
        }
    }

    /// Minimum of `item`'s counters. Zero is a definitive absence.
    pub fn value(&self, item: &[u8]) -> u64 {
        self.positions(item)
            .iter()
            .map(|&pos| self.bin(pos))
            .min()
            .unwrap_or(0)
    }

    /// `value(item) >= trigger`.
    pub fn check(&self, item: &[u8], trigger: u64) -> bool {
        self.value(item) >= trigger
    }

    /// Alias for `check(item, 1)`.
    pub fn contains(&self, item: &[u8]) -> bool {
        self.check(item, 1)
    }

    /// Reset every counter to zero.
    pub fn zero(&mut self) {
        self.bf.iter_mut().for_each(|b| *b = 0);
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let body = CountingBody {
            capacity: self.params.capacity,
            error_ratio: self.params.error_ratio,
            bins: self.params.bins,
            hashes: self.params.hashes,
            bin_size: self.bin_size,
            bin_bytes: self.bin_bytes,
            bf: envelope::to_hex(&self.bf),
        };
        envelope::save(path.as_ref(), TYPE_COUNTING, &body)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<CountingBloom> {
        let body: CountingBody = envelope::load(path.as_ref(), TYPE_COUNTING)?;
        let bf = envelope::from_hex(&body.bf)?;

        Ok(CountingBloom {
            params: Params {
                capacity: body.capacity,
                error_ratio: body.error_ratio,
                bins: body.bins,
                hashes: body.hashes,
            },
            bin_size: body.bin_size,
            bin_bytes: body.bin_bytes,
            bf,
        })
    }
}
