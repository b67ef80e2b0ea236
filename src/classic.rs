//! Classic Bloom filter: fixed-capacity membership test with a bounded
//! false-positive ratio.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bit_array::BitArray;
use crate::envelope::{self, TYPE_CLASSIC};
use crate::error::Result;
use crate::hash;
use crate::params::Params;

/// A fixed-capacity Bloom filter.
///
/// ```
/// use bloomtrio::ClassicBloom;
///
/// let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
/// assert!(!bf.check(b"test"));
/// bf.add(b"test");
/// assert!(bf.check(b"test"));
/// ```
pub struct ClassicBloom {
    params: Params,
    bf: BitArray,
}

#[derive(Serialize, Deserialize)]
struct ClassicBody {
    capacity: usize,
    error_ratio: f64,
    bins: usize,
    hashes: usize,
    bf: String,
}

impl ClassicBloom {
    /// Create a new filter provisioned for `capacity` elements at
    /// `error_ratio` false-positive probability.
    pub fn new(capacity: usize, error_ratio: f64) -> Result<ClassicBloom> {
        let params = Params::new(capacity, error_ratio)?;
        tracing::debug!(capacity, error_ratio, bins = params.bins, hashes = params.hashes, "new classic bloom filter");
        Ok(ClassicBloom {
            bf: BitArray::new(params.bins),
            params,
        })
    }

    pub fn capacity(&self) -> usize {
        self.params.capacity
    }

    pub fn error_ratio(&self) -> f64 {
        self.params.error_ratio
    }

    pub fn hashes(&self) -> usize {
        self.params.hashes
    }

    /// Number of addressable bins.
    pub fn len(&self) -> usize {
        self.params.bins
    }

    pub fn is_empty(&self) -> bool {
        self.bf.count_ones() == 0
    }

    fn positions(&self, item: &[u8]) -> Vec<usize> {
        hash::indexes(item, self.params.hashes, self.params.bins)
    }

    /// Set the bits for `item`.
    pub fn add(&mut self, item: &[u8]) {
        tracing::trace!(bytes = item.len(), "classic bloom add");
        for pos in self.positions(item) {
            self.bf.set(pos);
        }
    }

    /// True iff every bit for `item` is set. A definitive negative when
    /// false; a possible false positive when true.
    pub fn check(&self, item: &[u8]) -> bool {
        self.positions(item).iter().all(|&pos| self.bf.get(pos))
    }

    /// Alias for [`ClassicBloom::check`].
    pub fn contains(&self, item: &[u8]) -> bool {
        self.check(item)
    }

    /// `was_present = check(item); if !was_present { add(item) }; was_present`.
    /// Not atomic under concurrent access (§5, §9 open question).
    pub fn check_then_add(&mut self, item: &[u8]) -> bool {
        let was_present = self.check(item);
        if !was_present {
            self.add(item);
        }
        was_present
    }

    /// Fraction of bins currently set, in `[0, 1]`. Diagnostic only.
    pub fn saturation(&self) -> f64 {
        self.bf.count_ones() as f64 / self.params.bins as f64
    }

    /// Clear every bit, returning the filter to its freshly-constructed state.
    pub fn clear(&mut self) {
        for bit in 0..self.bf.width() {
            self.bf.clear(bit);
        }
    }

    /// Persist as a gzip-compressed JSON envelope.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let body = ClassicBody {
            capacity: self.params.capacity,
            error_ratio: self.params.error_ratio,
            bins: self.params.bins,
            hashes: self.params.hashes,
            bf: envelope::to_hex(self.bf.as_bytes()),
        };
        envelope::save(path.as_ref(), TYPE_CLASSIC, &body)
    }

    /// Load a filter previously written by [`ClassicBloom::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<ClassicBloom> {
        let body: ClassicBody = envelope::load(path.as_ref(), TYPE_CLASSIC)?;
        let bytes = envelope::from_hex(&body.bf)?;

        Ok(ClassicBloom {
            params: Params {
                capacity: body.capacity,
                error_ratio: body.error_ratio,
                bins: body.bins,
                hashes: body.hashes,
            },
            bf: BitArray::from_bytes(body.bins, bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_basics_work() {
        let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
        assert!(!bf.check(b"test"));
        bf.add(b"test");
        assert!(bf.check(b"test"));
        assert!(!bf.check(b"not_added"));
    }

    #[test]
    fn rejects_invalid_construction() {
        assert!(ClassicBloom::new(0, 0.01).is_err());
        assert!(ClassicBloom::new(1000, 0.0).is_err());
        assert!(ClassicBloom::new(1000, 1.0).is_err());
    }

    #[test]
    fn check_then_add_reports_prior_state() {
        let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
        assert!(!bf.check_then_add(b"x"));
        assert!(bf.check_then_add(b"x"));
    }

    #[test]
    fn saturation_is_monotonic() {
        let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
        let mut prev = bf.saturation();
        for i in 0..500 {
            bf.add(i.to_string().as_bytes());
            let next = bf.saturation();
            assert!(next >= prev);
            prev = next;
        }
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classic.bloom");

        let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
        bf.add(b"save_test");
        bf.save(&path).unwrap();

        let loaded = ClassicBloom::load(&path).unwrap();
        assert_eq!(loaded.capacity(), bf.capacity());
        assert_eq!(loaded.hashes(), bf.hashes());
        assert_eq!(loaded.len(), bf.len());
        assert!(loaded.check(b"save_test"));
        assert_eq!(loaded.bf.as_bytes(), bf.bf.as_bytes());
    }

    #[test]
    fn clear_resets_every_bit() {
        let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
        bf.add(b"a");
        bf.add(b"b");
        bf.clear();
        assert!(bf.is_empty());
        assert!(!bf.check(b"a"));
        assert!(!bf.check(b"b"));
    }

    #[test]
    fn empirical_false_positive_rate_is_bounded() {
        let capacity = 2000;
        let error_ratio = 0.01;
        let mut bf = ClassicBloom::new(capacity, error_ratio).unwrap();
        for i in 0..capacity {
            bf.add(format!("item-{i}").as_bytes());
        }

        let probes = capacity * 10;
        let false_positives = (0..probes)
            .filter(|i| bf.check(format!("absent-{i}").as_bytes()))
            .count();

        let rate = false_positives as f64 / probes as f64;
        assert!(rate <= error_ratio * 3.0, "observed rate {rate}");
    }
}
