//! Scalable Bloom filter: an ordered sequence of classic inner filters that
//! preserves an overall false-positive bound as insertions accumulate
//! beyond any single filter's fixed capacity.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bit_array::BitArray;
use crate::envelope::{self, TYPE_SCALABLE};
use crate::error::{BloomError, Result};
use crate::hash;
use crate::params::{hashes_from_error_ratio, Params};

/// Tunable knobs for a scalable filter, with the defaults from §3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalableConfig {
    /// Bin count of the first inner filter.
    pub initial_size: usize,
    /// Growth multiplier applied to each successive inner filter's bin count.
    pub growth_factor: u32,
    /// Upper bound on the combined false-positive probability, E.
    pub max_error: f64,
    /// Geometric decay rate `r` applied to each successive inner filter's
    /// target error.
    pub error_decay_rate: f64,
}

impl Default for ScalableConfig {
    fn default() -> Self {
        ScalableConfig {
            initial_size: 131_072,
            growth_factor: 4,
            max_error: 1e-15,
            error_decay_rate: 0.5,
        }
    }
}

impl ScalableConfig {
    fn validate(&self) -> Result<()> {
        if self.initial_size == 0 {
            return Err(BloomError::InvalidParameters {
                reason: "initial_size must be >= 1".into(),
            });
        }
        if self.growth_factor < 1 {
            return Err(BloomError::InvalidParameters {
                reason: "growth_factor must be >= 1".into(),
            });
        }
        if !(self.max_error > 0.0 && self.max_error < 1.0) {
            return Err(BloomError::InvalidParameters {
                reason: format!("max_error must be in (0, 1), got {}", self.max_error),
            });
        }
        if !(self.error_decay_rate > 0.0 && self.error_decay_rate < 1.0) {
            return Err(BloomError::InvalidParameters {
                reason: format!(
                    "error_decay_rate must be in (0, 1), got {}",
                    self.error_decay_rate
                ),
            });
        }
        Ok(())
    }

    /// The target error of the first inner filter, `e0 = (1 - r) * E`.
    fn initial_error(&self) -> f64 {
        (1.0 - self.error_decay_rate) * self.max_error
    }
}

struct Inner {
    bins: usize,
    hashes: usize,
    bits: BitArray,
}

impl Inner {
    fn new(bins: usize, hashes: usize) -> Inner {
        Inner {
            bins,
            hashes,
            bits: BitArray::new(bins),
        }
    }

    fn positions(&self, item: &[u8]) -> Vec<usize> {
        hash::indexes(item, self.hashes, self.bins)
    }

    fn add(&mut self, item: &[u8]) {
        for pos in self.positions(item) {
            self.bits.set(pos);
        }
    }

    fn check(&self, item: &[u8]) -> bool {
        self.positions(item).iter().all(|&pos| self.bits.get(pos))
    }
}

/// A growing sequence of classic Bloom filters sharing one false-positive
/// budget.
///
/// ```
/// use bloomtrio::{ScalableBloom, ScalableConfig};
///
/// let mut sbf = ScalableBloom::new(ScalableConfig {
///     initial_size: 1000,
///     growth_factor: 2,
///     max_error: 0.01,
///     error_decay_rate: 0.5,
/// }).unwrap();
///
/// sbf.add(b"save_test");
/// assert!(sbf.check(b"save_test"));
/// ```
pub struct ScalableBloom {
    config: ScalableConfig,
    inners: Vec<Inner>,
    elements: usize,
    threshold: usize,
}

#[derive(Serialize, Deserialize)]
struct ScalableBody {
    blooms: usize,
    threshold: usize,
    elements: usize,
    max_error: f64,
    error_decay_rate: f64,
    initial_size: usize,
    growth_factor: u32,
    #[serde(rename = "blooms_list")]
    bins_list: Vec<usize>,
    hashes: Vec<usize>,
    bfs: Vec<String>,
}

impl ScalableBloom {
    /// Create a new scalable filter with a single inner filter sized for
    /// `config.initial_size` bins at the initial target error.
    pub fn new(config: ScalableConfig) -> Result<ScalableBloom> {
        config.validate()?;

        let e0 = config.initial_error();
        let hashes = hashes_from_error_ratio(e0)?;
        let inner = Inner::new(config.initial_size, hashes);
        let threshold = Params::capacity_for(inner.bins, inner.hashes);

        tracing::debug!(
            initial_size = config.initial_size,
            growth_factor = config.growth_factor,
            max_error = config.max_error,
            error_decay_rate = config.error_decay_rate,
            hashes,
            threshold,
            "new scalable bloom filter"
        );

        Ok(ScalableBloom {
            config,
            inners: vec![inner],
            elements: 0,
            threshold,
        })
    }

    /// Create a new scalable filter using the default configuration.
    pub fn with_defaults() -> ScalableBloom {
        ScalableBloom::new(ScalableConfig::default()).expect("default configuration is valid")
    }

    /// Number of inner filters spawned so far.
    pub fn blooms(&self) -> usize {
        self.inners.len()
    }

    /// Total inserted (counts multiplicity, not de-duplicated).
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Cumulative capacity of all inner filters spawned so far.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Bin count of inner filter `k`.
    pub fn bins_list(&self, k: usize) -> Result<usize> {
        self.inner(k).map(|inner| inner.bins)
    }

    /// Hash count of inner filter `k`.
    pub fn hashes_at(&self, k: usize) -> Result<usize> {
        self.inner(k).map(|inner| inner.hashes)
    }

    /// The approximate capacity inner filter `k` was provisioned for.
    pub fn capacity(&self, k: usize) -> Result<usize> {
        self.inner(k)
            .map(|inner| Params::capacity_for(inner.bins, inner.hashes))
    }

    /// The target false-positive error inner filter `k` was provisioned
    /// for, `e_k = e0 * r^k`.
    pub fn target_error(&self, k: usize) -> Result<f64> {
        self.inner(k)?;
        let e0 = self.config.initial_error();
        Ok(e0 * self.config.error_decay_rate.powi(k as i32))
    }

    fn inner(&self, k: usize) -> Result<&Inner> {
        self.inners.get(k).ok_or(BloomError::OutOfRange {
            index: k,
            len: self.inners.len(),
        })
    }

    /// Insert `item` into the current inner filter, spawning a new one if
    /// `elements` has crossed `threshold`.
    pub fn add(&mut self, item: &[u8]) {
        tracing::trace!(bytes = item.len(), "scalable bloom add");
        self.elements += 1;

        self.inners
            .last_mut()
            .expect("at least one inner filter always exists")
            .add(item);

        if self.elements > self.threshold {
            self.spawn_next();
        }
    }

    fn spawn_next(&mut self) {
        let k = self.inners.len();
        let bins = self.config.initial_size * (self.config.growth_factor as usize).pow(k as u32);
        let e0 = self.config.initial_error();
        let ek = e0 * self.config.error_decay_rate.powi(k as i32);
        let hashes = hashes_from_error_ratio(ek)
            .expect("ek is always in (0, 1) given a validated config");

        let inner = Inner::new(bins, hashes);
        let added_capacity = Params::capacity_for(inner.bins, inner.hashes);

        tracing::info!(index = k, bins, hashes, target_error = ek, "scalable bloom spawned new inner filter");

        self.inners.push(inner);
        self.threshold += added_capacity;
    }

    /// True iff any inner filter reports every bit set.
    pub fn check(&self, item: &[u8]) -> bool {
        self.inners.iter().rev().any(|inner| inner.check(item))
    }

    /// Alias for [`ScalableBloom::check`].
    pub fn contains(&self, item: &[u8]) -> bool {
        self.check(item)
    }

    /// `was_present = check(item); if !was_present { add(item) }; was_present`.
    pub fn check_then_add(&mut self, item: &[u8]) -> bool {
        let was_present = self.check(item);
        if !was_present {
            self.add(item);
        }
        was_present
    }

    /// Fraction of bins set to 1, aggregated across every inner filter.
    pub fn saturation(&self) -> f64 {
        let (ones, bins) = self
            .inners
            .iter()
            .fold((0usize, 0usize), |(ones, bins), inner| {
                (ones + inner.bits.count_ones(), bins + inner.bins)
            });
        if bins == 0 {
            0.0
        } else {
            ones as f64 / bins as f64
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let body = ScalableBody {
            blooms: self.inners.len(),
            threshold: self.threshold,
            elements: self.elements,
            max_error: self.config.max_error,
            error_decay_rate: self.config.error_decay_rate,
            initial_size: self.config.initial_size,
            growth_factor: self.config.growth_factor,
            bins_list: self.inners.iter().map(|i| i.bins).collect(),
            hashes: self.inners.iter().map(|i| i.hashes).collect(),
            bfs: self
                .inners
                .iter()
                .map(|i| envelope::to_hex(i.bits.as_bytes()))
                .collect(),
        };
        envelope::save(path.as_ref(), TYPE_SCALABLE, &body)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<ScalableBloom> {
        let body: ScalableBody = envelope::load(path.as_ref(), TYPE_SCALABLE)?;

        if body.bins_list.is_empty() {
            return Err(BloomError::Format {
                reason: "blooms_list must contain at least one inner filter".into(),
            });
        }
        if body.bins_list.len() != body.hashes.len() || body.bins_list.len() != body.bfs.len() {
            return Err(BloomError::Format {
                reason: "blooms_list, hashes, and bfs must have matching lengths".into(),
            });
        }

        let mut inners = Vec::with_capacity(body.blooms);
        for ((bins, hashes), bf_hex) in body
            .bins_list
            .into_iter()
            .zip(body.hashes)
            .zip(body.bfs)
        {
            let bytes = envelope::from_hex(&bf_hex)?;
            inners.push(Inner {
                bins,
                hashes,
                bits: BitArray::from_bytes(bins, bytes),
            });
        }

        Ok(ScalableBloom {
            config: ScalableConfig {
                initial_size: body.initial_size,
                growth_factor: body.growth_factor,
                max_error: body.max_error,
                error_decay_rate: body.error_decay_rate,
            },
            inners,
            elements: body.elements,
            threshold: body.threshold,
        })
    }
}
