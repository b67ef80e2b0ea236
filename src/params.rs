//! Parameter calculus: deriving bit-array size and hash count from a
//! target capacity and error ratio.

use crate::error::{BloomError, Result};

/// Validated construction parameters shared by the classic and counting
/// variants (and, per-inner, by the scalable variant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub capacity: usize,
    pub error_ratio: f64,
    pub bins: usize,
    pub hashes: usize,
}

impl Params {
    /// Derive `(bins, hashes)` from `(capacity, error_ratio)` and validate
    /// both inputs.
    pub fn new(capacity: usize, error_ratio: f64) -> Result<Params> {
        validate(capacity, error_ratio)?;

        let bins = optimal_bins(capacity, error_ratio);
        let hashes = optimal_hashes(bins, capacity);

        Ok(Params {
            capacity,
            error_ratio,
            bins,
            hashes,
        })
    }

    /// The approximate capacity a filter with `bins` bins and `hashes`
    /// hash functions was provisioned for. Used by the scaling controller
    /// to derive how much a newly spawned inner filter adds to `threshold`.
    pub fn capacity_for(bins: usize, hashes: usize) -> usize {
        ((bins as f64) * std::f64::consts::LN_2 / hashes as f64).round() as usize
    }
}

fn validate(capacity: usize, error_ratio: f64) -> Result<()> {
    if capacity == 0 {
        return Err(BloomError::InvalidParameters {
            reason: "capacity must be >= 1".into(),
        });
    }
    if !(error_ratio > 0.0 && error_ratio < 1.0) {
        return Err(BloomError::InvalidParameters {
            reason: format!("error_ratio must be in (0, 1), got {error_ratio}"),
        });
    }
    Ok(())
}

/// `bins = ceil(-capacity * ln(error_ratio) / (ln 2)^2)`, clamped to >= 1.
pub fn optimal_bins(capacity: usize, error_ratio: f64) -> usize {
    let ln2_sq = std::f64::consts::LN_2 * std::f64::consts::LN_2;
    let bins = (-(capacity as f64) * error_ratio.ln() / ln2_sq).ceil();
    (bins as usize).max(1)
}

/// `hashes = round(bins / capacity * ln 2)`, clamped to >= 1.
pub fn optimal_hashes(bins: usize, capacity: usize) -> usize {
    let hashes = ((bins as f64 / capacity as f64) * std::f64::consts::LN_2).round();
    (hashes as usize).max(1)
}

/// `hashes = ceil(log2(1/error_ratio))`, clamped to >= 1. Used when only an
/// error target (not a capacity) is known, as for scalable inner filters.
pub fn hashes_from_error_ratio(error_ratio: f64) -> Result<usize> {
    if !(error_ratio > 0.0 && error_ratio < 1.0) {
        return Err(BloomError::InvalidParameters {
            reason: format!("error_ratio must be in (0, 1), got {error_ratio}"),
        });
    }
    let hashes = (1.0 / error_ratio).log2().ceil();
    Ok((hashes as usize).max(1))
}
