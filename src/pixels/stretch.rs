//! Global range computation and percentile auto-stretch.
//!
//! Both passes walk every readable sample once and cache their result: the
//! min/max until explicitly invalidated, the distribution keyed by the
//! requested threshold so repeated calls with an unchanged threshold return
//! the cached range bit-identically without rescanning the payload.

use log::debug;

use super::codec::DecodedImage;
use super::sample::{dispatch_sample, Sample};
use super::PixelError;

/// Number of equal-width histogram buckets.
pub const DISTRIBUTION_BUCKETS: usize = 100;

/// Cached percentile histogram of one payload.
#[derive(Debug, Clone)]
pub struct Distribution {
    /// Threshold the distribution was stretched with.
    pub threshold: f64,
    /// Sample count per bucket.
    pub counts: Vec<u64>,
    /// Population share per bucket (count over total finite samples).
    pub shares: Vec<f64>,
    /// The stretched [min, max] range.
    pub range: (f64, f64),
}

impl<'a> DecodedImage<'a> {
    /// Global minimum and maximum over all readable samples, in the affine
    /// value domain. Computed once and cached; recomputed only after
    /// [`DecodedImage::invalidate_caches`].
    pub fn min_max(&mut self) -> Result<(f64, f64), PixelError> {
        if let Some(cached) = self.minmax {
            return Ok(cached);
        }

        let range = dispatch_sample!(self.kind(), T, self.min_max_pass::<T>());
        self.minmax = Some(range);
        Ok(range)
    }

    fn min_max_pass<T: Sample>(&self) -> (f64, f64) {
        let (zero, scale) = self.affine();
        let affine = scale != 1.0 || zero != 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for i in 0..self.readable_samples() {
            let raw = T::read_be(&self.payload()[i * T::BYTES..]);
            let value = if affine {
                raw.affine(zero, scale)
            } else {
                raw.to_f64()
            };
            if !value.is_finite() {
                continue;
            }
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
        }

        if min > max {
            // No finite sample in the payload.
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }

    /// The auto-stretched [min, max] range for `threshold`.
    ///
    /// Samples are bucketed into [`DISTRIBUTION_BUCKETS`] equal-width bins
    /// over the global range. Starting from the most populated bin, the
    /// range extends left and right while neighboring bins keep a population
    /// share of at least `threshold`; the boundary values of the extended
    /// bin run become the stretched range. Threshold 0 reproduces the raw
    /// global min/max exactly.
    ///
    /// The result is cached per threshold: calling again with an unchanged
    /// threshold returns the cached range without recomputation.
    pub fn stretch_range(&mut self, threshold: f64) -> Result<(f64, f64), PixelError> {
        if let Some(dist) = &self.distribution {
            if dist.threshold == threshold {
                return Ok(dist.range);
            }
        }

        let (min, max) = self.min_max()?;
        let counts = if max > min {
            dispatch_sample!(self.kind(), T, self.histogram_pass::<T>(min, max))
        } else {
            vec![0u64; DISTRIBUTION_BUCKETS]
        };

        let total: u64 = counts.iter().sum();
        let shares: Vec<f64> = counts
            .iter()
            .map(|&c| if total > 0 { c as f64 / total as f64 } else { 0.0 })
            .collect();

        let range = stretched_range(&shares, threshold, min, max);
        debug!(
            "stretch threshold {threshold}: [{}, {}] of raw [{min}, {max}]",
            range.0, range.1
        );

        self.distribution = Some(Distribution {
            threshold,
            counts,
            shares,
            range,
        });
        self.stretch_passes += 1;
        Ok(range)
    }

    fn histogram_pass<T: Sample>(&self, min: f64, max: f64) -> Vec<u64> {
        let (zero, scale) = self.affine();
        let affine = scale != 1.0 || zero != 0.0;
        let span = max - min;
        let mut counts = vec![0u64; DISTRIBUTION_BUCKETS];

        for i in 0..self.readable_samples() {
            let raw = T::read_be(&self.payload()[i * T::BYTES..]);
            let value = if affine {
                raw.affine(zero, scale)
            } else {
                raw.to_f64()
            };
            if !value.is_finite() {
                continue;
            }
            let bucket = (((value - min) / span) * DISTRIBUTION_BUCKETS as f64) as usize;
            counts[bucket.min(DISTRIBUTION_BUCKETS - 1)] += 1;
        }

        counts
    }

    /// The cached distribution, if one has been computed.
    pub fn distribution(&self) -> Option<&Distribution> {
        self.distribution.as_ref()
    }

    /// How many times the distribution has actually been recomputed.
    /// Diagnostic; lets callers verify the per-threshold cache.
    pub fn stretch_passes(&self) -> usize {
        self.stretch_passes
    }
}

/// Extend the densest bucket left and right while neighbors hold at least
/// `threshold` population share, then convert the bucket run back to value
/// boundaries. Runs touching the histogram edges snap to the exact raw
/// min/max so threshold 0 is lossless.
fn stretched_range(shares: &[f64], threshold: f64, min: f64, max: f64) -> (f64, f64) {
    if max <= min {
        return (min, max);
    }

    let peak = shares
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut lo = peak;
    while lo > 0 && shares[lo - 1] >= threshold {
        lo -= 1;
    }
    let mut hi = peak;
    while hi + 1 < shares.len() && shares[hi + 1] >= threshold {
        hi += 1;
    }

    let bucket_width = (max - min) / shares.len() as f64;
    let low = if lo == 0 {
        min
    } else {
        min + lo as f64 * bucket_width
    };
    let high = if hi == shares.len() - 1 {
        max
    } else {
        min + (hi + 1) as f64 * bucket_width
    };
    (low, high)
}
