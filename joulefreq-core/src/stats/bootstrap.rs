use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::{mean, ConfidenceInterval, IntervalEstimator};

/// How bounds are read off the bootstrap distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapMethod {
    /// Plain percentile bounds of the resampled means.
    #[default]
    Percentile,
    /// Bias-corrected and accelerated percentiles.
    Bca,
}

/// Bootstrap confidence interval for the mean.
///
/// Draws `resamples` samples of size n with replacement, takes the mean of each
/// and reads the bounds off the resulting distribution. Every call to
/// [`IntervalEstimator::estimate`] reseeds its generator from `seed`, so the same
/// input always yields bit-identical bounds regardless of call order.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    /// Number of resamples to draw (default: 10,000).
    pub resamples: usize,
    /// The confidence level (default: 0.95).
    pub confidence_level: f64,
    /// Seed for the resampling generator (default: 42).
    pub seed: u64,
    pub method: BootstrapMethod,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            resamples: 10_000,
            confidence_level: 0.95,
            seed: 42,
            method: BootstrapMethod::Percentile,
        }
    }
}

impl Bootstrap {
    /// Create a percentile bootstrap.
    ///
    /// # Panics
    /// Panics if `confidence_level` is not in (0, 1) or `resamples` is zero.
    pub fn new(resamples: usize, confidence_level: f64, seed: u64) -> Self {
        assert!(
            confidence_level > 0.0 && confidence_level < 1.0,
            "confidence_level must be between 0 and 1 (exclusive)"
        );
        assert!(resamples > 0, "resamples must be at least 1");
        Self {
            resamples,
            confidence_level,
            seed,
            method: BootstrapMethod::Percentile,
        }
    }

    pub fn with_method(mut self, method: BootstrapMethod) -> Self {
        self.method = method;
        self
    }

    /// Sorted means of `self.resamples` resamples drawn with replacement.
    fn resampled_means(&self, samples: &[f64]) -> Vec<f64> {
        let n = samples.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut means: Vec<f64> = (0..self.resamples)
            .map(|_| {
                let sum: f64 = (0..n).map(|_| samples[rng.gen_range(0..n)]).sum();
                sum / n as f64
            })
            .collect();
        means.sort_by(f64::total_cmp);
        means
    }

    /// Acceleration constant from the jackknife means.
    fn acceleration(samples: &[f64]) -> f64 {
        let n = samples.len();
        let total: f64 = samples.iter().sum();
        let jackknife: Vec<f64> = samples
            .iter()
            .map(|x| (total - x) / (n - 1) as f64)
            .collect();
        let jack_mean = mean(&jackknife);

        let (num, den) = jackknife.iter().fold((0.0, 0.0), |(num, den), j| {
            let d = jack_mean - j;
            (num + d.powi(3), den + d.powi(2))
        });

        if den == 0.0 {
            return 0.0;
        }
        num / (6.0 * den.powf(1.5))
    }

    /// Adjusted percentile levels for BCa, or `None` when the bias correction
    /// is degenerate (every resample on one side of the estimate).
    fn bca_levels(&self, samples: &[f64], sorted_means: &[f64]) -> Option<(f64, f64)> {
        let normal = Normal::new(0.0, 1.0).ok()?;
        let estimate = mean(samples);

        let below = sorted_means.iter().filter(|&&m| m < estimate).count();
        let proportion = below as f64 / sorted_means.len() as f64;
        if proportion <= 0.0 || proportion >= 1.0 {
            return None;
        }
        let z0 = normal.inverse_cdf(proportion);
        let a = Self::acceleration(samples);

        let alpha = (1.0 - self.confidence_level) / 2.0;
        let adjust = |q: f64| {
            let z = normal.inverse_cdf(q);
            normal.cdf(z0 + (z0 + z) / (1.0 - a * (z0 + z)))
        };

        let low = adjust(alpha);
        let high = adjust(1.0 - alpha);
        if low.is_finite() && high.is_finite() {
            Some((low, high))
        } else {
            None
        }
    }
}

/// Linearly interpolated quantile `q` of a sorted, non-empty slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

impl IntervalEstimator for Bootstrap {
    fn estimate(&self, samples: &[f64]) -> Option<ConfidenceInterval> {
        if samples.len() < 2 {
            return None;
        }

        let means = self.resampled_means(samples);
        let alpha = (1.0 - self.confidence_level) / 2.0;

        let (low_q, high_q) = match self.method {
            BootstrapMethod::Percentile => (alpha, 1.0 - alpha),
            BootstrapMethod::Bca => self.bca_levels(samples, &means).unwrap_or_else(|| {
                tracing::debug!("degenerate BCa correction, using percentile bounds");
                (alpha, 1.0 - alpha)
            }),
        };

        Some(ConfidenceInterval {
            lower: quantile(&means, low_q),
            upper: quantile(&means, high_q),
            level: self.confidence_level,
        })
    }

    fn confidence_level(&self) -> f64 {
        self.confidence_level
    }
}
