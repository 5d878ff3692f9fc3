use serde::{Deserialize, Serialize};

/// A two-sided confidence interval around a sample mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    /// The confidence level the bounds were computed at (e.g. 0.95).
    pub level: f64,
}

impl ConfidenceInterval {
    /// Half the interval width.
    pub fn margin(&self) -> f64 {
        (self.upper - self.lower) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Pearson correlation between two paired samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// The correlation coefficient, in [-1, 1].
    pub coefficient: f64,
    /// Two-sided p-value for the null hypothesis of zero correlation.
    pub p_value: f64,
}

/// Trait for estimators that produce a confidence interval for the mean of a sample.
pub trait IntervalEstimator: Send + Sync {
    /// Estimate the interval, or `None` when the sample is too small to say anything.
    fn estimate(&self, samples: &[f64]) -> Option<ConfidenceInterval>;

    /// The confidence level this estimator targets.
    fn confidence_level(&self) -> f64;
}

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation with Bessel's correction (n-1 denominator).
///
/// `None` for fewer than two samples.
pub fn sample_std_dev(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let mean = mean(samples);
    let sum_sq_diff: f64 = samples
        .iter()
        .map(|x| {
            let diff = x - mean;
            diff * diff
        })
        .sum();
    Some((sum_sq_diff / (samples.len() - 1) as f64).sqrt())
}

mod bootstrap;
mod correlation;
pub use bootstrap::{Bootstrap, BootstrapMethod};
pub use correlation::pearson;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[1.0, 1.2, 0.8, 1.1]) - 1.025).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_dev_uses_bessel_correction() {
        let samples = [1.0, 1.2, 0.8, 1.1];
        let std = sample_std_dev(&samples).unwrap();

        let m = mean(&samples);
        let ss: f64 = samples.iter().map(|x| (x - m).powi(2)).sum();
        let expected = (ss / 3.0).sqrt();

        assert!((std - expected).abs() < 1e-12);
        assert!((std - 0.170782).abs() < 1e-5);
    }

    #[test]
    fn test_sample_std_dev_singleton() {
        assert!(sample_std_dev(&[3.0]).is_none());
        assert!(sample_std_dev(&[]).is_none());
    }

    #[test]
    fn test_interval_margin_and_contains() {
        let ci = ConfidenceInterval {
            lower: 0.9,
            upper: 1.1,
            level: 0.95,
        };
        assert!((ci.margin() - 0.1).abs() < 1e-12);
        assert!(ci.contains(1.0));
        assert!(!ci.contains(1.2));
    }
}
