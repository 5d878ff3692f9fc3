//! Grouping and aggregation of observations by (algorithm, frequency).
//!
//! For every group with at least one observation the engine computes the
//! sample count, the mean of energy, time and EDP, and, when the group holds
//! two or more rows, Bessel-corrected standard deviations, confidence
//! intervals from an [`IntervalEstimator`] and the Pearson correlation between
//! energy and time. Singleton groups carry only means.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dataset::{Dataset, GroupKey, Observation};
use crate::stats::{
    mean, pearson, sample_std_dev, Bootstrap, ConfidenceInterval, Correlation, IntervalEstimator,
};

/// Errors that can occur while aggregating a dataset.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("dataset is empty")]
    EmptyDataset,

    /// Every observation had an unidentified frequency, so no group exists.
    #[error("no observation has a known CPU frequency ({unidentified} rows unidentified)")]
    NoFrequencies { unidentified: usize },

    #[error("observation {row} ({source_label}) has invalid {field}: {value}")]
    InvalidValue {
        row: usize,
        source_label: String,
        field: &'static str,
        value: f64,
    },
}

/// Point estimate and spread of one metric within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    /// Sample standard deviation; absent for a single observation.
    pub std_dev: Option<f64>,
    /// Confidence interval for the mean; absent for a single observation.
    pub ci: Option<ConfidenceInterval>,
}

impl MetricSummary {
    fn from_samples(samples: &[f64], estimator: &dyn IntervalEstimator) -> Self {
        if samples.len() < 2 {
            return Self {
                mean: mean(samples),
                std_dev: None,
                ci: None,
            };
        }
        Self {
            mean: mean(samples),
            std_dev: sample_std_dev(samples),
            ci: estimator.estimate(samples),
        }
    }
}

/// Statistics for one (algorithm, frequency) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: GroupKey,
    pub sample_count: usize,
    pub energy: MetricSummary,
    pub time: MetricSummary,
    /// Energy-delay product, computed per row before averaging.
    pub edp: MetricSummary,
    /// Correlation between energy and time; absent for a single observation
    /// or when either vector is constant.
    pub correlation: Option<Correlation>,
}

impl GroupStats {
    pub fn algorithm(&self) -> &str {
        &self.key.algorithm
    }

    pub fn frequency_mhz(&self) -> u32 {
        self.key.frequency_mhz
    }

    /// Whether higher-order statistics were computed for this group.
    pub fn has_spread(&self) -> bool {
        self.sample_count >= 2
    }
}

/// Result of aggregating a dataset: one [`GroupStats`] per non-empty group,
/// ordered by algorithm then ascending frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    groups: Vec<GroupStats>,
    /// Rows in the input, including those with unidentified frequency.
    pub total_observations: usize,
    /// Rows excluded from grouping because their frequency was unknown.
    pub unidentified_observations: usize,
}

impl Analysis {
    /// All groups in (algorithm, frequency) order.
    pub fn groups(&self) -> &[GroupStats] {
        &self.groups
    }

    pub fn get(&self, key: &GroupKey) -> Option<&GroupStats> {
        self.groups
            .binary_search_by(|g| g.key.cmp(key))
            .ok()
            .map(|i| &self.groups[i])
    }

    /// Distinct algorithms that have at least one group, ascending.
    pub fn algorithms(&self) -> Vec<&str> {
        let mut algorithms: Vec<&str> = self.groups.iter().map(|g| g.algorithm()).collect();
        algorithms.dedup();
        algorithms
    }

    /// Groups of one algorithm, by ascending frequency.
    pub fn for_algorithm<'a>(
        &'a self,
        algorithm: &'a str,
    ) -> impl Iterator<Item = &'a GroupStats> {
        self.groups
            .iter()
            .filter(move |g| g.algorithm() == algorithm)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// The aggregation engine.
///
/// The interval estimator is injectable so that tests can run with a small
/// resample count while production runs use [`Bootstrap::default`].
pub struct Aggregator {
    estimator: Box<dyn IntervalEstimator>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Bootstrap::default())
    }
}

impl Aggregator {
    pub fn new(estimator: impl IntervalEstimator + 'static) -> Self {
        Self {
            estimator: Box::new(estimator),
        }
    }

    pub fn confidence_level(&self) -> f64 {
        self.estimator.confidence_level()
    }

    /// Partition the dataset by (algorithm, frequency) and compute statistics
    /// for every non-empty group.
    ///
    /// # Errors
    ///
    /// Fails if the dataset is empty, if no row has a known frequency, or if
    /// any energy or time value is negative or not finite.
    pub fn aggregate(&self, dataset: &Dataset) -> Result<Analysis, AnalysisError> {
        if dataset.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }
        for (row, observation) in dataset.observations().iter().enumerate() {
            validate(row, observation)?;
        }

        let mut partitions: BTreeMap<GroupKey, Vec<&Observation>> = BTreeMap::new();
        for observation in dataset.observations() {
            if let Some(mhz) = observation.frequency.mhz() {
                partitions
                    .entry(GroupKey::new(observation.algorithm.clone(), mhz))
                    .or_default()
                    .push(observation);
            }
        }

        let unidentified = dataset.unidentified_count();
        if partitions.is_empty() {
            return Err(AnalysisError::NoFrequencies { unidentified });
        }

        let groups = partitions
            .into_iter()
            .map(|(key, rows)| self.group_stats(key, &rows))
            .collect();

        Ok(Analysis {
            groups,
            total_observations: dataset.len(),
            unidentified_observations: unidentified,
        })
    }

    fn group_stats(&self, key: GroupKey, rows: &[&Observation]) -> GroupStats {
        let energy: Vec<f64> = rows.iter().map(|o| o.energy_j).collect();
        let time: Vec<f64> = rows.iter().map(|o| o.time_ms).collect();
        let edp: Vec<f64> = rows.iter().map(|o| o.edp()).collect();

        debug!(group = %key, n = rows.len(), "aggregating group");

        let estimator = self.estimator.as_ref();
        let correlation = if rows.len() >= 2 {
            pearson(&energy, &time)
        } else {
            None
        };

        GroupStats {
            sample_count: rows.len(),
            energy: MetricSummary::from_samples(&energy, estimator),
            time: MetricSummary::from_samples(&time, estimator),
            edp: MetricSummary::from_samples(&edp, estimator),
            correlation,
            key,
        }
    }
}

fn validate(row: usize, observation: &Observation) -> Result<(), AnalysisError> {
    for (field, value) in [
        ("energy", observation.energy_j),
        ("time", observation.time_ms),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AnalysisError::InvalidValue {
                row,
                source_label: observation.source.clone(),
                field,
                value,
            });
        }
    }
    Ok(())
}
