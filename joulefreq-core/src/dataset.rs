use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// CPU frequency a measurement was taken at.
///
/// Rows whose frequency could not be determined (no `freq_mhz` column and no
/// `<digits>mhz` in the file name) are kept in the dataset but never grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Mhz(u32),
    Unidentified,
}

impl Frequency {
    /// The frequency in MHz, if known.
    pub fn mhz(self) -> Option<u32> {
        match self {
            Frequency::Mhz(mhz) => Some(mhz),
            Frequency::Unidentified => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Frequency::Mhz(_))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Mhz(mhz) => write!(f, "{}", mhz),
            Frequency::Unidentified => f.write_str("unidentified"),
        }
    }
}

/// One measured row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Algorithm identifier (the `algo` column).
    pub algorithm: String,
    /// Energy in joules.
    pub energy_j: f64,
    /// Elapsed time in milliseconds.
    pub time_ms: f64,
    pub frequency: Frequency,
    /// Input size, when the source carries a `size` column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// File name the row was read from.
    pub source: String,
}

impl Observation {
    /// Energy-delay product of this single row (J·ms).
    pub fn edp(&self) -> f64 {
        self.energy_j * self.time_ms
    }
}

/// An (algorithm, frequency) pair identifying one partition of the dataset.
///
/// Ordering is algorithm first (lexical), then frequency (numeric).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub algorithm: String,
    pub frequency_mhz: u32,
}

impl GroupKey {
    pub fn new(algorithm: impl Into<String>, frequency_mhz: u32) -> Self {
        Self {
            algorithm: algorithm.into(),
            frequency_mhz,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} MHz", self.algorithm, self.frequency_mhz)
    }
}

/// Ordered collection of observations, in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Append the rows of another dataset, preserving order.
    pub fn extend(&mut self, other: Dataset) {
        self.observations.extend(other.observations);
    }

    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct algorithms, ascending.
    pub fn algorithms(&self) -> BTreeSet<&str> {
        self.observations
            .iter()
            .map(|o| o.algorithm.as_str())
            .collect()
    }

    /// Distinct known frequencies in MHz, ascending.
    pub fn frequencies(&self) -> BTreeSet<u32> {
        self.observations
            .iter()
            .filter_map(|o| o.frequency.mhz())
            .collect()
    }

    /// Distinct input sizes, ascending. Empty when no row carries a size.
    pub fn sizes(&self) -> BTreeSet<u64> {
        self.observations.iter().filter_map(|o| o.size).collect()
    }

    /// Distinct source labels, in first-seen order.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for o in &self.observations {
            if !seen.contains(&o.source.as_str()) {
                seen.push(o.source.as_str());
            }
        }
        seen
    }

    /// Number of rows whose frequency could not be determined.
    pub fn unidentified_count(&self) -> usize {
        self.observations
            .iter()
            .filter(|o| !o.frequency.is_known())
            .count()
    }
}

impl FromIterator<Observation> for Dataset {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(algorithm: &str, frequency: Frequency, source: &str) -> Observation {
        Observation {
            algorithm: algorithm.to_string(),
            energy_j: 1.0,
            time_ms: 10.0,
            frequency,
            size: None,
            source: source.to_string(),
        }
    }

    #[test]
    fn test_distinct_sets_are_sorted() {
        let dataset: Dataset = vec![
            obs("quick_sort", Frequency::Mhz(1500), "a.csv"),
            obs("bubble_sort", Frequency::Mhz(500), "a.csv"),
            obs("merge_sort", Frequency::Unidentified, "b.csv"),
            obs("bubble_sort", Frequency::Mhz(1000), "b.csv"),
        ]
        .into_iter()
        .collect();

        let algorithms: Vec<_> = dataset.algorithms().into_iter().collect();
        assert_eq!(algorithms, vec!["bubble_sort", "merge_sort", "quick_sort"]);

        let frequencies: Vec<_> = dataset.frequencies().into_iter().collect();
        assert_eq!(frequencies, vec![500, 1000, 1500]);

        assert_eq!(dataset.sources(), vec!["a.csv", "b.csv"]);
        assert_eq!(dataset.unidentified_count(), 1);
        assert_eq!(dataset.len(), 4);
    }

    #[test]
    fn test_group_key_ordering() {
        let mut keys = vec![
            GroupKey::new("quick_sort", 500),
            GroupKey::new("bubble_sort", 1500),
            GroupKey::new("bubble_sort", 800),
        ];
        keys.sort();
        assert_eq!(keys[0], GroupKey::new("bubble_sort", 800));
        assert_eq!(keys[1], GroupKey::new("bubble_sort", 1500));
        assert_eq!(keys[2], GroupKey::new("quick_sort", 500));
    }

    #[test]
    fn test_observation_edp() {
        let mut o = obs("bubble_sort", Frequency::Mhz(500), "a.csv");
        o.energy_j = 1.2;
        o.time_ms = 110.0;
        assert!((o.edp() - 132.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_display() {
        assert_eq!(Frequency::Mhz(1500).to_string(), "1500");
        assert_eq!(Frequency::Unidentified.to_string(), "unidentified");
        assert_eq!(Frequency::Unidentified.mhz(), None);
    }
}
