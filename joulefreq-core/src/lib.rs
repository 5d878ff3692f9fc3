//! Core types and statistics for joulefreq.
//!
//! This crate groups energy/time observations by (algorithm, CPU frequency),
//! computes point estimates, bootstrap confidence intervals and energy-time
//! correlation per group, ranks configurations by energy-delay product and
//! renders the results as terminal, text, CSV and JSON reports.

pub mod aggregate;
pub mod dataset;
pub mod ranking;
pub mod report;
pub mod stats;

// Re-export main types for convenience
pub use aggregate::{Aggregator, Analysis, AnalysisError, GroupStats, MetricSummary};
pub use dataset::{Dataset, Frequency, GroupKey, Observation};
pub use ranking::{EdpExtremes, OptimalFrequency, RankingEntry, Rankings};
pub use report::{
    AnalysisReport, CsvReporter, JsonReporter, ReportError, Reporter, TerminalReporter,
    TextReporter,
};
pub use stats::{Bootstrap, BootstrapMethod, ConfidenceInterval, Correlation, IntervalEstimator};
