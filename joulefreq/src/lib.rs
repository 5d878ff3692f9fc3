//! joulefreq: energy, time and EDP statistics of benchmark runs by CPU frequency.
//!
//! This library loads per-run CSV measurements, groups them by
//! (algorithm, CPU frequency), computes bootstrap confidence intervals and
//! energy-time correlations, ranks configurations by energy-delay product and
//! writes console, text, CSV, JSON and chart outputs.

pub mod chart;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod source;

// Re-export core types for convenience
pub use joulefreq_core::{
    Aggregator, Analysis, AnalysisError, AnalysisReport, Bootstrap, BootstrapMethod, Dataset,
    Frequency, GroupKey, GroupStats, Observation, Rankings, ReportError, Reporter,
};

// Re-export main types from this crate
pub use chart::ChartRenderer;
pub use cli::Cli;
pub use config::Config;
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
pub use source::{CsvSource, DataSource, LoadError, LoadedData, SourceSpec};
