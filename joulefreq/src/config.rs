//! Configuration loading for joulefreq.
//!
//! Supports loading configuration from TOML files, with sensible defaults
//! for all settings.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use joulefreq_core::{Bootstrap, BootstrapMethod};
use serde::{Deserialize, Serialize};

/// Top-level configuration for joulefreq.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for the statistical analysis.
    pub analysis: AnalysisConfig,
    /// Settings for locating and reading input data.
    pub input: InputConfig,
    /// Settings for written reports and charts.
    pub output: OutputConfig,
}

/// Configuration for bootstrap interval estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Confidence level for intervals (e.g., 0.95 for 95% confidence).
    pub confidence_level: f64,
    /// Number of bootstrap resamples per statistic.
    pub resamples: usize,
    /// Seed for the resampling generator.
    pub seed: u64,
    /// How bounds are read off the bootstrap distribution.
    pub method: BootstrapMethod,
}

/// Configuration for input resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Source used when none is given on the command line.
    pub default_source: String,
    /// Column holding the CPU frequency in MHz, when present.
    pub frequency_column: String,
}

/// Configuration for outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for the CSV, JSON and chart outputs.
    pub directory: PathBuf,
    /// Path of the text report (relative to the working directory).
    pub report_file: PathBuf,
    /// Consolidated CSV file name, inside `directory`.
    pub csv_file: String,
    /// JSON summary file name, inside `directory`.
    pub json_file: String,
    /// Whether to render charts.
    pub charts: bool,
    /// Skip the combined chart above this many algorithms.
    pub combined_chart_limit: usize,
    /// Number of EDP ranking entries printed to the terminal.
    pub ranking_limit: usize,
    /// Whether to color terminal output.
    pub color: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            resamples: 10_000,
            seed: 42,
            method: BootstrapMethod::Percentile,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_source: "results/".to_string(),
            frequency_column: "freq_mhz".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("results/analysis"),
            report_file: PathBuf::from("energy_frequency_report.txt"),
            csv_file: "consolidated_data.csv".to_string(),
            json_file: "summary.json".to_string(),
            charts: true,
            combined_chart_limit: 10,
            ranking_limit: 20,
            color: true,
        }
    }
}

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".joulefreq.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from the default file (`.joulefreq.toml`) or use defaults.
    ///
    /// If the file doesn't exist, default configuration is returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load_or_default() -> Result<Config> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from the specified path, or try the default location.
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }

    /// Reject settings the analysis cannot run with.
    pub fn validate(&self) -> Result<()> {
        let level = self.analysis.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            bail!("confidence_level must be between 0 and 1 (exclusive), got {}", level);
        }
        if self.analysis.resamples == 0 {
            bail!("resamples must be at least 1");
        }
        if self.input.frequency_column.trim().is_empty() {
            bail!("frequency_column must not be empty");
        }
        Ok(())
    }

    /// The bootstrap estimator described by the analysis section.
    ///
    /// Call [`Config::validate`] first; invalid settings panic here.
    pub fn bootstrap(&self) -> Bootstrap {
        Bootstrap::new(
            self.analysis.resamples,
            self.analysis.confidence_level,
            self.analysis.seed,
        )
        .with_method(self.analysis.method)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.csv_file)
    }

    pub fn json_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.json_file)
    }
}
