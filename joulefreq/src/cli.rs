//! Command-line interface for joulefreq.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "joulefreq")]
#[command(about = "Energy, time and EDP statistics of benchmark runs by CPU frequency")]
#[command(version)]
pub struct Cli {
    /// CSV file, directory of CSV files, or glob pattern (default from config: results/)
    pub source: Option<String>,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the consolidated CSV, JSON summary and charts
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Number of bootstrap resamples per statistic
    #[arg(long)]
    pub resamples: Option<usize>,

    /// Seed for bootstrap resampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Confidence level for intervals (0.0-1.0)
    #[arg(long)]
    pub confidence_level: Option<f64>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Disable colored terminal output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The source to analyze: the positional argument, else the configured default.
    pub fn source_or<'a>(&'a self, config: &'a Config) -> &'a str {
        self.source
            .as_deref()
            .unwrap_or(config.input.default_source.as_str())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Only non-None optional values will override the config.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(ref dir) = self.output_dir {
            config.output.directory = dir.clone();
        }

        if let Some(resamples) = self.resamples {
            config.analysis.resamples = resamples;
        }

        if let Some(seed) = self.seed {
            config.analysis.seed = seed;
        }

        if let Some(confidence_level) = self.confidence_level {
            config.analysis.confidence_level = confidence_level;
        }

        if self.no_charts {
            config.output.charts = false;
        }

        if self.no_color {
            config.output.color = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_to_config_with_overrides() {
        let cli = Cli::parse_from([
            "joulefreq",
            "data/",
            "--output-dir",
            "out",
            "--resamples",
            "500",
            "--seed",
            "7",
            "--confidence-level",
            "0.99",
            "--no-charts",
            "--no-color",
        ]);

        let mut config = Config::default();
        cli.apply_to_config(&mut config);

        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.analysis.resamples, 500);
        assert_eq!(config.analysis.seed, 7);
        assert_eq!(config.analysis.confidence_level, 0.99);
        assert!(!config.output.charts);
        assert!(!config.output.color);
    }

    #[test]
    fn test_apply_to_config_without_overrides() {
        let cli = Cli::parse_from(["joulefreq"]);

        let mut config = Config::default();
        cli.apply_to_config(&mut config);

        // Values should remain unchanged
        assert_eq!(config.analysis.resamples, 10_000);
        assert_eq!(config.analysis.seed, 42);
        assert_eq!(config.analysis.confidence_level, 0.95);
        assert!(config.output.charts);
        assert!(config.output.color);
    }

    #[test]
    fn test_cli_parse_positional_only() {
        let cli = Cli::parse_from(["joulefreq", "results/*.csv"]);

        assert_eq!(cli.source.as_deref(), Some("results/*.csv"));
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert_eq!(cli.source_or(&Config::default()), "results/*.csv");
    }

    #[test]
    fn test_cli_default_source_from_config() {
        let cli = Cli::parse_from(["joulefreq"]);
        assert!(cli.source.is_none());
        assert_eq!(cli.source_or(&Config::default()), "results/");

        let mut config = Config::default();
        config.input.default_source = "target/energy.csv".to_string();
        assert_eq!(cli.source_or(&config), "target/energy.csv");
    }

    #[test]
    fn test_cli_parse_config_and_verbose() {
        let cli = Cli::parse_from(["joulefreq", "--config", "custom.toml", "-v", "run.csv"]);

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(cli.verbose);
        assert_eq!(cli.source.as_deref(), Some("run.csv"));
    }
}
