use std::io::Write;
use std::path::{Path, PathBuf};

use super::{AnalysisReport, ReportError, Reporter};
use crate::aggregate::{GroupStats, MetricSummary};

const HEADER: [&str; 17] = [
    "algorithm",
    "cpu_frequency_mhz",
    "n_observations",
    "energy_mean_j",
    "energy_std_j",
    "energy_ci95_lower_j",
    "energy_ci95_upper_j",
    "time_mean_ms",
    "time_std_ms",
    "time_ci95_lower_ms",
    "time_ci95_upper_ms",
    "edp_mean_j_ms",
    "edp_std_j_ms",
    "edp_ci95_lower_j_ms",
    "edp_ci95_upper_j_ms",
    "energy_time_correlation",
    "correlation_p_value",
];

/// Writes one row per (algorithm, frequency) group with every statistic as a column.
///
/// Statistics that are absent for a group (single observation) are written as
/// empty fields.
#[derive(Debug, Clone)]
pub struct CsvReporter {
    path: PathBuf,
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn metric_fields(metric: &MetricSummary) -> [String; 4] {
    [
        metric.mean.to_string(),
        optional(metric.std_dev),
        optional(metric.ci.map(|ci| ci.lower)),
        optional(metric.ci.map(|ci| ci.upper)),
    ]
}

fn record(stats: &GroupStats) -> Vec<String> {
    let mut fields = vec![
        stats.key.algorithm.clone(),
        stats.key.frequency_mhz.to_string(),
        stats.sample_count.to_string(),
    ];
    fields.extend(metric_fields(&stats.energy));
    fields.extend(metric_fields(&stats.time));
    fields.extend(metric_fields(&stats.edp));
    fields.push(optional(stats.correlation.map(|c| c.coefficient)));
    fields.push(optional(stats.correlation.map(|c| c.p_value)));
    fields
}

impl CsvReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_report<W: Write>(
        &self,
        writer: W,
        report: &AnalysisReport,
    ) -> Result<(), ReportError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(HEADER)?;
        for stats in report.analysis.groups() {
            csv.write_record(record(stats))?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl Reporter for CsvReporter {
    fn report(&self, report: &AnalysisReport) -> Result<(), ReportError> {
        let file = std::fs::File::create(&self.path)?;
        self.write_report(file, report)
    }
}
