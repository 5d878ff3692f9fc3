use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{display_name, heading_name, AnalysisReport, ReportError, Reporter};
use crate::aggregate::MetricSummary;

/// Writes a plain-text report (no colors) to a file.
#[derive(Debug, Clone)]
pub struct TextReporter {
    path: PathBuf,
}

impl TextReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_metric(
        writer: &mut impl Write,
        title: &str,
        metric: &MetricSummary,
        unit: &str,
        precision: usize,
        confidence_pct: u32,
    ) -> std::io::Result<()> {
        writeln!(writer, "{}:", title)?;
        writeln!(writer, "  Value: {:.*} {}", precision, metric.mean, unit)?;
        if let Some(std_dev) = metric.std_dev {
            writeln!(writer, "  Std dev: {:.*} {}", precision, std_dev, unit)?;
        }
        if let Some(ci) = metric.ci {
            writeln!(
                writer,
                "  CI {}%: [{:.*}, {:.*}] {}",
                confidence_pct, precision, ci.lower, precision, ci.upper, unit
            )?;
        }
        Ok(())
    }

    pub fn write_report(
        &self,
        writer: &mut impl Write,
        report: &AnalysisReport,
    ) -> Result<(), ReportError> {
        let pct = report.confidence_pct();

        writeln!(writer, "REPORT - ENERGY AND TIME BY CPU FREQUENCY")?;
        writeln!(writer, "{}", "=".repeat(45))?;
        writeln!(writer)?;
        writeln!(writer, "DATA ANALYZED")?;
        writeln!(writer, "{}", "-".repeat(20))?;
        writeln!(writer, "Source: {}", report.source)?;
        writeln!(writer, "Total records: {}", report.total_observations)?;
        writeln!(writer, "Algorithms: {}", report.algorithms.join(", "))?;
        if !report.frequencies_mhz.is_empty() {
            let freqs: Vec<String> = report.frequencies_mhz.iter().map(u32::to_string).collect();
            writeln!(writer, "CPU frequencies: {} MHz", freqs.join(", "))?;
        }
        if !report.sizes.is_empty() {
            let sizes: Vec<String> = report.sizes.iter().map(u64::to_string).collect();
            writeln!(writer, "Input sizes: {}", sizes.join(", "))?;
        }
        writeln!(writer)?;

        for algorithm in report.analysis.algorithms() {
            writeln!(writer)?;
            writeln!(writer, "{}", heading_name(algorithm))?;
            writeln!(writer, "{}", "=".repeat(50))?;

            for stats in report.analysis.for_algorithm(algorithm) {
                writeln!(writer)?;
                writeln!(writer, "CPU: {} MHz", stats.frequency_mhz())?;
                writeln!(writer, "{}", "-".repeat(30))?;
                writeln!(writer, "Observations: {}", stats.sample_count)?;
                writeln!(writer)?;
                Self::write_metric(writer, "ENERGY", &stats.energy, "J", 6, pct)?;
                writeln!(writer)?;
                Self::write_metric(writer, "TIME", &stats.time, "ms", 3, pct)?;
                writeln!(writer)?;
                Self::write_metric(
                    writer,
                    "EDP (ENERGY-DELAY PRODUCT)",
                    &stats.edp,
                    "J·ms",
                    6,
                    pct,
                )?;
                writeln!(writer, "  (lower EDP = better energy efficiency)")?;
                writeln!(writer)?;
                match stats.correlation {
                    Some(c) => writeln!(
                        writer,
                        "ENERGY-TIME CORRELATION: {:.3} (p={:.6})",
                        c.coefficient, c.p_value
                    )?,
                    None => writeln!(writer, "ENERGY-TIME CORRELATION: N/A")?,
                }
            }
        }

        writeln!(writer)?;
        writeln!(writer)?;
        writeln!(writer, "SUMMARY TABLE BY FREQUENCY")?;
        writeln!(writer, "{}", "=".repeat(40))?;
        writeln!(writer)?;
        writeln!(
            writer,
            "{:<15} {:<10} {:<15} {:<12}",
            "Algorithm", "CPU(MHz)", "Energy(J)", "Time(ms)"
        )?;
        writeln!(writer, "{}", "-".repeat(55))?;
        for algorithm in report.analysis.algorithms() {
            for stats in report.analysis.for_algorithm(algorithm) {
                writeln!(
                    writer,
                    "{:<15} {:<10} {:<15.6} {:<12.3}",
                    algorithm,
                    stats.frequency_mhz(),
                    stats.energy.mean,
                    stats.time.mean
                )?;
            }
            writeln!(writer)?;
        }

        writeln!(writer)?;
        writeln!(writer, "EDP RANKING (lower is better)")?;
        writeln!(writer, "{}", "-".repeat(50))?;
        for (i, entry) in report.rankings.edp_ranking.iter().enumerate() {
            writeln!(
                writer,
                "{}. {} @ {} MHz: {:.6} J·ms ({:.6} J, {:.3} ms)",
                i + 1,
                display_name(&entry.algorithm),
                entry.frequency_mhz,
                entry.edp,
                entry.energy,
                entry.time
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "BEST FREQUENCY PER ALGORITHM (EDP)")?;
        writeln!(writer, "{}", "-".repeat(50))?;
        for e in &report.rankings.edp_extremes {
            writeln!(
                writer,
                "{}: best {} MHz ({:.6} J·ms), worst {} MHz ({:.6} J·ms), improvement {:.1}%",
                display_name(&e.algorithm),
                e.best_frequency_mhz,
                e.best_edp,
                e.worst_frequency_mhz,
                e.worst_edp,
                e.improvement_pct
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "MINIMUM-ENERGY FREQUENCY PER ALGORITHM")?;
        writeln!(writer, "{}", "-".repeat(50))?;
        for o in &report.rankings.optimal_frequencies {
            writeln!(
                writer,
                "{}: {} MHz ({:.6} J), saving {:.1}% vs {} MHz",
                display_name(&o.algorithm),
                o.optimal_frequency_mhz,
                o.min_energy,
                o.energy_savings_pct,
                o.max_frequency_mhz
            )?;
        }

        Ok(())
    }
}

impl Reporter for TextReporter {
    fn report(&self, report: &AnalysisReport) -> Result<(), ReportError> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        self.write_report(&mut writer, report)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::sample_report;
    use tempfile::TempDir;

    #[test]
    fn test_writes_report_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("energy_frequency_report.txt");
        let reporter = TextReporter::new(&path);

        reporter.report(&sample_report()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("REPORT - ENERGY AND TIME BY CPU FREQUENCY"));
        assert!(content.contains("Total records: 7"));
        assert!(content.contains("CPU frequencies: 500, 1500 MHz"));
        assert!(content.contains("Input sizes: 10000"));
        assert!(content.contains("SUMMARY TABLE BY FREQUENCY"));
        assert!(content.contains("ENERGY-TIME CORRELATION: N/A"));
        assert!(content.contains("CI 95%:"));
        assert!(content.contains("1. Quick Sort @ 1500 MHz"));
    }

    #[test]
    fn test_singleton_block_has_no_spread() {
        let mut buffer = Vec::new();
        TextReporter::new("unused")
            .write_report(&mut buffer, &sample_report())
            .unwrap();
        let content = String::from_utf8(buffer).unwrap();

        let quick = content.split("QUICK SORT").nth(1).unwrap();
        let first_block = quick.split("CPU: 1500 MHz").next().unwrap();
        assert!(!first_block.contains("Std dev"));
        assert!(!first_block.contains("CI 95%"));
    }

    #[test]
    fn test_missing_directory_fails() {
        let reporter = TextReporter::new("/nonexistent/dir/report.txt");
        assert!(matches!(
            reporter.report(&sample_report()),
            Err(ReportError::Io(_))
        ));
    }
}
