use std::io::{self, Write};

use colored::Colorize;

use super::{display_name, heading_name, AnalysisReport, ReportError, Reporter};
use crate::aggregate::{GroupStats, MetricSummary};

/// A reporter that prints per-group statistics and rankings to the terminal.
#[derive(Debug, Clone)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
    /// How many entries of the EDP ranking to print.
    ranking_limit: usize,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            ranking_limit: 20,
        }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self {
            use_colors: false,
            ..Self::new()
        }
    }

    pub fn with_ranking_limit(mut self, limit: usize) -> Self {
        self.ranking_limit = limit;
        self
    }

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn good(&self, text: &str) -> String {
        if self.use_colors {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn bad(&self, text: &str) -> String {
        if self.use_colors {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn muted(&self, text: &str) -> String {
        if self.use_colors {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    /// Format one metric block: mean, then deviation and interval when present.
    fn format_metric(
        metric: &MetricSummary,
        unit: &str,
        precision: usize,
        confidence_pct: u32,
    ) -> Vec<String> {
        let mut lines = vec![format!("  Mean:   {:.*} {}", precision, metric.mean, unit)];
        if let Some(std_dev) = metric.std_dev {
            lines.push(format!("  Std:    {:.*} {}", precision, std_dev, unit));
        }
        if let Some(ci) = metric.ci {
            lines.push(format!(
                "  CI {}%: [{:.*}, {:.*}] {}",
                confidence_pct, precision, ci.lower, precision, ci.upper, unit
            ));
        }
        lines
    }

    fn format_correlation(&self, stats: &GroupStats) -> String {
        match stats.correlation {
            Some(c) => format!("{:.3} (p={:.6})", c.coefficient, c.p_value),
            None if stats.sample_count < 2 => self.muted("N/A (single sample)"),
            None => self.muted("N/A (constant values)"),
        }
    }

    fn print_overview(&self, writer: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
        writeln!(writer)?;
        writeln!(writer, "{}", "=".repeat(80))?;
        writeln!(
            writer,
            "{}",
            self.bold("ENERGY AND TIME BY CPU FREQUENCY")
        )?;
        writeln!(writer, "{}", "=".repeat(80))?;
        writeln!(writer, "Source:       {}", report.source)?;
        writeln!(writer, "Observations: {}", report.total_observations)?;
        writeln!(writer, "Algorithms:   {}", report.algorithms.join(", "))?;
        if !report.frequencies_mhz.is_empty() {
            let freqs: Vec<String> = report.frequencies_mhz.iter().map(u32::to_string).collect();
            writeln!(writer, "Frequencies:  {} MHz", freqs.join(", "))?;
        }
        if report.analysis.unidentified_observations > 0 {
            writeln!(
                writer,
                "{}",
                self.muted(&format!(
                    "Excluded:     {} rows with unidentified frequency",
                    report.analysis.unidentified_observations
                ))
            )?;
        }
        Ok(())
    }

    fn print_groups(&self, writer: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
        let pct = report.confidence_pct();
        for algorithm in report.analysis.algorithms() {
            writeln!(writer)?;
            writeln!(writer, "{}", self.bold(&heading_name(algorithm)))?;
            writeln!(writer, "{}", "=".repeat(60))?;

            for stats in report.analysis.for_algorithm(algorithm) {
                writeln!(writer)?;
                writeln!(writer, "CPU: {} MHz", stats.frequency_mhz())?;
                writeln!(writer, "{}", "-".repeat(40))?;
                writeln!(writer, "Observations: {}", stats.sample_count)?;

                writeln!(writer, "Energy:")?;
                for line in Self::format_metric(&stats.energy, "J", 6, pct) {
                    writeln!(writer, "{}", line)?;
                }
                writeln!(writer, "Time:")?;
                for line in Self::format_metric(&stats.time, "ms", 3, pct) {
                    writeln!(writer, "{}", line)?;
                }
                writeln!(writer, "EDP (Energy-Delay Product):")?;
                for line in Self::format_metric(&stats.edp, "J·ms", 6, pct) {
                    writeln!(writer, "{}", line)?;
                }
                writeln!(
                    writer,
                    "Energy-time correlation: {}",
                    self.format_correlation(stats)
                )?;
            }
        }
        Ok(())
    }

    fn print_ranking(&self, writer: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
        writeln!(writer)?;
        writeln!(writer, "{}", "=".repeat(80))?;
        writeln!(writer, "{}", self.bold("ENERGY EFFICIENCY RANKING (EDP, lower is better)"))?;
        writeln!(writer, "{}", "=".repeat(80))?;

        let header = format!(
            "{:<6} {:<20} {:>8} {:>15} {:>15} {:>12}",
            "Rank", "Algorithm", "MHz", "EDP (J·ms)", "Energy (J)", "Time (ms)"
        );
        writeln!(writer, "{}", self.bold(&header))?;
        writeln!(writer, "{}", "-".repeat(80))?;

        let ranking = &report.rankings.edp_ranking;
        let shown = ranking.len().min(self.ranking_limit);
        for (i, entry) in ranking.iter().take(shown).enumerate() {
            let line = format!(
                "{:<6} {:<20} {:>8} {:>15.6} {:>15.6} {:>12.3}",
                i + 1,
                display_name(&entry.algorithm),
                entry.frequency_mhz,
                entry.edp,
                entry.energy,
                entry.time
            );
            if i == 0 && ranking.len() > 1 {
                writeln!(writer, "{}", self.good(&line))?;
            } else {
                writeln!(writer, "{}", line)?;
            }
        }
        if ranking.len() > shown {
            writeln!(
                writer,
                "{}",
                self.muted(&format!("... {} more", ranking.len() - shown))
            )?;
        }
        Ok(())
    }

    fn print_extremes(&self, writer: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
        writeln!(writer)?;
        writeln!(writer, "{}", self.bold("BEST FREQUENCY PER ALGORITHM (by EDP)"))?;
        writeln!(writer, "{}", "-".repeat(80))?;

        for e in &report.rankings.edp_extremes {
            writeln!(writer, "{}:", display_name(&e.algorithm))?;
            writeln!(
                writer,
                "  Best:        {}",
                self.good(&format!("{} MHz (EDP: {:.6} J·ms)", e.best_frequency_mhz, e.best_edp))
            )?;
            writeln!(
                writer,
                "  Worst:       {}",
                self.bad(&format!("{} MHz (EDP: {:.6} J·ms)", e.worst_frequency_mhz, e.worst_edp))
            )?;
            writeln!(writer, "  Improvement: {:.1}%", e.improvement_pct)?;
        }
        Ok(())
    }

    fn print_optimal(&self, writer: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
        writeln!(writer)?;
        writeln!(
            writer,
            "{}",
            self.bold("MINIMUM-ENERGY FREQUENCY PER ALGORITHM (background workloads)")
        )?;
        writeln!(writer, "{}", "-".repeat(80))?;

        for o in &report.rankings.optimal_frequencies {
            writeln!(writer, "{}:", display_name(&o.algorithm))?;
            writeln!(
                writer,
                "  Optimal frequency: {}",
                self.good(&format!("{} MHz", o.optimal_frequency_mhz))
            )?;
            writeln!(writer, "  Minimum energy:    {:.6} J", o.min_energy)?;
            writeln!(
                writer,
                "  Saving vs {} MHz: {:.1}%",
                o.max_frequency_mhz, o.energy_savings_pct
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Write the full report to any writer.
    pub fn write_report(
        &self,
        writer: &mut impl Write,
        report: &AnalysisReport,
    ) -> Result<(), ReportError> {
        self.print_overview(writer, report)?;
        self.print_groups(writer, report)?;
        self.print_ranking(writer, report)?;
        self.print_extremes(writer, report)?;
        self.print_optimal(writer, report)?;
        Ok(())
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, report: &AnalysisReport) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.write_report(&mut writer, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::sample_report;
    use crate::stats::ConfidenceInterval;

    fn render(reporter: &TerminalReporter) -> String {
        let mut buffer = Vec::new();
        reporter
            .write_report(&mut buffer, &sample_report())
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_format_metric_singleton() {
        let metric = MetricSummary {
            mean: 0.25,
            std_dev: None,
            ci: None,
        };
        let lines = TerminalReporter::format_metric(&metric, "J", 6, 95);
        assert_eq!(lines, vec!["  Mean:   0.250000 J"]);
    }

    #[test]
    fn test_format_metric_with_interval() {
        let metric = MetricSummary {
            mean: 101.25,
            std_dev: Some(8.539),
            ci: Some(ConfidenceInterval {
                lower: 95.0,
                upper: 107.5,
                level: 0.95,
            }),
        };
        let lines = TerminalReporter::format_metric(&metric, "ms", 3, 95);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "  Std:    8.539 ms");
        assert_eq!(lines[2], "  CI 95%: [95.000, 107.500] ms");
    }

    #[test]
    fn test_report_to_buffer() {
        let output = render(&TerminalReporter::without_colors());

        assert!(output.contains("BUBBLE SORT"));
        assert!(output.contains("QUICK SORT"));
        assert!(output.contains("CPU: 500 MHz"));
        assert!(output.contains("CPU: 1500 MHz"));
        assert!(output.contains("N/A (single sample)"));
        assert!(output.contains("ENERGY EFFICIENCY RANKING"));
        assert!(output.contains("Quick Sort"));
        assert!(output.contains("Optimal frequency"));
        assert!(!output.contains("\u{1b}["));
    }

    #[test]
    fn test_ranking_limit_truncates() {
        let output = render(&TerminalReporter::without_colors().with_ranking_limit(2));
        assert!(output.contains("... 2 more"));
    }
}
