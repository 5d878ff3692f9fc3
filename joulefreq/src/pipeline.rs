//! End-to-end analysis driver.
//!
//! Loads the source, aggregates it into per-(algorithm, frequency) statistics,
//! ranks the groups, writes the text report, consolidated CSV, JSON summary
//! and charts, and then prints the console report. Nothing is written unless
//! loading and aggregation both succeed.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use joulefreq_core::{
    Aggregator, AnalysisError, AnalysisReport, CsvReporter, JsonReporter, ReportError, Reporter,
    TerminalReporter, TextReporter,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::chart::ChartRenderer;
use crate::config::Config;
use crate::source::{CsvSource, DataSource, FrequencyOrigin, LoadError, LoadedData, SourceSpec};

/// Errors that can occur while running the analysis.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load data: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("failed to write {path}: {error}")]
    Output { path: PathBuf, error: ReportError },
}

/// What a successful run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub report: AnalysisReport,
    /// Every file written, in the order it was written.
    pub outputs: Vec<PathBuf>,
}

pub struct Pipeline {
    config: Config,
    print_console: bool,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            print_console: true,
        }
    }

    /// Skip the stdout report; files are still written.
    pub fn without_console(mut self) -> Self {
        self.print_console = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run on a source string (file, directory or glob pattern).
    pub fn run(&self, source: &str) -> Result<PipelineOutcome, PipelineError> {
        let source = CsvSource::new(
            SourceSpec::parse(source),
            self.config.input.frequency_column.clone(),
        );
        self.run_source(&source)
    }

    pub fn run_source(&self, source: &dyn DataSource) -> Result<PipelineOutcome, PipelineError> {
        self.run_with_console(source, &mut io::stdout())
    }

    /// Like [`Pipeline::run_source`], printing the console report to `console`.
    ///
    /// Files are written before the console report, and a closed console
    /// (broken pipe) is not an error.
    pub fn run_with_console<W: Write>(
        &self,
        source: &dyn DataSource,
        console: &mut W,
    ) -> Result<PipelineOutcome, PipelineError> {
        eprintln!("Loading data from {}...", source.describe());
        let loaded = source.load()?;
        print_load_notices(&loaded);

        eprintln!(
            "Aggregating {} observations ({} resamples, {:.0}% confidence)...",
            loaded.dataset.len(),
            self.config.analysis.resamples,
            self.config.analysis.confidence_level * 100.0
        );
        let aggregator = Aggregator::new(self.config.bootstrap());
        let analysis = aggregator.aggregate(&loaded.dataset)?;
        info!(groups = analysis.len(), "aggregation complete");

        let report = AnalysisReport::new(
            source.describe(),
            &loaded.dataset,
            analysis,
            aggregator.confidence_level(),
        );

        let outputs = self.write_outputs(&report)?;
        for path in &outputs {
            eprintln!("Wrote {}", path.display());
        }

        if self.print_console {
            self.print_console_report(&report, console)?;
        }

        Ok(PipelineOutcome { report, outputs })
    }

    fn print_console_report<W: Write>(
        &self,
        report: &AnalysisReport,
        console: &mut W,
    ) -> Result<(), PipelineError> {
        let terminal = if self.config.output.color {
            TerminalReporter::new()
        } else {
            TerminalReporter::without_colors()
        };
        let result = terminal
            .with_ranking_limit(self.config.output.ranking_limit)
            .write_report(&mut *console, report)
            .and_then(|()| console.flush().map_err(ReportError::from));

        match result {
            Err(ReportError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("console closed, report not printed");
                Ok(())
            }
            other => other.map_err(|error| PipelineError::Output {
                path: PathBuf::from("<stdout>"),
                error,
            }),
        }
    }

    fn write_outputs(&self, report: &AnalysisReport) -> Result<Vec<PathBuf>, PipelineError> {
        let output = &self.config.output;
        create_dir(&output.directory)?;
        if let Some(parent) = output.report_file.parent() {
            create_dir(parent)?;
        }

        let file_reporters: Vec<(PathBuf, Box<dyn Reporter>)> = vec![
            (
                output.report_file.clone(),
                Box::new(TextReporter::new(&output.report_file)),
            ),
            (
                self.config.csv_path(),
                Box::new(CsvReporter::new(self.config.csv_path())),
            ),
            (
                self.config.json_path(),
                Box::new(JsonReporter::new(self.config.json_path())),
            ),
        ];

        let mut written = Vec::new();
        for (path, reporter) in file_reporters {
            reporter
                .report(report)
                .map_err(|error| PipelineError::Output {
                    path: path.clone(),
                    error,
                })?;
            written.push(path);
        }

        if output.charts {
            let charts = ChartRenderer::new(&output.directory, output.combined_chart_limit);
            if charts.skips_combined(report) {
                eprintln!(
                    "Warning: {} algorithms exceed the combined chart limit of {}, skipping {}",
                    report.analysis.algorithms().len(),
                    output.combined_chart_limit,
                    charts.combined_chart_path().display()
                );
            }
            let paths = charts
                .render(report)
                .map_err(|error| PipelineError::Output {
                    path: output.directory.clone(),
                    error,
                })?;
            written.extend(paths);
        }

        Ok(written)
    }
}

fn create_dir(dir: &Path) -> Result<(), PipelineError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::Output {
        path: dir.to_path_buf(),
        error: ReportError::Io(e),
    })
}

fn print_load_notices(loaded: &LoadedData) {
    for file in &loaded.files {
        let frequency = match file.frequency {
            FrequencyOrigin::Column => "frequency from column".to_string(),
            FrequencyOrigin::FileName(mhz) => format!("{} MHz from file name", mhz),
            FrequencyOrigin::Unidentified => "frequency unidentified".to_string(),
        };
        eprintln!("  Loaded {}: {} rows ({})", file.name, file.rows, frequency);
    }

    let dataset = &loaded.dataset;
    let sizes = dataset.sizes();
    if !sizes.is_empty() {
        let sizes: Vec<String> = sizes.iter().map(u64::to_string).collect();
        eprintln!("  Input sizes: {}", sizes.join(", "));
    }

    let frequencies: Vec<String> = dataset.frequencies().iter().map(u32::to_string).collect();
    if !frequencies.is_empty() {
        eprintln!("  Frequencies (MHz): {}", frequencies.join(", "));
    }

    let unidentified = dataset.unidentified_count();
    if unidentified > 0 {
        eprintln!(
            "  Warning: {} of {} rows have no identifiable frequency and are excluded from grouping",
            unidentified,
            dataset.len()
        );
    }
}
