use serde::Serialize;
use thiserror::Error;

use crate::aggregate::Analysis;
use crate::dataset::Dataset;
use crate::ranking::Rankings;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Render error: {0}")]
    Render(String),
}

/// Everything a reporter needs: dataset overview, group statistics and rankings.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// The file, directory or pattern the data came from.
    pub source: String,
    pub total_observations: usize,
    pub algorithms: Vec<String>,
    /// Known frequencies, ascending.
    pub frequencies_mhz: Vec<u32>,
    /// Distinct input sizes, when the data carries them.
    pub sizes: Vec<u64>,
    pub confidence_level: f64,
    pub analysis: Analysis,
    pub rankings: Rankings,
}

impl AnalysisReport {
    pub fn new(
        source: impl Into<String>,
        dataset: &Dataset,
        analysis: Analysis,
        confidence_level: f64,
    ) -> Self {
        let rankings = Rankings::from_analysis(&analysis);
        Self {
            source: source.into(),
            total_observations: dataset.len(),
            algorithms: dataset.algorithms().into_iter().map(String::from).collect(),
            frequencies_mhz: dataset.frequencies().into_iter().collect(),
            sizes: dataset.sizes().into_iter().collect(),
            confidence_level,
            analysis,
            rankings,
        }
    }

    /// Confidence level as a whole percentage, for labels like "CI 95%".
    pub fn confidence_pct(&self) -> u32 {
        (self.confidence_level * 100.0).round() as u32
    }
}

pub trait Reporter: Send + Sync {
    fn report(&self, report: &AnalysisReport) -> Result<(), ReportError>;
}

/// "bubble_sort" -> "Bubble Sort"
pub fn display_name(algorithm: &str) -> String {
    algorithm
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// "bubble_sort" -> "BUBBLE SORT"
pub fn heading_name(algorithm: &str) -> String {
    algorithm.replace('_', " ").to_uppercase()
}

mod csv_file;
mod json;
mod terminal;
mod text;
pub use csv_file::CsvReporter;
pub use json::JsonReporter;
pub use terminal::TerminalReporter;
pub use text::TextReporter;
