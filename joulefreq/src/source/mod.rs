//! Input resolution and loading.
//!
//! A source is a single CSV file, a directory (every `*.csv` directly inside
//! it), or a glob pattern. Matched files are read in sorted order and
//! concatenated into one [`Dataset`], each row tagged with its file name.

use std::path::{Path, PathBuf};

use joulefreq_core::Dataset;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Source not found: {0}")]
    NotFound(String),
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("Failed to read {file}: {error}")]
    Csv { file: String, error: csv::Error },
    #[error("Missing required columns in {file}: {}", .columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },
    #[error("Invalid value in {file}, line {line}, column '{column}': {value:?}")]
    InvalidValue {
        file: String,
        line: u64,
        column: String,
        value: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a file's frequency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyOrigin {
    /// Read per row from the frequency column.
    Column,
    /// Parsed from a `<digits>mhz` fragment of the file name.
    FileName(u32),
    Unidentified,
}

/// What was read from one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub rows: usize,
    pub frequency: FrequencyOrigin,
}

/// A loaded dataset plus per-file provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub files: Vec<FileSummary>,
}

pub trait DataSource {
    /// Human-readable description of the source, used in reports.
    fn describe(&self) -> String;

    fn load(&self) -> Result<LoadedData, LoadError>;
}

/// How a user-supplied source string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    File(PathBuf),
    Directory(PathBuf),
    Pattern(String),
}

impl SourceSpec {
    /// Classify a source string: existing file, existing directory, or glob pattern.
    pub fn parse(input: &str) -> Self {
        let path = Path::new(input);
        if path.is_file() {
            SourceSpec::File(path.to_path_buf())
        } else if path.is_dir() {
            SourceSpec::Directory(path.to_path_buf())
        } else {
            SourceSpec::Pattern(input.to_string())
        }
    }

    /// Resolve to the list of files to read, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotFound`] when nothing matches.
    pub fn resolve(&self) -> Result<Vec<PathBuf>, LoadError> {
        let files = match self {
            SourceSpec::File(path) => vec![path.clone()],
            SourceSpec::Directory(dir) => csv_files_in(dir)?,
            SourceSpec::Pattern(pattern) => glob_files(pattern)?,
        };

        if files.is_empty() {
            return Err(LoadError::NotFound(self.to_string()));
        }
        Ok(files)
    }
}

impl std::fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSpec::File(path) | SourceSpec::Directory(path) => {
                write!(f, "{}", path.display())
            }
            SourceSpec::Pattern(pattern) => f.write_str(pattern),
        }
    }
}

/// Non-hidden `*.csv` files directly inside `dir`, sorted.
fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        let is_csv = path.extension().is_some_and(|ext| ext == "csv");
        if is_csv && !hidden && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn glob_files(pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    let paths = glob::glob(pattern).map_err(|e| LoadError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.msg.to_string(),
    })?;

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("skipping unreadable glob match: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

mod reader;
pub use reader::{frequency_from_file_name, CsvSource};
