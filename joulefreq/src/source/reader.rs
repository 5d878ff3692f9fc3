use std::path::Path;
use std::sync::LazyLock;

use joulefreq_core::{Dataset, Frequency, Observation};
use regex::Regex;
use tracing::{debug, info};

use super::{DataSource, FileSummary, FrequencyOrigin, LoadError, LoadedData, SourceSpec};

const ALGO_COLUMN: &str = "algo";
const ENERGY_COLUMN: &str = "joules";
const TIME_COLUMN: &str = "time_ms";
const SIZE_COLUMN: &str = "size";

static MHZ_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)mhz").expect("invalid MHz file name regex"));

/// Parse a CPU frequency from a file name such as `run-1500MHz.csv`.
///
/// Matches the first `<digits>mhz` fragment, case-insensitively.
pub fn frequency_from_file_name(name: &str) -> Option<u32> {
    MHZ_PATTERN.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Loads observations from CSV files with at least `algo`, `joules` and
/// `time_ms` columns, and optionally a frequency column and `size`.
///
/// When the frequency column is present it takes precedence over the file
/// name; otherwise the file name is searched for `<digits>mhz`.
#[derive(Debug, Clone)]
pub struct CsvSource {
    spec: SourceSpec,
    frequency_column: String,
}

/// Column positions within one file's header row.
struct Columns {
    algo: usize,
    energy: usize,
    time: usize,
    frequency: Option<usize>,
    size: Option<usize>,
}

impl Columns {
    fn locate(
        headers: &csv::StringRecord,
        frequency_column: &str,
        file: &str,
    ) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let required = [ALGO_COLUMN, ENERGY_COLUMN, TIME_COLUMN];
        let missing: Vec<String> = required
            .iter()
            .filter(|name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();

        match (find(ALGO_COLUMN), find(ENERGY_COLUMN), find(TIME_COLUMN)) {
            (Some(algo), Some(energy), Some(time)) => Ok(Self {
                algo,
                energy,
                time,
                frequency: find(frequency_column),
                size: find(SIZE_COLUMN),
            }),
            _ => Err(LoadError::MissingColumns {
                file: file.to_string(),
                columns: missing,
            }),
        }
    }
}

impl CsvSource {
    pub fn new(spec: SourceSpec, frequency_column: impl Into<String>) -> Self {
        Self {
            spec,
            frequency_column: frequency_column.into(),
        }
    }

    /// Classify `input` and read with the default `freq_mhz` column.
    pub fn from_input(input: &str) -> Self {
        Self::new(SourceSpec::parse(input), "freq_mhz")
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    fn read_file(&self, path: &Path) -> Result<(Dataset, FileSummary), LoadError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let csv_error = |error| LoadError::Csv {
            file: name.clone(),
            error,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let headers = reader.headers().map_err(csv_error)?.clone();
        let columns = Columns::locate(&headers, &self.frequency_column, &name)?;

        let origin = match columns.frequency {
            Some(_) => FrequencyOrigin::Column,
            None => match frequency_from_file_name(&name) {
                Some(mhz) => FrequencyOrigin::FileName(mhz),
                None => FrequencyOrigin::Unidentified,
            },
        };
        debug!(file = %name, ?origin, "reading CSV");

        let mut dataset = Dataset::default();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let invalid = |column: &str, value: &str| LoadError::InvalidValue {
                file: name.clone(),
                line,
                column: column.to_string(),
                value: value.to_string(),
            };
            let field = |index: usize| record.get(index).unwrap_or("");

            let algorithm = field(columns.algo);
            if algorithm.is_empty() {
                return Err(invalid(ALGO_COLUMN, algorithm));
            }

            let energy_j = parse_measurement(field(columns.energy))
                .ok_or_else(|| invalid(ENERGY_COLUMN, field(columns.energy)))?;
            let time_ms = parse_measurement(field(columns.time))
                .ok_or_else(|| invalid(TIME_COLUMN, field(columns.time)))?;

            let frequency = match (columns.frequency, origin) {
                (Some(index), _) => {
                    let raw = field(index);
                    if raw.is_empty() {
                        Frequency::Unidentified
                    } else {
                        parse_whole::<u32>(raw)
                            .map(Frequency::Mhz)
                            .ok_or_else(|| invalid(&self.frequency_column, raw))?
                    }
                }
                (None, FrequencyOrigin::FileName(mhz)) => Frequency::Mhz(mhz),
                (None, _) => Frequency::Unidentified,
            };

            let size = match columns.size.map(field) {
                None | Some("") => None,
                Some(raw) => Some(
                    parse_whole::<u64>(raw).ok_or_else(|| invalid(SIZE_COLUMN, raw))?,
                ),
            };

            dataset.push(Observation {
                algorithm: algorithm.to_string(),
                energy_j,
                time_ms,
                frequency,
                size,
                source: name.clone(),
            });
        }

        let summary = FileSummary {
            name: name.clone(),
            rows: dataset.len(),
            frequency: origin,
        };
        Ok((dataset, summary))
    }
}

/// A finite, non-negative float.
fn parse_measurement(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// An integer, also accepting whole-valued floats such as `1500.0`.
fn parse_whole<T>(raw: &str) -> Option<T>
where
    T: std::str::FromStr + TryFrom<u64>,
{
    if let Ok(value) = raw.parse::<T>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        T::try_from(value as u64).ok()
    } else {
        None
    }
}

impl DataSource for CsvSource {
    fn describe(&self) -> String {
        self.spec.to_string()
    }

    fn load(&self) -> Result<LoadedData, LoadError> {
        let files = self.spec.resolve()?;

        let mut dataset = Dataset::default();
        let mut summaries = Vec::with_capacity(files.len());
        for path in &files {
            let (rows, summary) = self.read_file(path)?;
            info!(file = %summary.name, rows = summary.rows, "loaded");
            dataset.extend(rows);
            summaries.push(summary);
        }

        Ok(LoadedData {
            dataset,
            files: summaries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn load(path: &Path) -> Result<LoadedData, LoadError> {
        CsvSource::from_input(path.to_str().unwrap()).load()
    }

    #[test]
    fn test_frequency_from_file_name() {
        assert_eq!(frequency_from_file_name("run-500mhz.csv"), Some(500));
        assert_eq!(frequency_from_file_name("energy_1500MHz.csv"), Some(1500));
        assert_eq!(frequency_from_file_name("cpu2400Mhz_run3.csv"), Some(2400));
        assert_eq!(frequency_from_file_name("energy.csv"), None);
        assert_eq!(frequency_from_file_name("mhz.csv"), None);
        assert_eq!(frequency_from_file_name("99999999999mhz.csv"), None);
    }

    #[test]
    fn test_frequency_pattern_reused_across_files() {
        let names = ["a-800mhz.csv", "b-1200MHZ.csv", "c.csv", "d-3000mhz-2.csv"];
        let parsed: Vec<Option<u32>> = names.iter().map(|n| frequency_from_file_name(n)).collect();
        assert_eq!(parsed, vec![Some(800), Some(1200), None, Some(3000)]);
        assert!(MHZ_PATTERN.is_match("x-1mhz.csv"));
    }

    #[test]
    fn test_parse_whole() {
        assert_eq!(parse_whole::<u32>("1500"), Some(1500));
        assert_eq!(parse_whole::<u32>("1500.0"), Some(1500));
        assert_eq!(parse_whole::<u32>("1500.5"), None);
        assert_eq!(parse_whole::<u32>("-3"), None);
        assert_eq!(parse_whole::<u64>("abc"), None);
    }

    #[test]
    fn test_frequency_column_takes_precedence() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "run-500mhz.csv",
            "algo,size,freq_mhz,joules,time_ms\n\
             bubble_sort,1000,1200,1.0,100\n\
             bubble_sort,1000,1800.0,0.9,80\n",
        );

        let loaded = load(&path).unwrap();
        let obs = loaded.dataset.observations();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].frequency, Frequency::Mhz(1200));
        assert_eq!(obs[1].frequency, Frequency::Mhz(1800));
        assert_eq!(obs[0].size, Some(1000));
        assert_eq!(loaded.files[0].frequency, FrequencyOrigin::Column);
    }

    #[test]
    fn test_frequency_from_name_and_provenance() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "run-1500MHz.csv",
            "algo,joules,time_ms\nquick_sort,0.5,20\n",
        );

        let loaded = load(&path).unwrap();
        let o = &loaded.dataset.observations()[0];
        assert_eq!(o.frequency, Frequency::Mhz(1500));
        assert_eq!(o.source, "run-1500MHz.csv");
        assert_eq!(o.size, None);
        assert_eq!(loaded.files[0].frequency, FrequencyOrigin::FileName(1500));
    }

    #[test]
    fn test_unidentified_frequency_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "energy.csv", "algo,joules,time_ms\nmerge_sort,0.7,30\n");

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.dataset.len(), 1);
        assert_eq!(
            loaded.dataset.observations()[0].frequency,
            Frequency::Unidentified
        );
        assert_eq!(loaded.files[0].frequency, FrequencyOrigin::Unidentified);
    }

    #[test]
    fn test_whitespace_and_column_order() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "run-800mhz.csv",
            "time_ms , joules , algo\n 12.5 , 0.25 , heap_sort \n",
        );

        let loaded = load(&path).unwrap();
        let o = &loaded.dataset.observations()[0];
        assert_eq!(o.algorithm, "heap_sort");
        assert_eq!(o.energy_j, 0.25);
        assert_eq!(o.time_ms, 12.5);
    }

    #[test]
    fn test_missing_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "run-500mhz.csv", "algo,joules\nbubble_sort,1.0\n");

        match load(&path) {
            Err(LoadError::MissingColumns { file, columns }) => {
                assert_eq!(file, "run-500mhz.csv");
                assert_eq!(columns, vec!["time_ms".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_energy() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "run-500mhz.csv",
            "algo,joules,time_ms\nbubble_sort,1.0,100\nbubble_sort,oops,100\n",
        );

        match load(&path) {
            Err(LoadError::InvalidValue {
                line,
                column,
                value,
                ..
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "joules");
                assert_eq!(value, "oops");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_time_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "run-500mhz.csv",
            "algo,joules,time_ms\nbubble_sort,1.0,-5\n",
        );
        assert!(matches!(
            load(&path),
            Err(LoadError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_custom_frequency_column() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "data.csv",
            "algo,cpu_mhz,joules,time_ms\nbubble_sort,2000,1.0,10\n",
        );

        let source = CsvSource::new(SourceSpec::File(path), "cpu_mhz");
        let loaded = source.load().unwrap();
        assert_eq!(
            loaded.dataset.observations()[0].frequency,
            Frequency::Mhz(2000)
        );
    }
}
