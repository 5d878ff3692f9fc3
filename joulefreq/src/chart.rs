//! SVG charts of mean energy per CPU frequency.
//!
//! Renders one bar chart per algorithm (`energy_<algorithm>.svg`) and, for a
//! small enough number of algorithms, one combined chart with a panel per
//! algorithm (`energy_vs_frequency.svg`).

use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};

use joulefreq_core::report::display_name;
use joulefreq_core::{AnalysisReport, GroupStats, ReportError, Reporter};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, warn};

pub const COMBINED_CHART_FILE: &str = "energy_vs_frequency.svg";

const CHART_PREFIX: &str = "energy_";

const CHART_SIZE: (u32, u32) = (900, 600);
const PANEL_SIZE: (u32, u32) = (520, 380);
const PANEL_COLUMNS: usize = 3;

type DrawResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Clone)]
pub struct ChartRenderer {
    directory: PathBuf,
    combined_limit: usize,
}

impl ChartRenderer {
    pub fn new(directory: impl Into<PathBuf>, combined_limit: usize) -> Self {
        Self {
            directory: directory.into(),
            combined_limit,
        }
    }

    /// One chart path per algorithm, in the given order.
    ///
    /// Names that sanitize to the same file stem (compared case-insensitively,
    /// and including the combined chart's stem) get a numeric suffix, so every
    /// algorithm keeps its own file.
    pub fn chart_paths(&self, algorithms: &[&str]) -> Vec<PathBuf> {
        let combined_stem = COMBINED_CHART_FILE
            .trim_start_matches(CHART_PREFIX)
            .trim_end_matches(".svg");
        let mut used: HashSet<String> = HashSet::from([combined_stem.to_lowercase()]);

        algorithms
            .iter()
            .map(|algorithm| {
                let stem = file_stem(algorithm);
                let mut candidate = stem.clone();
                let mut suffix = 2;
                while !used.insert(candidate.to_lowercase()) {
                    candidate = format!("{}_{}", stem, suffix);
                    suffix += 1;
                }
                self.directory
                    .join(format!("{}{}.svg", CHART_PREFIX, candidate))
            })
            .collect()
    }

    pub fn combined_chart_path(&self) -> PathBuf {
        self.directory.join(COMBINED_CHART_FILE)
    }

    /// Whether `render` will leave out the combined chart for this report.
    ///
    /// Counts algorithms that have at least one group; algorithms whose rows
    /// all lack a frequency get no chart at all.
    pub fn skips_combined(&self, report: &AnalysisReport) -> bool {
        report.analysis.algorithms().len() > self.combined_limit
    }

    /// Render every chart, returning the paths written.
    ///
    /// The combined chart is skipped with a warning when there are more
    /// algorithms than the configured limit.
    pub fn render(&self, report: &AnalysisReport) -> Result<Vec<PathBuf>, ReportError> {
        std::fs::create_dir_all(&self.directory)?;

        let analysis = &report.analysis;
        let algorithms = analysis.algorithms();
        let mut written = Vec::with_capacity(algorithms.len() + 1);

        for (algorithm, path) in algorithms.iter().zip(self.chart_paths(&algorithms)) {
            let groups: Vec<&GroupStats> = analysis.for_algorithm(algorithm).collect();
            draw_single(&path, algorithm, &groups, report.confidence_pct())
                .map_err(render_error)?;
            debug!(path = %path.display(), "chart written");
            written.push(path);
        }

        if self.skips_combined(report) {
            warn!(
                algorithms = algorithms.len(),
                limit = self.combined_limit,
                "too many algorithms for the combined chart, skipping it"
            );
        } else if !algorithms.is_empty() {
            let panels: Vec<(&str, Vec<&GroupStats>)> = algorithms
                .iter()
                .map(|algorithm| (*algorithm, analysis.for_algorithm(algorithm).collect()))
                .collect();
            let path = self.combined_chart_path();
            draw_combined(&path, &panels, report.confidence_pct()).map_err(render_error)?;
            debug!(path = %path.display(), "combined chart written");
            written.push(path);
        }

        Ok(written)
    }
}

impl Reporter for ChartRenderer {
    fn report(&self, report: &AnalysisReport) -> Result<(), ReportError> {
        self.render(report).map(|_| ())
    }
}

fn render_error(e: Box<dyn Error>) -> ReportError {
    ReportError::Render(e.to_string())
}

/// Algorithm names come from CSV cells; keep file names portable.
fn file_stem(algorithm: &str) -> String {
    algorithm
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn draw_single(
    path: &Path,
    algorithm: &str,
    groups: &[&GroupStats],
    confidence_pct: u32,
) -> DrawResult<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    draw_panel(&root, algorithm, groups, confidence_pct, 24)?;
    root.present()?;
    Ok(())
}

fn draw_combined(
    path: &Path,
    panels: &[(&str, Vec<&GroupStats>)],
    confidence_pct: u32,
) -> DrawResult<()> {
    let columns = panels.len().clamp(1, PANEL_COLUMNS);
    let rows = panels.len().div_ceil(columns);
    let size = (
        PANEL_SIZE.0 * columns as u32,
        PANEL_SIZE.1 * rows as u32 + 40,
    );

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Energy by CPU frequency", ("sans-serif", 26))?;

    let areas = root.split_evenly((rows, columns));
    for (area, (algorithm, groups)) in areas.iter().zip(panels) {
        draw_panel(area, algorithm, groups, confidence_pct, 18)?;
    }

    root.present()?;
    Ok(())
}

/// Bars of mean energy at each frequency, with interval whiskers where the
/// group has an interval and the mean printed above each bar.
fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    algorithm: &str,
    groups: &[&GroupStats],
    confidence_pct: u32,
    caption_size: u32,
) -> DrawResult<()>
where
    DB::ErrorType: 'static,
{
    let frequencies: Vec<f64> = groups.iter().map(|g| g.frequency_mhz() as f64).collect();
    let half_width = bar_half_width(&frequencies);
    let x_min = frequencies.iter().copied().fold(f64::INFINITY, f64::min) - 2.0 * half_width;
    let x_max = frequencies.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 2.0 * half_width;

    let y_top = groups
        .iter()
        .map(|g| g.energy.ci.map_or(g.energy.mean, |ci| ci.upper.max(g.energy.mean)))
        .fold(0.0, f64::max);
    let y_max = if y_top > 0.0 { y_top * 1.2 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(display_name(algorithm), ("sans-serif", caption_size))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min.max(0.0)..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("CPU frequency (MHz)")
        .y_desc("Energy (J)")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&|y| format!("{:.3}", y))
        .draw()?;

    chart.draw_series(groups.iter().map(|g| {
        let x = g.frequency_mhz() as f64;
        Rectangle::new(
            [(x - half_width, 0.0), (x + half_width, g.energy.mean)],
            BLUE.mix(0.6).filled(),
        )
    }))?;

    let whiskers: Vec<_> = groups
        .iter()
        .filter_map(|g| {
            let ci = g.energy.ci?;
            Some(ErrorBar::new_vertical(
                g.frequency_mhz() as f64,
                ci.lower,
                g.energy.mean,
                ci.upper,
                BLACK.stroke_width(1),
                10,
            ))
        })
        .collect();
    if !whiskers.is_empty() {
        chart
            .draw_series(whiskers)?
            .label(format!("CI {}%", confidence_pct))
            .legend(|(x, y)| PathElement::new(vec![(x, y - 5), (x, y + 5)], &BLACK));
        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .draw()?;
    }

    let label_offset = y_max * 0.02;
    chart.draw_series(groups.iter().map(|g| {
        let top = g.energy.ci.map_or(g.energy.mean, |ci| ci.upper.max(g.energy.mean));
        Text::new(
            format!("{:.3}", g.energy.mean),
            (g.frequency_mhz() as f64 - half_width, top + label_offset),
            ("sans-serif", 13).into_font(),
        )
    }))?;

    Ok(())
}

/// Bars take 70% of the narrowest gap between adjacent frequencies.
fn bar_half_width(frequencies: &[f64]) -> f64 {
    let narrowest = frequencies
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0.0)
        .fold(f64::INFINITY, f64::min);
    if narrowest.is_finite() {
        narrowest * 0.35
    } else {
        frequencies
            .first()
            .map_or(50.0, |f| (f * 0.1).max(50.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joulefreq_core::{Aggregator, Bootstrap, Dataset, Frequency, Observation};
    use std::fs;
    use tempfile::TempDir;

    fn obs(algorithm: &str, mhz: u32, energy_j: f64, time_ms: f64) -> Observation {
        Observation {
            algorithm: algorithm.to_string(),
            energy_j,
            time_ms,
            frequency: Frequency::Mhz(mhz),
            size: None,
            source: "test.csv".to_string(),
        }
    }

    fn report(algorithms: &[&str]) -> AnalysisReport {
        let mut rows = Vec::new();
        for algorithm in algorithms {
            rows.push(obs(algorithm, 800, 1.0, 100.0));
            rows.push(obs(algorithm, 800, 1.2, 110.0));
            rows.push(obs(algorithm, 1600, 0.7, 50.0));
        }
        let dataset: Dataset = rows.into_iter().collect();
        let analysis = Aggregator::new(Bootstrap::new(200, 0.95, 42))
            .aggregate(&dataset)
            .unwrap();
        AnalysisReport::new("test.csv", &dataset, analysis, 0.95)
    }

    #[test]
    fn test_renders_per_algorithm_and_combined() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path().join("charts"), 10);

        let written = renderer
            .render(&report(&["bubble_sort", "quick_sort"]))
            .unwrap();

        assert_eq!(written.len(), 3);
        for name in [
            "energy_bubble_sort.svg",
            "energy_quick_sort.svg",
            COMBINED_CHART_FILE,
        ] {
            let content = fs::read_to_string(dir.path().join("charts").join(name)).unwrap();
            assert!(content.contains("<svg"), "{} is not an SVG", name);
        }
    }

    #[test]
    fn test_combined_chart_skipped_above_limit() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path(), 2);

        let written = renderer
            .render(&report(&["a_sort", "b_sort", "c_sort"]))
            .unwrap();

        assert_eq!(written.len(), 3);
        assert!(!renderer.combined_chart_path().exists());
        assert!(dir.path().join("energy_c_sort.svg").exists());
    }

    #[test]
    fn test_single_frequency_and_singleton_group() {
        let dir = TempDir::new().unwrap();
        let dataset: Dataset = vec![obs("heap_sort", 1200, 0.4, 20.0)].into_iter().collect();
        let analysis = Aggregator::new(Bootstrap::new(200, 0.95, 42))
            .aggregate(&dataset)
            .unwrap();
        let report = AnalysisReport::new("x.csv", &dataset, analysis, 0.95);

        let renderer = ChartRenderer::new(dir.path(), 10);
        renderer.report(&report).unwrap();
        assert!(dir.path().join("energy_heap_sort.svg").exists());
    }

    #[test]
    fn test_colliding_names_get_distinct_files() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path(), 10);

        let written = renderer
            .render(&report(&["merge sort", "merge_sort", "Merge_Sort"]))
            .unwrap();

        assert_eq!(written.len(), 4);
        let unique: HashSet<&PathBuf> = written.iter().collect();
        assert_eq!(unique.len(), written.len());
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "energy_Merge_Sort.svg",
                "energy_merge_sort_2.svg",
                "energy_merge_sort_3.svg",
                COMBINED_CHART_FILE,
            ]
        );
    }

    #[test]
    fn test_algorithm_named_like_combined_chart() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path(), 10);

        let paths = renderer.chart_paths(&["vs_frequency", "bubble_sort"]);
        assert_eq!(paths[0], dir.path().join("energy_vs_frequency_2.svg"));
        assert_eq!(paths[1], dir.path().join("energy_bubble_sort.svg"));
    }

    #[test]
    fn test_combined_limit_counts_grouped_algorithms_only() {
        let dir = TempDir::new().unwrap();
        let mut unknown = obs("quick_sort", 0, 0.2, 8.0);
        unknown.frequency = Frequency::Unidentified;
        let dataset: Dataset = vec![
            obs("bubble_sort", 500, 1.0, 100.0),
            obs("bubble_sort", 500, 1.2, 110.0),
            unknown,
        ]
        .into_iter()
        .collect();
        let analysis = Aggregator::new(Bootstrap::new(200, 0.95, 42))
            .aggregate(&dataset)
            .unwrap();
        let report = AnalysisReport::new("x.csv", &dataset, analysis, 0.95);
        assert_eq!(report.algorithms.len(), 2);

        let renderer = ChartRenderer::new(dir.path(), 1);
        assert!(!renderer.skips_combined(&report));
        let written = renderer.render(&report).unwrap();
        assert_eq!(written.len(), 2);
        assert!(renderer.combined_chart_path().exists());
    }

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(file_stem("bubble_sort"), "bubble_sort");
        assert_eq!(file_stem("merge sort/v2"), "merge_sort_v2");
    }

    #[test]
    fn test_bar_half_width() {
        assert!((bar_half_width(&[500.0, 1500.0, 1700.0]) - 70.0).abs() < 1e-9);
        assert!((bar_half_width(&[1000.0]) - 100.0).abs() < 1e-9);
        assert_eq!(bar_half_width(&[200.0]), 50.0);
    }
}
