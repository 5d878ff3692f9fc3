//! Ranking of configurations by energy-delay product and per-algorithm
//! frequency selection.

use serde::{Deserialize, Serialize};

use crate::aggregate::{Analysis, GroupStats};

/// Flattened view of one group, used for sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub algorithm: String,
    pub frequency_mhz: u32,
    /// Mean EDP in J·ms.
    pub edp: f64,
    /// Mean energy in J.
    pub energy: f64,
    /// Mean time in ms.
    pub time: f64,
}

impl From<&GroupStats> for RankingEntry {
    fn from(stats: &GroupStats) -> Self {
        Self {
            algorithm: stats.key.algorithm.clone(),
            frequency_mhz: stats.key.frequency_mhz,
            edp: stats.edp.mean,
            energy: stats.energy.mean,
            time: stats.time.mean,
        }
    }
}

/// Best and worst frequency by mean EDP for one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdpExtremes {
    pub algorithm: String,
    pub best_frequency_mhz: u32,
    pub best_edp: f64,
    pub worst_frequency_mhz: u32,
    pub worst_edp: f64,
    /// (worst - best) / worst * 100.
    pub improvement_pct: f64,
}

/// The frequency with the lowest mean energy for one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalFrequency {
    pub algorithm: String,
    pub optimal_frequency_mhz: u32,
    pub min_energy: f64,
    /// Highest frequency this algorithm was tested at.
    pub max_frequency_mhz: u32,
    pub max_frequency_energy: f64,
    /// (energy at max frequency - min energy) / energy at max frequency * 100.
    pub energy_savings_pct: f64,
}

/// Everything the ranking stage produces for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    pub edp_ranking: Vec<RankingEntry>,
    pub edp_extremes: Vec<EdpExtremes>,
    pub optimal_frequencies: Vec<OptimalFrequency>,
}

impl Rankings {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        Self {
            edp_ranking: rank_by_edp(analysis),
            edp_extremes: edp_extremes(analysis),
            optimal_frequencies: optimal_frequencies(analysis),
        }
    }
}

/// All groups ordered by ascending mean EDP.
///
/// The sort is stable: ties keep (algorithm, frequency) order.
pub fn rank_by_edp(analysis: &Analysis) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> =
        analysis.groups().iter().map(RankingEntry::from).collect();
    entries.sort_by(|a, b| a.edp.total_cmp(&b.edp));
    entries
}

/// Per algorithm, the frequencies with minimum and maximum mean EDP.
///
/// Ties go to the lowest frequency. An algorithm measured at a single
/// frequency reports it as both best and worst with zero improvement.
pub fn edp_extremes(analysis: &Analysis) -> Vec<EdpExtremes> {
    analysis
        .algorithms()
        .into_iter()
        .filter_map(|algorithm| {
            let edp = |g: &GroupStats| g.edp.mean;
            let best = first_extreme(analysis.for_algorithm(algorithm), edp, Extreme::Min)?;
            let worst = first_extreme(analysis.for_algorithm(algorithm), edp, Extreme::Max)?;

            Some(EdpExtremes {
                algorithm: algorithm.to_string(),
                best_frequency_mhz: best.frequency_mhz(),
                best_edp: best.edp.mean,
                worst_frequency_mhz: worst.frequency_mhz(),
                worst_edp: worst.edp.mean,
                improvement_pct: relative_reduction(worst.edp.mean, best.edp.mean),
            })
        })
        .collect()
}

/// Per algorithm, the frequency with minimum mean energy and the saving
/// against the highest tested frequency.
pub fn optimal_frequencies(analysis: &Analysis) -> Vec<OptimalFrequency> {
    analysis
        .algorithms()
        .into_iter()
        .filter_map(|algorithm| {
            let optimal = first_extreme(
                analysis.for_algorithm(algorithm),
                |g| g.energy.mean,
                Extreme::Min,
            )?;
            let highest = analysis.for_algorithm(algorithm).last()?;

            Some(OptimalFrequency {
                algorithm: algorithm.to_string(),
                optimal_frequency_mhz: optimal.frequency_mhz(),
                min_energy: optimal.energy.mean,
                max_frequency_mhz: highest.frequency_mhz(),
                max_frequency_energy: highest.energy.mean,
                energy_savings_pct: relative_reduction(
                    highest.energy.mean,
                    optimal.energy.mean,
                ),
            })
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

/// First group (in iteration order) holding the minimum or maximum of `metric`.
fn first_extreme<'a>(
    groups: impl Iterator<Item = &'a GroupStats>,
    metric: impl Fn(&GroupStats) -> f64,
    extreme: Extreme,
) -> Option<&'a GroupStats> {
    groups.fold(None, |current, candidate| match current {
        None => Some(candidate),
        Some(current) => {
            let replace = match extreme {
                Extreme::Min => metric(candidate) < metric(current),
                Extreme::Max => metric(candidate) > metric(current),
            };
            Some(if replace { candidate } else { current })
        }
    })
}

/// (reference - value) / reference * 100, or zero when the reference is zero.
fn relative_reduction(reference: f64, value: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    (reference - value) / reference * 100.0
}
