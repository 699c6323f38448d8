use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{DataError, Dataset};

/// Average Alura access (percent) above which a scholar counts as a heavy user.
pub const DEFAULT_ALURA_ACCESS_THRESHOLD: f64 = 80.0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Cut-off for `alura_high_access_count`.
    #[serde(default = "default_threshold")]
    pub alura_access_threshold: f64,

    /// Count values equal to the threshold too (`>=` instead of `>`).
    #[serde(default)]
    pub inclusive_threshold: bool,
}

const fn default_threshold() -> f64 {
    DEFAULT_ALURA_ACCESS_THRESHOLD
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            alura_access_threshold: default_threshold(),
            inclusive_threshold: false,
        }
    }
}

impl MetricsConfig {
    fn is_high_access(&self, value: f64) -> bool {
        if self.inclusive_threshold {
            value >= self.alura_access_threshold
        } else {
            value > self.alura_access_threshold
        }
    }
}

// ---------------------------------------------------------------------------
// MetricsSnapshot
// ---------------------------------------------------------------------------

/// Mean merit score, or the explicit absence of one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeritMean {
    /// Rounded to one decimal place.
    Score(f64),
    NoData,
}

impl MeritMean {
    pub fn score(self) -> Result<f64, DataError> {
        match self {
            MeritMean::Score(v) => Ok(v),
            MeritMean::NoData => Err(DataError::NoData),
        }
    }
}

impl fmt::Display for MeritMean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeritMean::Score(v) => write!(f, "{v:.1}"),
            MeritMean::NoData => f.write_str("n/a"),
        }
    }
}

/// Headline figures shown above the table.
///
/// The four headline metrics are computed over the *unfiltered* dataset on
/// purpose: they always show the institution-wide picture and do not move
/// when the sidebar filters change. Only `filtered_count` follows the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub total_scholarship_count: usize,
    pub alura_high_access_count: usize,
    pub distinct_class_group_count: usize,
    pub mean_merit_score: MeritMean,
    pub filtered_count: usize,
}

/// Round half away from zero to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute the snapshot with the default threshold.
pub fn compute(unfiltered: &Dataset, filtered: &Dataset) -> MetricsSnapshot {
    compute_with(&MetricsConfig::default(), unfiltered, filtered)
}

pub fn compute_with(
    config: &MetricsConfig,
    unfiltered: &Dataset,
    filtered: &Dataset,
) -> MetricsSnapshot {
    let records = &unfiltered.records;

    let alura_high_access_count = records
        .iter()
        .filter_map(|r| r.alura_access_average)
        .filter(|&v| config.is_high_access(v))
        .count();

    let distinct_class_group_count = records
        .iter()
        .map(|r| r.class_group.as_str())
        .filter(|g| !g.is_empty())
        .collect::<HashSet<_>>()
        .len();

    let (sum, n) = records
        .iter()
        .filter_map(|r| r.merit_scholarship_average)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    let mean_merit_score = if n == 0 {
        MeritMean::NoData
    } else {
        MeritMean::Score(round1(sum / n as f64))
    };

    MetricsSnapshot {
        total_scholarship_count: records.len(),
        alura_high_access_count,
        distinct_class_group_count,
        mean_merit_score,
        filtered_count: filtered.len(),
    }
}
