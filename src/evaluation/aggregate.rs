use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metric name -> value for one scoring pass.
pub type MetricScores = BTreeMap<String, f64>;

/// Scores of one run, tagged with its zero-based index once aggregated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunScores {
    #[serde(rename = "ind", default, skip_serializing_if = "Option::is_none")]
    pub run_index: Option<usize>,
    #[serde(flatten)]
    pub scores: MetricScores,
}

impl RunScores {
    pub fn new(scores: MetricScores) -> Self {
        Self {
            run_index: None,
            scores,
        }
    }
}

impl From<MetricScores> for RunScores {
    fn from(scores: MetricScores) -> Self {
        Self::new(scores)
    }
}

/// Mean and population variance of one metric across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub var: f64,
}

impl MetricSummary {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self { mean, var })
    }
}

/// Per-metric mean and population variance over every run that reported it.
///
/// Each run is tagged in place with its zero-based index. A run that lacks a
/// metric simply does not contribute to that metric.
pub fn aggregate_runs(runs: &mut [RunScores]) -> BTreeMap<String, MetricSummary> {
    let mut values: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for run in runs.iter() {
        for (name, score) in &run.scores {
            values.entry(name.as_str()).or_default().push(*score);
        }
    }

    let summary = values
        .into_iter()
        .filter_map(|(name, v)| MetricSummary::from_values(&v).map(|s| (name.to_string(), s)))
        .collect();

    for (index, run) in runs.iter_mut().enumerate() {
        run.run_index = Some(index);
    }

    summary
}
