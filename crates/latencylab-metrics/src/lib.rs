//! # latencylab-metrics: Aggregate summaries over simulation runs
//!
//! Turns a batch of [`RunResult`]s into a [`Summary`]: ok/failed counts,
//! latency percentiles for first-ui / last-ui / makespan, and the most
//! frequent critical paths. Percentiles use linear interpolation between
//! closest ranks. Failed runs are excluded from every latency and
//! critical-path statistic.
//!
//! The summary serializes through serde to the JSON shape consumed by the
//! output writers and UI layers outside the core.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use latencylab_model::Model;
use latencylab_types::RunResult;

/// Maximum number of entries reported under `critical_path.top_paths`.
const TOP_PATHS: usize = 10;

// ============================================================================
// Percentiles
// ============================================================================

/// Percentile by linear interpolation between closest ranks.
///
/// `p <= 0` returns the minimum, `p >= 100` the maximum, and an empty input
/// NaN. Monotone non-decreasing in `p`.
pub fn percentile(values: &[f64], p: i32) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[f64], p: i32) -> f64 {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return f64::NAN;
    };
    if p <= 0 {
        return *first;
    }
    if p >= 100 {
        return *last;
    }

    let pos = (f64::from(p) / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// The standard percentile set reported for each latency series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Percentiles {
    /// Computes the set over `values`; NaN across the board when empty.
    pub fn over(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            p50: percentile_sorted(&sorted, 50),
            p90: percentile_sorted(&sorted, 90),
            p95: percentile_sorted(&sorted, 95),
            p99: percentile_sorted(&sorted, 99),
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub first_ui: Percentiles,
    pub last_ui: Percentiles,
    pub makespan: Percentiles,
}

/// One critical path and how many non-failed runs produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCount {
    pub tasks: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPathSummary {
    pub top_paths: Vec<PathCount>,
}

/// Task metadata attached to v2 summaries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskMetadataEntry {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

/// Aggregate view over a batch of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub model_version: i64,
    pub runs_requested: u64,
    pub runs_ok: u64,
    pub runs_failed: u64,
    pub latency_ms: LatencySummary,
    pub critical_path: CriticalPathSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_metadata: Option<BTreeMap<String, TaskMetadataEntry>>,
}

/// Aggregates a batch of runs into a [`Summary`].
///
/// Latency series only include runs that produced the corresponding value
/// (e.g. runs with no ui events contribute nothing to `first_ui`). Top
/// paths are ordered by descending count, then lexicographic path, capped
/// at ten entries.
pub fn aggregate_runs(model: &Model, runs: &[RunResult]) -> Summary {
    let ok: Vec<&RunResult> = runs.iter().filter(|r| !r.failed).collect();

    let first_ui: Vec<f64> = ok.iter().filter_map(|r| r.first_ui_event_time_ms).collect();
    let last_ui: Vec<f64> = ok.iter().filter_map(|r| r.last_ui_event_time_ms).collect();
    let makespans: Vec<f64> = ok.iter().map(|r| r.makespan_ms).collect();

    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for run in &ok {
        if !run.critical_path_tasks.is_empty() {
            *counts.entry(run.critical_path_tasks.as_str()).or_default() += 1;
        }
    }
    let mut top_paths: Vec<PathCount> = counts
        .into_iter()
        .map(|(tasks, count)| PathCount {
            tasks: tasks.to_owned(),
            count,
        })
        .collect();
    top_paths.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tasks.cmp(&b.tasks)));
    top_paths.truncate(TOP_PATHS);

    Summary {
        model_version: model.version,
        runs_requested: runs.len() as u64,
        runs_ok: ok.len() as u64,
        runs_failed: (runs.len() - ok.len()) as u64,
        latency_ms: LatencySummary {
            first_ui: Percentiles::over(&first_ui),
            last_ui: Percentiles::over(&last_ui),
            makespan: Percentiles::over(&makespans),
        },
        critical_path: CriticalPathSummary { top_paths },
        task_metadata: None,
    }
}

/// Attaches per-task metadata to a v2 summary.
///
/// No-op for v1 models and for models where no task carries `meta`.
pub fn add_task_metadata(mut summary: Summary, model: &Model) -> Summary {
    if model.version != 2 {
        return summary;
    }

    let mut meta = BTreeMap::new();
    for (name, task) in &model.tasks {
        if let Some(m) = &task.meta {
            meta.insert(
                name.clone(),
                TaskMetadataEntry {
                    category: m.category.clone(),
                    tags: m.tags.clone(),
                    labels: m.labels.clone(),
                },
            );
        }
    }

    if !meta.is_empty() {
        summary.task_metadata = Some(meta);
    }
    summary
}
