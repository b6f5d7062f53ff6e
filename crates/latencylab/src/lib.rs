//! # LatencyLab
//!
//! Deterministic, discrete-event latency simulation for event-driven,
//! capacity-constrained systems.
//!
//! A declarative model — contexts with fixed concurrency, tasks with
//! stochastic durations, events, and wiring with optional per-edge delays —
//! is executed N times under a seed. Each run yields timings, failure
//! state, and a reconstructed critical path; a batch aggregates into
//! percentile summaries and critical-path frequencies.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         LatencyLab                            │
//! │  ┌─────────┐   ┌───────────┐   ┌──────────┐   ┌───────────┐  │
//! │  │  Model  │ → │ Validator │ → │ Executor │ → │  Metrics  │  │
//! │  │ (parse) │   │(invariants)│  │ (v1/v2)  │   │(summaries)│  │
//! │  └─────────┘   └───────────┘   └──────────┘   └───────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use latencylab::{Model, validate_model, simulate_many, aggregate_runs};
//!
//! let model = Model::from_json_str(r#"{
//!     "schema_version": 2,
//!     "entry_event": "boot",
//!     "contexts": {"cpu": {"concurrency": 1}},
//!     "events": {"boot": {"tags": ["ui"]}},
//!     "tasks": {"init": {"context": "cpu",
//!                        "duration_ms": {"dist": "fixed", "value": 10},
//!                        "emit": []}},
//!     "wiring": {"boot": ["init"]}
//! }"#)?;
//! validate_model(&model)?;
//!
//! let output = simulate_many(&model, 100, 42, 10_000, false)?;
//! let summary = aggregate_runs(&model, &output.runs);
//! assert_eq!(summary.runs_ok, 100);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Determinism
//!
//! Same `(model, seed)` → same results, bit for bit, per executor version.
//! Runs are independent: run `i` depends only on `(model, seed, i)`.

// Re-export core record types
pub use latencylab_types::{EventId, EventOccurrence, InstanceId, RunId, RunResult, TaskInstance};

// Re-export the model layer
pub use latencylab_model::{
    ContextDef, DurationDist, EventDef, Model, ModelError, TaskDef, TaskMeta, WiringEdge,
    validate_model,
};

// Re-export the engine
pub use latencylab_sim::{
    DELAY_CONTEXT, Executor, GaussianRng, SimError, SimOutput, SimRng, sample_duration_ms,
    simulate_many, splitmix64,
};

// Re-export aggregation
pub use latencylab_metrics::{
    CriticalPathSummary, LatencySummary, PathCount, Percentiles, Summary, TaskMetadataEntry,
    add_task_metadata, aggregate_runs, percentile,
};
