//! # latencylab-oracle: Differential testing of the two executors
//!
//! The legacy v1 executor is a frozen behavioral reference. For any model
//! representable in both schemas (no task `meta`, no wiring delays), the
//! current v2 executor must produce identical results: makespan, ui times,
//! critical path, and failure state. This crate runs the same model
//! dictionary through both executors and compares field by field.
//!
//! ## Differential strategy
//!
//! 1. **Stamp** one model mapping with schema version 1 and version 2.
//! 2. **Execute** both under the same seed and limits.
//! 3. **Compare** the equivalence fields run by run.
//! 4. **Report** any [`Divergence`] as a bug in one of the engines.

use serde_json::Value;
use thiserror::Error;

use latencylab_model::{Model, ModelError, validate_model};
use latencylab_sim::{DELAY_CONTEXT, Executor, SimError, SimOutput};
use latencylab_types::{RunId, RunResult, TaskInstance};

/// Errors from the differential harness.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("executors diverged on {} field(s)", .0.len())]
    Diverged(Vec<Divergence>),
}

/// One field on which the executors disagreed for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub run_id: RunId,
    pub field: &'static str,
    pub legacy: String,
    pub current: String,
}

/// Both executors' outputs for the same stamped model.
#[derive(Debug, Clone)]
pub struct DifferentialOutput {
    pub legacy: SimOutput,
    pub current: SimOutput,
}

/// Runs `model_json` through both executors under the same seed.
///
/// The mapping is stamped with schema version 1 for the legacy engine and
/// version 2 for the current one; both stamped models are validated before
/// execution, so a model only representable in one schema (e.g. with
/// wiring delays) fails here rather than skewing the comparison. Traces
/// are always collected so callers can check for synthetic delay rows.
pub fn run_differential(
    model_json: &Value,
    seed: u64,
    runs: u64,
    max_tasks_per_run: u64,
) -> Result<DifferentialOutput, OracleError> {
    let legacy_model = stamped(model_json, 1)?;
    let current_model = stamped(model_json, 2)?;

    let legacy = Executor::LegacyV1.execute(&legacy_model, runs, seed, max_tasks_per_run, true)?;
    let current = Executor::CurrentV2.execute(&current_model, runs, seed, max_tasks_per_run, true)?;

    Ok(DifferentialOutput { legacy, current })
}

/// Runs the differential and fails on any divergence or on synthetic delay
/// rows leaking out of the current engine.
pub fn check_equivalence(
    model_json: &Value,
    seed: u64,
    runs: u64,
    max_tasks_per_run: u64,
) -> Result<(), OracleError> {
    let output = run_differential(model_json, seed, runs, max_tasks_per_run)?;

    let mut found = divergences(&output.legacy.runs, &output.current.runs);
    for row in synthetic_delay_rows(&output.current.trace) {
        found.push(Divergence {
            run_id: row.run_id,
            field: "trace",
            legacy: "no synthetic delay rows".to_owned(),
            current: row.task_name.clone(),
        });
    }

    if found.is_empty() {
        Ok(())
    } else {
        Err(OracleError::Diverged(found))
    }
}

/// Field-by-field comparison of the equivalence surface.
pub fn divergences(legacy: &[RunResult], current: &[RunResult]) -> Vec<Divergence> {
    let mut found = Vec::new();

    if legacy.len() != current.len() {
        found.push(Divergence {
            run_id: RunId::new(0),
            field: "runs",
            legacy: legacy.len().to_string(),
            current: current.len().to_string(),
        });
        return found;
    }

    for (a, b) in legacy.iter().zip(current) {
        let mut diff = |field: &'static str, lhs: String, rhs: String| {
            if lhs != rhs {
                found.push(Divergence {
                    run_id: a.run_id,
                    field,
                    legacy: lhs,
                    current: rhs,
                });
            }
        };
        diff(
            "makespan_ms",
            format!("{:?}", a.makespan_ms),
            format!("{:?}", b.makespan_ms),
        );
        diff(
            "first_ui_event_time_ms",
            format!("{:?}", a.first_ui_event_time_ms),
            format!("{:?}", b.first_ui_event_time_ms),
        );
        diff(
            "last_ui_event_time_ms",
            format!("{:?}", a.last_ui_event_time_ms),
            format!("{:?}", b.last_ui_event_time_ms),
        );
        diff(
            "critical_path_tasks",
            a.critical_path_tasks.clone(),
            b.critical_path_tasks.clone(),
        );
        diff("failed", a.failed.to_string(), b.failed.to_string());
        diff(
            "failure_reason",
            format!("{:?}", a.failure_reason),
            format!("{:?}", b.failure_reason),
        );
    }

    found
}

/// Trace rows living on the reserved delay context.
///
/// Must be empty for any model without wiring delays: the current engine
/// only materializes delay instances for delayed edges.
pub fn synthetic_delay_rows(trace: &[TaskInstance]) -> Vec<&TaskInstance> {
    trace.iter().filter(|t| t.context == DELAY_CONTEXT).collect()
}

/// Re-stamps a model mapping with an explicit schema version and parses +
/// validates it. All version-key aliases are cleared first so the stamp is
/// authoritative.
fn stamped(model_json: &Value, version: i64) -> Result<Model, ModelError> {
    let mut value = model_json.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("version");
        obj.remove("model_version");
        obj.insert("schema_version".to_owned(), Value::from(version));
    }
    let model = Model::from_json(&value)?;
    validate_model(&model)?;
    Ok(model)
}
