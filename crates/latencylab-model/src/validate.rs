//! Structural and semantic model validation.
//!
//! Validation runs after parsing and before any simulation. Every check here
//! guards an invariant an executor relies on, so a model that passes
//! [`validate_model`] can be simulated without further reference checks.

use crate::{DurationDist, Model, ModelError};

/// Validates a parsed model against the engine's invariants.
///
/// Checks, in order: schema version, entry event, context definitions, task
/// definitions (context reference, duration distribution, emitted events),
/// and wiring (event keys, task references, delay distributions, and the
/// v1 no-delay rule).
pub fn validate_model(model: &Model) -> Result<(), ModelError> {
    if !matches!(model.version, 1 | 2) {
        return Err(ModelError::validation(format!(
            "unsupported model version: {} (expected 1 or 2)",
            model.version
        )));
    }

    if !model.events.contains_key(&model.entry_event) {
        return Err(ModelError::validation(format!(
            "entry_event '{}' must exist in events",
            model.entry_event
        )));
    }

    for (ctx_name, ctx) in &model.contexts {
        if ctx.concurrency < 1 {
            return Err(ModelError::validation(format!(
                "context '{ctx_name}' concurrency must be >= 1 (got {})",
                ctx.concurrency
            )));
        }
        if ctx.policy != "fifo" {
            return Err(ModelError::validation(format!(
                "context '{ctx_name}' policy must be 'fifo' (got '{}')",
                ctx.policy
            )));
        }
    }

    for (task_name, task) in &model.tasks {
        if !model.contexts.contains_key(&task.context) {
            return Err(ModelError::validation(format!(
                "task '{task_name}' references unknown context '{}'",
                task.context
            )));
        }

        validate_dist(&format!("task '{task_name}'"), &task.duration_ms)?;

        for ev in &task.emit {
            if !model.events.contains_key(ev) {
                return Err(ModelError::validation(format!(
                    "task '{task_name}' emits unknown event '{ev}' (must exist in events)"
                )));
            }
        }
    }

    for (ev, edges) in &model.wiring_edges {
        if !model.events.contains_key(ev) {
            return Err(ModelError::validation(format!(
                "wiring references unknown event '{ev}'"
            )));
        }
        for edge in edges {
            if !model.tasks.contains_key(&edge.task) {
                return Err(ModelError::validation(format!(
                    "wiring for event '{ev}' references unknown task '{}'",
                    edge.task
                )));
            }
            if let Some(delay) = &edge.delay_ms {
                if model.version == 1 {
                    return Err(ModelError::validation(format!(
                        "wiring '{ev}' -> '{}' uses delay_ms, which requires schema version 2",
                        edge.task
                    )));
                }
                validate_dist(&format!("wiring '{ev}' -> '{}' delay_ms", edge.task), delay)?;
            }
        }
    }

    Ok(())
}

/// Checks a distribution's kind, required parameters, and bounds.
///
/// `owner` names the holder in error messages, e.g. `task 'render'` or
/// `wiring 'e0' -> 't' delay_ms`.
fn validate_dist(owner: &str, dist: &DurationDist) -> Result<(), ModelError> {
    let require = |key: &str| {
        dist.param(key).ok_or_else(|| {
            ModelError::validation(format!("{owner} {} dist requires '{key}'", dist.dist))
        })
    };
    match dist.dist.as_str() {
        "fixed" => {
            if require("value")? < 0.0 {
                return Err(ModelError::validation(format!(
                    "{owner} fixed value must be >= 0"
                )));
            }
        }
        "normal" => {
            require("mean")?;
            if require("std")? < 0.0 {
                return Err(ModelError::validation(format!(
                    "{owner} normal std must be >= 0"
                )));
            }
            if let Some(min) = dist.param("min") {
                if min < 0.0 {
                    return Err(ModelError::validation(format!(
                        "{owner} normal min must be >= 0"
                    )));
                }
            }
        }
        "lognormal" => {
            require("mu")?;
            if require("sigma")? < 0.0 {
                return Err(ModelError::validation(format!(
                    "{owner} lognormal sigma must be >= 0"
                )));
            }
        }
        other => {
            return Err(ModelError::validation(format!(
                "{owner} has unsupported dist '{other}'"
            )));
        }
    }
    Ok(())
}
