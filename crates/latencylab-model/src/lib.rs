//! # latencylab-model: Declarative model for LatencyLab
//!
//! A model describes an event-driven, capacity-constrained system:
//!
//! - **Contexts** are bounded pools of capacity slots with FIFO queueing.
//! - **Tasks** run on a context for a stochastically sampled duration and
//!   emit events when they complete.
//! - **Wiring** maps each event to the tasks it enqueues, optionally after a
//!   stochastic per-edge delay (schema v2 only).
//!
//! Models arrive as a mapping produced by any JSON-equivalent parser and are
//! loaded through [`Model::from_json`]. Loading is permissive about shapes
//! the validator owns (distribution parameters, references); it rejects only
//! malformed structure. [`validate_model`](crate::validate::validate_model)
//! then enforces the semantic invariants before the model reaches an
//! executor.
//!
//! Two schema versions coexist. Version 1 has bare task-name wiring only;
//! version 2 adds per-edge `delay_ms` and optional per-task `meta`. The
//! version key is accepted under the aliases `schema_version`, `version`,
//! or `model_version` and normalized once here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

mod error;
pub mod validate;

pub use error::ModelError;
pub use validate::validate_model;

// ============================================================================
// Definitions
// ============================================================================

/// A bounded pool of capacity slots with a queueing discipline.
///
/// `concurrency` is kept as parsed; the validator enforces `>= 1` so that
/// out-of-range values surface as validation errors, not parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDef {
    pub concurrency: i64,
    pub policy: String,
}

/// A named signal. The tag `"ui"` designates user-visible events.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventDef {
    pub tags: Vec<String>,
}

impl EventDef {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A stochastic duration (or delay), in floating-point milliseconds.
///
/// The distribution namespace is open at parse time: `dist` names the
/// variant and `params` carries its numeric parameters. The validator pins
/// the namespace to `fixed | normal | lognormal` and checks parameter
/// presence and bounds, so anything else reaching a sampler is an internal
/// invariant violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationDist {
    pub dist: String,
    pub params: BTreeMap<String, f64>,
}

impl DurationDist {
    /// A degenerate distribution that always yields `value`.
    pub fn fixed(value: f64) -> Self {
        Self {
            dist: "fixed".to_owned(),
            params: BTreeMap::from([("value".to_owned(), value)]),
        }
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }
}

/// Optional descriptive metadata attached to a task (schema v2).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskMeta {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

/// One wiring edge: an event enqueues `task`, optionally after `delay_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WiringEdge {
    pub task: String,
    pub delay_ms: Option<DurationDist>,
}

/// A task definition: where it runs, how long it takes, what it emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
    pub context: String,
    pub duration_ms: DurationDist,
    pub emit: Vec<String>,
    pub meta: Option<TaskMeta>,
}

/// A parsed, version-normalized model.
///
/// `wiring` is the v1-compatible flat view (event → task names);
/// `wiring_edges` is the full view with per-edge delays. Both preserve
/// listener insertion order, which the engine relies on for deterministic
/// event fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub version: i64,
    pub entry_event: String,
    pub contexts: BTreeMap<String, ContextDef>,
    pub events: BTreeMap<String, EventDef>,
    pub tasks: BTreeMap<String, TaskDef>,
    pub wiring: BTreeMap<String, Vec<String>>,
    pub wiring_edges: BTreeMap<String, Vec<WiringEdge>>,
}

// ============================================================================
// JSON loading
// ============================================================================

impl Model {
    /// Loads a model from a JSON-equivalent mapping.
    ///
    /// Accepts the schema version under any of the keys `schema_version`,
    /// `version`, or `model_version`. Unrecognized top-level keys are
    /// ignored. The returned model is not yet validated; callers should run
    /// [`validate_model`] before simulating.
    pub fn from_json(value: &Value) -> Result<Self, ModelError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ModelError::parse("model must be a JSON object"))?;

        let version = ["schema_version", "version", "model_version"]
            .iter()
            .find_map(|key| obj.get(*key))
            .ok_or_else(|| {
                ModelError::parse("model is missing a schema_version/version/model_version key")
            })?
            .as_i64()
            .ok_or_else(|| ModelError::parse("schema version must be an integer"))?;

        let entry_event = obj
            .get("entry_event")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::parse("entry_event must be a string"))?
            .to_owned();

        let mut contexts = BTreeMap::new();
        if let Some(map) = get_object(obj, "contexts")? {
            for (name, ctx) in map {
                contexts.insert(name.clone(), parse_context(name, ctx)?);
            }
        }

        let mut events = BTreeMap::new();
        if let Some(map) = get_object(obj, "events")? {
            for (name, ev) in map {
                events.insert(name.clone(), parse_event(name, ev)?);
            }
        }

        let mut tasks = BTreeMap::new();
        if let Some(map) = get_object(obj, "tasks")? {
            for (name, task) in map {
                tasks.insert(name.clone(), parse_task(name, task)?);
            }
        }

        let mut wiring = BTreeMap::new();
        let mut wiring_edges = BTreeMap::new();
        if let Some(map) = get_object(obj, "wiring")? {
            for (event_name, listeners) in map {
                let listeners = listeners.as_array().ok_or_else(|| {
                    ModelError::parse(format!("wiring for event '{event_name}' must be a list"))
                })?;
                let mut edges = Vec::with_capacity(listeners.len());
                let mut flat = Vec::with_capacity(listeners.len());
                for listener in listeners {
                    let edge = parse_listener(event_name, listener)?;
                    flat.push(edge.task.clone());
                    edges.push(edge);
                }
                wiring.insert(event_name.clone(), flat);
                wiring_edges.insert(event_name.clone(), edges);
            }
        }

        Ok(Model {
            version,
            entry_event,
            contexts,
            events,
            tasks,
            wiring,
            wiring_edges,
        })
    }

    /// Convenience wrapper over [`Model::from_json`] for raw JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ModelError::parse(format!("invalid JSON: {e}")))?;
        Self::from_json(&value)
    }
}

fn get_object<'v>(
    obj: &'v serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<&'v serde_json::Map<String, Value>>, ModelError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_object()
            .map(Some)
            .ok_or_else(|| ModelError::parse(format!("{key} must be an object"))),
    }
}

fn parse_context(name: &str, value: &Value) -> Result<ContextDef, ModelError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ModelError::parse(format!("context '{name}' must be an object")))?;
    let concurrency = obj
        .get("concurrency")
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            ModelError::parse(format!("context '{name}' requires an integer 'concurrency'"))
        })?;
    let policy = match obj.get("policy") {
        None => "fifo".to_owned(),
        Some(p) => p
            .as_str()
            .ok_or_else(|| ModelError::parse(format!("context '{name}' policy must be a string")))?
            .to_owned(),
    };
    Ok(ContextDef {
        concurrency,
        policy,
    })
}

fn parse_event(name: &str, value: &Value) -> Result<EventDef, ModelError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ModelError::parse(format!("event '{name}' must be an object")))?;
    let tags = match obj.get("tags") {
        None => Vec::new(),
        Some(tags) => parse_string_list(tags)
            .ok_or_else(|| ModelError::parse(format!("event '{name}' tags must be strings")))?,
    };
    Ok(EventDef { tags })
}

fn parse_task(name: &str, value: &Value) -> Result<TaskDef, ModelError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ModelError::parse(format!("task '{name}' must be an object")))?;

    let context = obj
        .get("context")
        .and_then(Value::as_str)
        .ok_or_else(|| ModelError::parse(format!("task '{name}' requires a string 'context'")))?
        .to_owned();

    let duration = obj
        .get("duration_ms")
        .ok_or_else(|| ModelError::parse(format!("task '{name}' requires 'duration_ms'")))?;
    let duration_ms = parse_dist_object(duration)
        .ok_or_else(|| ModelError::parse(format!("task '{name}' duration_ms must be a dist object")))?;

    let emit = match obj.get("emit") {
        None => Vec::new(),
        Some(emit) => parse_string_list(emit).ok_or_else(|| {
            ModelError::parse(format!("task '{name}' emit must be a list of event names"))
        })?,
    };

    let meta = match obj.get("meta") {
        None | Some(Value::Null) => None,
        Some(meta) => Some(parse_meta(name, meta)?),
    };

    Ok(TaskDef {
        context,
        duration_ms,
        emit,
        meta,
    })
}

fn parse_meta(task_name: &str, value: &Value) -> Result<TaskMeta, ModelError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ModelError::parse(format!("task '{task_name}' meta must be an object")))?;
    let category = match obj.get("category") {
        None | Some(Value::Null) => None,
        Some(c) => Some(
            c.as_str()
                .ok_or_else(|| {
                    ModelError::parse(format!("task '{task_name}' meta category must be a string"))
                })?
                .to_owned(),
        ),
    };
    let tags = match obj.get("tags") {
        None => Vec::new(),
        Some(tags) => parse_string_list(tags).ok_or_else(|| {
            ModelError::parse(format!("task '{task_name}' meta tags must be strings"))
        })?,
    };
    let mut labels = BTreeMap::new();
    if let Some(raw) = obj.get("labels") {
        let raw = raw.as_object().ok_or_else(|| {
            ModelError::parse(format!("task '{task_name}' meta labels must be an object"))
        })?;
        for (k, v) in raw {
            let v = v.as_str().ok_or_else(|| {
                ModelError::parse(format!("task '{task_name}' meta labels must map to strings"))
            })?;
            labels.insert(k.clone(), v.to_owned());
        }
    }
    Ok(TaskMeta {
        category,
        tags,
        labels,
    })
}

fn parse_listener(event_name: &str, listener: &Value) -> Result<WiringEdge, ModelError> {
    match listener {
        Value::String(task) => Ok(WiringEdge {
            task: task.clone(),
            delay_ms: None,
        }),
        Value::Object(obj) => {
            let task = obj
                .get("task")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ModelError::parse(format!(
                        "wiring listener under '{event_name}' requires a string 'task'"
                    ))
                })?
                .to_owned();
            let delay_ms = match obj.get("delay_ms") {
                None | Some(Value::Null) => None,
                Some(delay) => Some(parse_dist(delay).ok_or_else(|| {
                    ModelError::parse("delay_ms must be a number or a dist object")
                })?),
            };
            Ok(WiringEdge { task, delay_ms })
        }
        _ => Err(ModelError::parse(
            "wiring listeners must be strings or objects",
        )),
    }
}

/// Parses a distribution, accepting the bare-number shorthand for
/// `fixed(N)`.
fn parse_dist(value: &Value) -> Option<DurationDist> {
    if let Some(n) = value.as_f64() {
        return Some(DurationDist::fixed(n));
    }
    parse_dist_object(value)
}

/// Parses an explicit `{dist: ..., <params>}` object. All keys other than
/// `dist` become numeric parameters.
fn parse_dist_object(value: &Value) -> Option<DurationDist> {
    let obj = value.as_object()?;
    let dist = obj.get("dist")?.as_str()?.to_owned();
    let mut params = BTreeMap::new();
    for (key, v) in obj {
        if key == "dist" {
            continue;
        }
        params.insert(key.clone(), v.as_f64()?);
    }
    Some(DurationDist { dist, params })
}

fn parse_string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}
