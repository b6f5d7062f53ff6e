//! # latencylab-types: Core types for LatencyLab
//!
//! This crate contains the record types shared across the LatencyLab
//! simulation engine:
//! - Entity IDs ([`InstanceId`], [`EventId`], [`RunId`])
//! - Per-run records ([`TaskInstance`], [`EventOccurrence`], [`RunResult`])
//!
//! All records are immutable once constructed. Causality between task
//! instances is expressed through ids (`parent_task_instance_id`,
//! `capacity_parent_instance_id`), never through owning references, so the
//! instance graph is acyclic by construction and cheap to walk backward.
//!
//! Everything here derives serde traits: these records are the fixed
//! interface consumed by output writers and UI layers living outside the
//! core.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

// ============================================================================
// Entity IDs - All Copy (cheap 8-byte values)
// ============================================================================

/// Unique identifier for a task instance within a run.
///
/// Ids are monotonic starting at 1, assigned in creation order. Because they
/// are dense, id `N` addresses slot `N - 1` of the run's instance arena.
///
/// # Examples
///
/// ```
/// # use latencylab_types::InstanceId;
/// let id = InstanceId::new(3);
/// assert_eq!(id.arena_index(), 2);
/// assert_eq!(u64::from(id), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn new(id: u64) -> Self {
        debug_assert!(id >= 1, "instance ids start at 1");
        Self(id)
    }

    /// Position of this instance in a run's arena (ids are dense from 1).
    pub fn arena_index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for InstanceId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<InstanceId> for u64 {
    fn from(id: InstanceId) -> Self {
        id.0
    }
}

/// Unique identifier for an event occurrence within a run.
///
/// Monotonic starting at 1, assigned in occurrence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    pub fn new(id: u64) -> Self {
        debug_assert!(id >= 1, "event ids start at 1");
        Self(id)
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EventId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<EventId> for u64 {
    fn from(id: EventId) -> Self {
        id.0
    }
}

/// Zero-based index of a simulation run within a batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct RunId(u64);

impl RunId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RunId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<RunId> for u64 {
    fn from(id: RunId) -> Self {
        id.0
    }
}

// ============================================================================
// Per-run records
// ============================================================================

/// A single execution of a task within a run.
///
/// Times are in simulated milliseconds. `queue_wait_ms` is always
/// `start_time_ms - enqueue_time_ms` and `duration_ms` is always
/// `end_time_ms - start_time_ms`.
///
/// Causality back-links:
/// - `parent_task_instance_id`: the instance whose event emission enqueued
///   this one (`None` for tasks triggered by the injected entry event).
/// - `capacity_parent_instance_id`: the previous instance that occupied the
///   same capacity slot (`None` when the slot was never used before).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub instance_id: InstanceId,
    pub run_id: RunId,
    pub task_name: String,
    pub context: String,
    pub enqueue_time_ms: f64,
    pub start_time_ms: f64,
    pub end_time_ms: f64,
    pub queue_wait_ms: f64,
    pub duration_ms: f64,
    pub emitted_events: Vec<String>,
    pub parent_task_instance_id: Option<InstanceId>,
    pub capacity_parent_instance_id: Option<InstanceId>,
}

/// A named event firing at a point in simulated time.
///
/// `source_task_instance_id` is `None` only for the entry event injected at
/// the start of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOccurrence {
    pub event_id: EventId,
    pub name: String,
    pub time_ms: f64,
    pub source_task_instance_id: Option<InstanceId>,
}

/// The outcome of one simulation run.
///
/// `critical_path_tasks` is the blocking chain ending at the last-finishing
/// instance, joined with `">"`; it is empty exactly when the run created no
/// instances. A run that breached its task budget reports `failed = true`
/// with a `failure_reason`, but still carries the makespan and critical path
/// of whatever instances were created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: RunId,
    pub first_ui_event_time_ms: Option<f64>,
    pub last_ui_event_time_ms: Option<f64>,
    pub makespan_ms: f64,
    pub critical_path_ms: f64,
    pub critical_path_tasks: String,
    pub failed: bool,
    pub failure_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_id_round_trips_through_u64() {
        let id = InstanceId::from(7u64);
        assert_eq!(u64::from(id), 7);
        assert_eq!(id.arena_index(), 6);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn ids_order_by_value() {
        assert!(InstanceId::new(1) < InstanceId::new(2));
        assert!(EventId::new(3) > EventId::new(1));
        assert_eq!(RunId::default(), RunId::new(0));
    }

    #[test]
    fn newtype_ids_serialize_transparently() {
        let json = serde_json::to_value(InstanceId::new(42)).unwrap();
        assert_eq!(json, serde_json::json!(42));
    }

    #[test]
    fn run_result_serializes_nullable_fields_as_null() {
        let result = RunResult {
            run_id: RunId::new(0),
            first_ui_event_time_ms: None,
            last_ui_event_time_ms: None,
            makespan_ms: 0.0,
            critical_path_ms: 0.0,
            critical_path_tasks: String::new(),
            failed: false,
            failure_reason: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["first_ui_event_time_ms"], serde_json::Value::Null);
        assert_eq!(json["failure_reason"], serde_json::Value::Null);
    }
}
