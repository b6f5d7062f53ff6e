//! Differential tests: the current engine against the frozen legacy one.
//!
//! Models here are representable in both schemas (fixed durations, no
//! wiring delays, no task meta), the domain on which the engines must
//! agree exactly.

use latencylab_oracle::{check_equivalence, run_differential, synthetic_delay_rows};
use proptest::prelude::*;
use serde_json::{Value, json};

fn fan_out_model() -> Value {
    json!({
        "entry_event": "req",
        "contexts": {"db": {"concurrency": 1}, "worker": {"concurrency": 2}},
        "events": {"req": {}, "queried": {}, "done": {"tags": ["ui"]}},
        "tasks": {
            "query": {
                "context": "db",
                "duration_ms": {"dist": "fixed", "value": 4},
                "emit": ["queried"]
            },
            "merge": {
                "context": "worker",
                "duration_ms": {"dist": "fixed", "value": 3},
                "emit": ["done"]
            },
            "log": {
                "context": "worker",
                "duration_ms": {"dist": "fixed", "value": 1},
                "emit": []
            }
        },
        "wiring": {
            "req": ["query", "query", "log"],
            "queried": ["merge", "log"]
        }
    })
}

#[test]
fn engines_agree_on_a_single_task_model() {
    let value = json!({
        "entry_event": "e0",
        "contexts": {"ui": {"concurrency": 1}},
        "events": {"e0": {"tags": ["ui"]}},
        "tasks": {
            "t": {"context": "ui", "duration_ms": {"dist": "fixed", "value": 10}, "emit": []}
        },
        "wiring": {"e0": ["t"]}
    });
    check_equivalence(&value, 123, 1, 10_000).unwrap();
}

#[test]
fn engines_agree_on_contended_fan_out() {
    for seed in [0, 123, 999_983] {
        check_equivalence(&fan_out_model(), seed, 5, 10_000).unwrap();
    }
}

#[test]
fn engines_agree_on_simultaneous_zero_duration_completions() {
    // Same-time completions exercise the (kind, context, name, id)
    // tie-break in both engines.
    let value = json!({
        "entry_event": "e0",
        "contexts": {"a": {"concurrency": 2}, "b": {"concurrency": 2}},
        "events": {"e0": {}, "e1": {}},
        "tasks": {
            "x": {"context": "a", "duration_ms": {"dist": "fixed", "value": 0}, "emit": ["e1"]},
            "y": {"context": "b", "duration_ms": {"dist": "fixed", "value": 0}, "emit": ["e1"]},
            "z": {"context": "a", "duration_ms": {"dist": "fixed", "value": 2}, "emit": []}
        },
        "wiring": {"e0": ["x", "y"], "e1": ["z"]}
    });
    check_equivalence(&value, 42, 3, 10_000).unwrap();
}

#[test]
fn engines_agree_on_budget_breach() {
    let value = json!({
        "entry_event": "loop",
        "contexts": {"cpu": {"concurrency": 1}},
        "events": {"loop": {}},
        "tasks": {
            "spin": {"context": "cpu", "duration_ms": {"dist": "fixed", "value": 0}, "emit": ["loop"]}
        },
        "wiring": {"loop": ["spin"]}
    });
    check_equivalence(&value, 7, 2, 5).unwrap();

    let output = run_differential(&value, 7, 1, 5).unwrap();
    assert!(output.legacy.runs[0].failed);
    assert_eq!(
        output.legacy.runs[0].failure_reason,
        output.current.runs[0].failure_reason
    );
}

#[test]
fn current_engine_emits_no_delay_rows_without_delays() {
    let output = run_differential(&fan_out_model(), 11, 2, 10_000).unwrap();
    assert!(synthetic_delay_rows(&output.current.trace).is_empty());
}

/// Builds a chain model: entry → t0 → t1 → … → t{n-1}, all on one context
/// with the given concurrency, with per-task fixed durations.
fn chain_model(durations: &[u32], concurrency: u32) -> Value {
    let mut events = serde_json::Map::new();
    let mut tasks = serde_json::Map::new();
    let mut wiring = serde_json::Map::new();

    events.insert("entry".to_owned(), json!({}));
    for (i, dur) in durations.iter().enumerate() {
        let event_in = if i == 0 {
            "entry".to_owned()
        } else {
            format!("step{}", i - 1)
        };
        let event_out = format!("step{i}");
        events.insert(event_out.clone(), json!({"tags": ["ui"]}));
        tasks.insert(
            format!("t{i}"),
            json!({
                "context": "pool",
                "duration_ms": {"dist": "fixed", "value": dur},
                "emit": [event_out]
            }),
        );
        wiring.insert(event_in, json!([format!("t{i}")]));
    }

    json!({
        "entry_event": "entry",
        "contexts": {"pool": {"concurrency": concurrency}},
        "events": Value::Object(events),
        "tasks": Value::Object(tasks),
        "wiring": Value::Object(wiring)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn engines_agree_on_generated_chains(
        durations in prop::collection::vec(0u32..20, 1..6),
        concurrency in 1u32..4,
        seed: u64,
    ) {
        let value = chain_model(&durations, concurrency);
        check_equivalence(&value, seed, 2, 10_000).unwrap();
    }
}
