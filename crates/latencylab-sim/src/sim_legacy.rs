//! Legacy v1 executor.
//!
//! FROZEN. This module is retained as a migration oracle for v1 semantics.
//!
//! Policy:
//! - No new features.
//! - No refactors or style alignment with the v2 engine.
//! - Changes allowed only for critical bug fixes, and only when they also
//!   fix v2 equivalently.
//!
//! The per-run seed derivation (`splitmix64(seed ^ run_id)`), the `SimRng`
//! stream, and the completion ordering below define v1's outputs; the v2
//! engine is tested for equivalence against them on models representable in
//! both schemas.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use tracing::{debug, warn};

use latencylab_model::Model;
use latencylab_types::{EventId, EventOccurrence, InstanceId, RunId, RunResult, TaskInstance};

use crate::error::SimError;
use crate::executor::SimOutput;
use crate::rng::SimRng;
use crate::sampler::sample_duration_ms;

pub(crate) fn simulate_many(
    model: &Model,
    runs: u64,
    seed: u64,
    max_tasks_per_run: u64,
    want_trace: bool,
) -> Result<SimOutput, SimError> {
    let mut all_runs = Vec::with_capacity(runs as usize);
    let mut all_trace = Vec::new();

    for run_id in 0..runs {
        let rng = SimRng::for_run(seed, run_id);
        let (result, trace) =
            simulate_one(model, RunId::new(run_id), rng, max_tasks_per_run, want_trace)?;
        if result.failed {
            warn!(
                run_id,
                reason = result.failure_reason.as_deref().unwrap_or(""),
                "run failed"
            );
        } else {
            debug!(run_id, makespan_ms = result.makespan_ms, "run complete");
        }
        all_runs.push(result);
        if want_trace {
            all_trace.extend(trace);
        }
    }

    Ok(SimOutput {
        runs: all_runs,
        trace: all_trace,
    })
}

fn simulate_one(
    model: &Model,
    run_id: RunId,
    rng: SimRng,
    max_tasks_per_run: u64,
    want_trace: bool,
) -> Result<(RunResult, Vec<TaskInstance>), SimError> {
    let mut state = RunState::new(model, run_id, rng, max_tasks_per_run, want_trace);
    state.run()?;
    Ok(state.into_output())
}

/// A queued task waiting for a capacity slot.
struct Pending {
    task: String,
    enqueue_time_ms: f64,
    parent: Option<InstanceId>,
}

/// Per-context scheduler state: the FIFO queue, the free slot set, and the
/// last instance seen on each slot (capacity causality).
struct ContextState {
    name: String,
    queue: VecDeque<Pending>,
    free_slots: Vec<u32>,
    last_on_slot: Vec<Option<InstanceId>>,
}

/// Completion heap entry. Entries at an equal end time pop in
/// `(context, task, instance_id)` order, which is exactly the mandated
/// processing order for simultaneous completions.
struct Completion {
    end_time_ms: f64,
    context: String,
    task_name: String,
    instance_id: InstanceId,
    slot: u32,
}

impl Completion {
    fn cmp_key(&self, other: &Self) -> Ordering {
        self.end_time_ms
            .total_cmp(&other.end_time_ms)
            .then_with(|| self.context.cmp(&other.context))
            .then_with(|| self.task_name.cmp(&other.task_name))
            .then_with(|| self.instance_id.cmp(&other.instance_id))
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

impl Ord for Completion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key(other)
    }
}

impl PartialOrd for Completion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Completion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key(other) == Ordering::Equal
    }
}

impl Eq for Completion {}

struct RunState<'m> {
    model: &'m Model,
    run_id: RunId,
    rng: SimRng,
    max_tasks_per_run: u64,
    want_trace: bool,
    contexts: Vec<ContextState>,
    ctx_index: BTreeMap<String, usize>,
    instances: Vec<TaskInstance>,
    trace: Vec<TaskInstance>,
    event_log: Vec<EventOccurrence>,
    heap: BinaryHeap<Reverse<Completion>>,
    tasks_created: u64,
    failed: bool,
    failure_reason: Option<String>,
}

impl<'m> RunState<'m> {
    fn new(
        model: &'m Model,
        run_id: RunId,
        rng: SimRng,
        max_tasks_per_run: u64,
        want_trace: bool,
    ) -> Self {
        let mut contexts = Vec::with_capacity(model.contexts.len());
        let mut ctx_index = BTreeMap::new();
        for (name, def) in &model.contexts {
            let slots = def.concurrency.max(0) as u32;
            ctx_index.insert(name.clone(), contexts.len());
            contexts.push(ContextState {
                name: name.clone(),
                queue: VecDeque::new(),
                free_slots: (0..slots).collect(),
                last_on_slot: vec![None; slots as usize],
            });
        }
        Self {
            model,
            run_id,
            rng,
            max_tasks_per_run,
            want_trace,
            contexts,
            ctx_index,
            instances: Vec::new(),
            trace: Vec::new(),
            event_log: Vec::new(),
            heap: BinaryHeap::new(),
            tasks_created: 0,
            failed: false,
            failure_reason: None,
        }
    }

    fn run(&mut self) -> Result<(), SimError> {
        // Inject the entry event at t=0, then start whatever can start.
        let entry = self.model.entry_event.clone();
        self.occur_event(&entry, 0.0, None)?;
        self.try_start_tasks(0.0)?;

        while !self.failed {
            let Some(Reverse(first)) = self.heap.pop() else {
                break;
            };
            let t_next = first.end_time_ms;

            // Pop every completion at this time; the heap yields them in
            // processing order.
            let mut completed = vec![first];
            while self
                .heap
                .peek()
                .is_some_and(|Reverse(c)| c.end_time_ms == t_next)
            {
                if let Some(Reverse(c)) = self.heap.pop() {
                    completed.push(c);
                }
            }

            for done in completed {
                let idx = self.ctx_idx(&done.context)?;
                self.contexts[idx].free_slots.push(done.slot);

                let inst = self.instances[done.instance_id.arena_index()].clone();
                for ev in &inst.emitted_events {
                    self.occur_event(ev, inst.end_time_ms, Some(done.instance_id))?;
                }
            }

            self.try_start_tasks(t_next)?;
        }
        Ok(())
    }

    fn occur_event(
        &mut self,
        name: &str,
        time_ms: f64,
        source: Option<InstanceId>,
    ) -> Result<(), SimError> {
        let event_id = EventId::new(self.event_log.len() as u64 + 1);
        self.event_log.push(EventOccurrence {
            event_id,
            name: name.to_owned(),
            time_ms,
            source_task_instance_id: source,
        });

        // Unwired events are allowed; they simply fan out to nothing.
        let model = self.model;
        if let Some(listeners) = model.wiring.get(name) {
            for task_name in listeners {
                self.enqueue_task(task_name, time_ms, source)?;
            }
        }
        Ok(())
    }

    fn enqueue_task(
        &mut self,
        task_name: &str,
        enqueue_time_ms: f64,
        parent: Option<InstanceId>,
    ) -> Result<(), SimError> {
        if self.tasks_created >= self.max_tasks_per_run {
            self.failed = true;
            self.failure_reason = Some(format!(
                "max_tasks_per_run exceeded ({})",
                self.max_tasks_per_run
            ));
            return Ok(());
        }
        self.tasks_created += 1;

        let model = self.model;
        let task = model
            .tasks
            .get(task_name)
            .ok_or_else(|| SimError::Internal(format!("task '{task_name}' missing from model")))?;
        let idx = self.ctx_idx(&task.context)?;
        self.contexts[idx].queue.push_back(Pending {
            task: task_name.to_owned(),
            enqueue_time_ms,
            parent,
        });
        Ok(())
    }

    fn try_start_tasks(&mut self, now_ms: f64) -> Result<(), SimError> {
        let model = self.model;
        let mut made_progress = true;
        while made_progress && !self.failed {
            made_progress = false;
            for i in 0..self.contexts.len() {
                if self.contexts[i].free_slots.is_empty() {
                    continue;
                }
                let Some(pending) = self.contexts[i].queue.pop_front() else {
                    continue;
                };

                // Allocate the lowest-indexed free slot.
                let ctx = &mut self.contexts[i];
                ctx.free_slots.sort_unstable();
                let slot = ctx.free_slots.remove(0);
                let cap_parent = ctx.last_on_slot[slot as usize];

                let task = model.tasks.get(&pending.task).ok_or_else(|| {
                    SimError::Internal(format!("task '{}' missing from model", pending.task))
                })?;
                let duration = sample_duration_ms(&mut self.rng, &task.duration_ms)?.max(0.0);

                let instance_id = InstanceId::new(self.instances.len() as u64 + 1);
                let inst = TaskInstance {
                    instance_id,
                    run_id: self.run_id,
                    task_name: pending.task.clone(),
                    context: self.contexts[i].name.clone(),
                    enqueue_time_ms: pending.enqueue_time_ms,
                    start_time_ms: now_ms,
                    end_time_ms: now_ms + duration,
                    queue_wait_ms: now_ms - pending.enqueue_time_ms,
                    duration_ms: duration,
                    emitted_events: task.emit.clone(),
                    parent_task_instance_id: pending.parent,
                    capacity_parent_instance_id: cap_parent,
                };

                self.heap.push(Reverse(Completion {
                    end_time_ms: inst.end_time_ms,
                    context: inst.context.clone(),
                    task_name: inst.task_name.clone(),
                    instance_id,
                    slot,
                }));
                self.contexts[i].last_on_slot[slot as usize] = Some(instance_id);
                self.record_instance(inst);
                made_progress = true;
            }
        }
        Ok(())
    }

    fn record_instance(&mut self, inst: TaskInstance) {
        if self.want_trace {
            self.trace.push(inst.clone());
        }
        self.instances.push(inst);
    }

    fn ctx_idx(&self, name: &str) -> Result<usize, SimError> {
        self.ctx_index
            .get(name)
            .copied()
            .ok_or_else(|| SimError::Internal(format!("context '{name}' missing from model")))
    }

    fn into_output(self) -> (RunResult, Vec<TaskInstance>) {
        let makespan = self
            .instances
            .iter()
            .map(|i| i.end_time_ms)
            .fold(0.0, f64::max);

        let mut first_ui: Option<f64> = None;
        let mut last_ui: Option<f64> = None;
        for occ in &self.event_log {
            let is_ui = self
                .model
                .events
                .get(&occ.name)
                .is_some_and(|e| e.has_tag("ui"));
            if is_ui {
                first_ui = Some(first_ui.map_or(occ.time_ms, |t| t.min(occ.time_ms)));
                last_ui = Some(last_ui.map_or(occ.time_ms, |t| t.max(occ.time_ms)));
            }
        }

        let result = RunResult {
            run_id: self.run_id,
            first_ui_event_time_ms: first_ui,
            last_ui_event_time_ms: last_ui,
            makespan_ms: makespan,
            critical_path_ms: makespan,
            critical_path_tasks: critical_path(&self.instances),
            failed: self.failed,
            failure_reason: self.failure_reason,
        };
        (result, self.trace)
    }
}

/// Reconstructs the blocking chain ending at the last-finishing instance.
///
/// At each step the walk prefers the capacity predecessor when it finished
/// strictly after this instance was enqueued (the slot was the bottleneck),
/// otherwise the event predecessor. Ids strictly decrease along the walk,
/// so it terminates.
fn critical_path(instances: &[TaskInstance]) -> String {
    let Some(last) = instances.iter().max_by(|a, b| {
        a.end_time_ms
            .total_cmp(&b.end_time_ms)
            .then_with(|| a.context.cmp(&b.context))
            .then_with(|| a.task_name.cmp(&b.task_name))
            .then_with(|| a.instance_id.cmp(&b.instance_id))
    }) else {
        return String::new();
    };

    let mut chain: Vec<&str> = Vec::new();
    let mut cur = Some(last);
    while let Some(inst) = cur {
        chain.push(inst.task_name.as_str());

        let cap_pred = inst
            .capacity_parent_instance_id
            .map(|id| &instances[id.arena_index()]);
        let cap_time = cap_pred.map_or(f64::NEG_INFINITY, |p| p.end_time_ms);

        let evt_pred = inst
            .parent_task_instance_id
            .map(|id| &instances[id.arena_index()]);
        let evt_time = inst.enqueue_time_ms;

        cur = if cap_time > evt_time {
            cap_pred
        } else if evt_pred.is_some() && evt_time >= cap_time {
            evt_pred
        } else {
            None
        };
    }

    chain.reverse();
    chain.join(">")
}
