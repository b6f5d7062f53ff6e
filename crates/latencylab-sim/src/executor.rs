//! Executor selection and the public simulation entrypoint.

use latencylab_model::Model;
use latencylab_types::{RunResult, TaskInstance};
use tracing::debug;

use crate::error::SimError;
use crate::{sim_legacy, sim_v2};

/// Output of a simulation batch: one [`RunResult`] per run, ordered by run
/// id, plus the accumulated trace rows (empty unless tracing was
/// requested).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimOutput {
    pub runs: Vec<RunResult>,
    pub trace: Vec<TaskInstance>,
}

/// Execution strategy, selected by schema version.
///
/// `LegacyV1` is the frozen behavioral reference; `CurrentV2` adds per-edge
/// wiring delays. Both share the deterministic scheduling contract, so on
/// models representable in either schema they produce identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Executor {
    LegacyV1,
    CurrentV2,
}

impl Executor {
    /// Picks the executor for a model's schema version.
    pub fn for_model(model: &Model) -> Result<Self, SimError> {
        match model.version {
            1 => Ok(Self::LegacyV1),
            2 => Ok(Self::CurrentV2),
            v => Err(SimError::UnsupportedVersion(v)),
        }
    }

    /// Runs `runs` independent simulations of `model` under this executor.
    pub fn execute(
        self,
        model: &Model,
        runs: u64,
        seed: u64,
        max_tasks_per_run: u64,
        want_trace: bool,
    ) -> Result<SimOutput, SimError> {
        match self {
            Self::LegacyV1 => {
                sim_legacy::simulate_many(model, runs, seed, max_tasks_per_run, want_trace)
            }
            Self::CurrentV2 => {
                sim_v2::simulate_many(model, runs, seed, max_tasks_per_run, want_trace)
            }
        }
    }
}

/// Runs `runs` independent simulations of `model`, dispatching on its
/// schema version.
///
/// Runs execute sequentially; run `i` depends only on `(model, seed, i)`,
/// so growing the run count keeps earlier results unchanged, and callers
/// that want cross-run parallelism can partition the run id space
/// themselves with the same seed derivation.
pub fn simulate_many(
    model: &Model,
    runs: u64,
    seed: u64,
    max_tasks_per_run: u64,
    want_trace: bool,
) -> Result<SimOutput, SimError> {
    let executor = Executor::for_model(model)?;
    debug!(?executor, runs, seed, "starting simulation batch");
    executor.execute(model, runs, seed, max_tasks_per_run, want_trace)
}
