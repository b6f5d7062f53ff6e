//! Simulation error types

use thiserror::Error;

/// Errors surfaced by the simulation engine.
///
/// A run that breaches its task budget is not an error: it is reported
/// through `RunResult::failed` / `failure_reason` and never aborts the
/// batch. `Internal` indicates an invariant the validator should have made
/// unrepresentable; it propagates to the caller.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unsupported model version: {0} (expected 1 or 2)")]
    UnsupportedVersion(i64),

    #[error("internal error: {0}")]
    Internal(String),
}
