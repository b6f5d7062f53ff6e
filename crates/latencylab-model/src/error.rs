//! Model error types

use thiserror::Error;

/// Errors surfaced while loading or validating a model.
///
/// The two kinds are deliberately distinct: `Parse` means the input mapping
/// is malformed (wrong JSON shape), `Validation` means the mapping parsed
/// but violates a structural or semantic invariant. Both are raised before
/// any simulation begins.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse model: {0}")]
    Parse(String),

    #[error("invalid model: {0}")]
    Validation(String),
}

impl ModelError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
