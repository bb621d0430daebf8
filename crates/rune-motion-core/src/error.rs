//! Error types for the motion runtime.
//!
//! None of these are fatal to the host: the runtime catches them at the
//! point of use, logs, and degrades to skipping the animation.

use thiserror::Error;

use crate::types::{ElementId, Location};

/// Result type for motion operations.
pub type Result<T> = std::result::Result<T, MotionError>;

/// A visual property value or timing field that could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("unparsable color `{0}`")]
    InvalidColor(String),

    #[error("unparsable length `{0}`")]
    InvalidLength(String),

    #[error("property `{0}` has an empty value")]
    Empty(String),

    #[error("number for `{property}` is not finite: {value}")]
    NotFinite { property: String, value: f64 },

    #[error("unknown easing `{0}`")]
    UnknownEasing(String),

    #[error("cubic bezier x values must be in [0, 1], got {0:?}")]
    InvalidBezier([f64; 4]),
}

/// Failure reported by a visual mutation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("element {0} is not attached to the engine")]
    Detached(ElementId),

    #[error("engine rejected property `{property}`: {reason}")]
    Rejected { property: String, reason: String },

    #[error("engine failure: {0}")]
    Other(String),
}

/// The host router failed to execute a route change.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("route change to {target} failed: {reason}")]
pub struct CommitError {
    pub target: Location,
    pub reason: String,
}

impl CommitError {
    pub fn new(target: Location, reason: impl Into<String>) -> Self {
        Self {
            target,
            reason: reason.into(),
        }
    }
}

/// Top-level error for the motion runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    #[error("invalid value: {0}")]
    Value(#[from] ValueError),

    #[error("visual engine error: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error("invalid element description: {0}")]
    Description(String),
}

impl From<serde_json::Error> for MotionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Description(e.to_string())
    }
}
