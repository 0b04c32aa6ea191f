//! Error types for cmd_shape.
//!
//! This module defines two main error categories:
//! - [`GuardError`]: Parameter violations detected while assembling argv - nothing is spawned
//! - [`ExecError`]: Execution errors from the runner - the argv was valid but the child failed
//!
//! Output parsers never return errors. Malformed tool output degrades to the
//! empty form of its record.

use std::time::Duration;
use thiserror::Error;

/// What a [`GuardError::LimitExceeded`] measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    /// Character count of a single value.
    Length,
    /// Element count of an array parameter.
    Items,
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitKind::Length => write!(f, "characters"),
            LimitKind::Items => write!(f, "items"),
        }
    }
}

/// Parameter violation detected before argv assembly.
///
/// These errors indicate the request was rejected before any process was spawned.
/// Messages carry the parameter name only, never the offending value, so they
/// are safe to log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// Value would be read as a command-line flag by the wrapped tool
    #[error("parameter {param} must not start with '-'")]
    Injection {
        param: String,
        /// Position inside an array parameter, if any.
        index: Option<usize>,
    },

    /// Value or array is larger than its role allows
    #[error("parameter {param} exceeds limit: max {limit} {kind}, got {actual}")]
    LimitExceeded {
        param: String,
        kind: LimitKind,
        limit: usize,
        actual: usize,
        /// Position inside an array parameter, if any.
        index: Option<usize>,
    },
}

impl GuardError {
    /// Name of the parameter that was rejected.
    pub fn param(&self) -> &str {
        match self {
            GuardError::Injection { param, .. } | GuardError::LimitExceeded { param, .. } => param,
        }
    }

    /// Attach the array position to an element-level error.
    pub(crate) fn at_index(self, i: usize) -> Self {
        match self {
            GuardError::Injection { param, .. } => GuardError::Injection {
                param,
                index: Some(i),
            },
            GuardError::LimitExceeded {
                param,
                kind,
                limit,
                actual,
                ..
            } => GuardError::LimitExceeded {
                param,
                kind,
                limit,
                actual,
                index: Some(i),
            },
        }
    }
}

/// Execution error from [`crate::run`].
///
/// A non-zero exit is not an error: it is reported through
/// [`crate::RawInvocation::exit_code`] and classified by the parsers.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Process exceeded timeout and was signalled
    #[error("process timed out after {elapsed:?} (limit: {limit:?})")]
    Timeout { limit: Duration, elapsed: Duration },

    /// Failed to spawn or wait for the process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed { reason: String },
}

/// Combined error type for the guard-and-run flow.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}
