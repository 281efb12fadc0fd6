// src/core/error.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single external command did not complete cleanly.
///
/// These are carried as values inside a `CommandResult`; the dispatcher never
/// propagates them as errors to its caller.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionFailure {
    #[error("failed to spawn process: {0}")]
    Spawn(String),

    #[error("failed while waiting for process: {0}")]
    Wait(String),

    #[error("process exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("process timed out after {0:?}")]
    Timeout(Duration),

    #[error("process was cancelled")]
    Cancelled,

    #[error("worker task panicked: {0}")]
    Panicked(String),
}

/// A workflow-level failure reported to the caller.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("invalid domain '{input}': {reason}")]
    InvalidDomain { input: String, reason: &'static str },

    #[error("missing prerequisite '{what}' for {workflow}")]
    MissingPrerequisite {
        workflow: &'static str,
        what: &'static str,
        cause: Option<String>,
    },

    #[error("results directory {path}: {source}")]
    ResultsDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("workflow cancelled")]
    Cancelled,
}
