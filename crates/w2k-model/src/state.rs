use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Handle returned by the engine for a submitted process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(pub NodeId);

impl JobHandle {
    /// Allocate a fresh random handle.
    pub fn new() -> Self {
        Self(NodeId::new_v4())
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a process as reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessState {
    /// Submitted, not yet picked up.
    Created,
    /// Queued or paused by the engine.
    #[serde(alias = "queued")]
    Waiting,
    Running,
    /// Terminated normally; a non-zero status is one of the declared exit codes.
    Finished { exit_status: u32 },
    /// Terminated by an unhandled error.
    Excepted,
    Killed,
}

impl ProcessState {
    /// Returns `true` for states counted against the submission ceiling.
    pub fn is_active(&self) -> bool {
        matches!(self, ProcessState::Created | ProcessState::Waiting)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(
            self,
            ProcessState::Finished { .. } | ProcessState::Excepted | ProcessState::Killed
        )
    }

    /// Returns the state name as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Created => "created",
            ProcessState::Waiting => "waiting",
            ProcessState::Running => "running",
            ProcessState::Finished { .. } => "finished",
            ProcessState::Excepted => "excepted",
            ProcessState::Killed => "killed",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Finished { exit_status } => write!(f, "finished [{exit_status}]"),
            other => f.write_str(other.as_str()),
        }
    }
}
