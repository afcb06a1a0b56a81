//! Workflow engine interface.
//!
//! Scheduling, execution, remote copies and provenance belong to the engine.
//! Everything in this workspace talks to it only through [`Engine`].
mod error;
pub use error::EngineError;

use std::path::Path;

use async_trait::async_trait;
use w2k_model::{Code, JobHandle, ProcessState, RemoteFolder, Structure, Submission};

/// Capabilities of a workflow engine.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Engine name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Hand a calculation or workflow over to the engine.
    async fn submit(&self, submission: &Submission) -> Result<JobHandle, EngineError>;

    /// Current state of a submitted process.
    async fn status(&self, handle: &JobHandle) -> Result<ProcessState, EngineError>;

    /// Copy a remote folder to `target` on the same computer.
    async fn copy(&self, source: &RemoteFolder, target: &Path) -> Result<(), EngineError>;

    /// All processes ever submitted with the given entry point.
    async fn query(&self, entry_point: &str) -> Result<Vec<JobHandle>, EngineError>;

    /// Resolve a code by its `<name>@<computer>` label.
    async fn load_code(&self, label: &str) -> Result<Code, EngineError>;

    /// Structures stored in a group.
    async fn load_group(&self, label: &str) -> Result<Vec<Structure>, EngineError>;
}
