//! On-disk layout of the local engine.
//!
//! ```text
//! <root>/computer.json
//! <root>/codes/<label>.json
//! <root>/files/<uuid>/<filename>
//! <root>/groups/<label>/*.json
//! <root>/sandboxes/<uuid>/
//! <root>/jobs/<uuid>/{submission.json,state,work/,retrieved/}
//! ```
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use w2k_core::EngineError;
use w2k_model::{JobHandle, NodeId, ProcessState};

pub const SUBMISSION_FILE: &str = "submission.json";
pub const STATE_FILE: &str = "state";
pub const WORK_DIR: &str = "work";
pub const RETRIEVED_DIR: &str = "retrieved";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spool {
    root: PathBuf,
}

impl Spool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn computer_file(&self) -> PathBuf {
        self.root.join("computer.json")
    }

    pub fn codes(&self) -> PathBuf {
        self.root.join("codes")
    }

    pub fn code_file(&self, label: &str) -> PathBuf {
        self.codes().join(format!("{label}.json"))
    }

    pub fn files(&self) -> PathBuf {
        self.root.join("files")
    }

    pub fn file(&self, uuid: NodeId, filename: &str) -> PathBuf {
        self.files().join(uuid.to_string()).join(filename)
    }

    pub fn groups(&self) -> PathBuf {
        self.root.join("groups")
    }

    pub fn group(&self, label: &str) -> PathBuf {
        self.groups().join(label)
    }

    pub fn jobs(&self) -> PathBuf {
        self.root.join("jobs")
    }

    pub fn job(&self, handle: &JobHandle) -> PathBuf {
        self.jobs().join(handle.to_string())
    }

    pub fn sandboxes(&self) -> PathBuf {
        self.root.join("sandboxes")
    }

    pub fn sandbox(&self, id: NodeId) -> PathBuf {
        self.sandboxes().join(id.to_string())
    }

    pub fn work(&self, handle: &JobHandle) -> PathBuf {
        self.job(handle).join(WORK_DIR)
    }

    pub fn retrieved(&self, handle: &JobHandle) -> PathBuf {
        self.job(handle).join(RETRIEVED_DIR)
    }

    /// Create the top-level directories.
    pub async fn init(&self) -> io::Result<()> {
        for dir in [self.codes(), self.files(), self.groups(), self.jobs()] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    pub async fn read_state(&self, handle: &JobHandle) -> Result<ProcessState, EngineError> {
        match read_json(&self.job(handle).join(STATE_FILE)).await {
            Err(EngineError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                Err(EngineError::UnknownJob(*handle))
            }
            other => other,
        }
    }

    pub async fn write_state(
        &self,
        handle: &JobHandle,
        state: ProcessState,
    ) -> Result<(), EngineError> {
        write_json(&self.job(handle).join(STATE_FILE), &state).await
    }
}

/// Write `value` as pretty JSON; readers never observe a partial file.
///
/// Each call stages into its own temporary file, so concurrent writers of the
/// same path race only on the final rename.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), EngineError> {
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|e| EngineError::Malformed(e.to_string()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent).await?;

    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| EngineError::Internal(e.to_string()))??;
    Ok(())
}

pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| EngineError::Malformed(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn state_round_trips_and_missing_job_is_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        let spool = Spool::new(tmp.path());
        spool.init().await.unwrap();

        let handle = JobHandle::new();
        assert!(matches!(
            spool.read_state(&handle).await,
            Err(EngineError::UnknownJob(h)) if h == handle
        ));

        spool
            .write_state(&handle, ProcessState::Finished { exit_status: 300 })
            .await
            .unwrap();
        assert_eq!(
            spool.read_state(&handle).await.unwrap(),
            ProcessState::Finished { exit_status: 300 }
        );
        let left: Vec<_> = std::fs::read_dir(spool.job(&handle))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(left, [STATE_FILE]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_state_writes_never_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let spool = Spool::new(tmp.path());
        spool.init().await.unwrap();
        let handle = JobHandle::new();

        for _ in 0..100 {
            let tasks: Vec<_> = [ProcessState::Running, ProcessState::Killed]
                .into_iter()
                .map(|state| {
                    let spool = spool.clone();
                    tokio::spawn(async move { spool.write_state(&handle, state).await })
                })
                .collect();
            for task in tasks {
                task.await.unwrap().unwrap();
            }
        }

        let last = spool.read_state(&handle).await.unwrap();
        assert!(matches!(last, ProcessState::Running | ProcessState::Killed));
        let entries = std::fs::read_dir(spool.job(&handle)).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn garbage_state_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let spool = Spool::new(tmp.path());
        let handle = JobHandle::new();

        tokio::fs::create_dir_all(spool.job(&handle)).await.unwrap();
        tokio::fs::write(spool.job(&handle).join(STATE_FILE), "nope")
            .await
            .unwrap();
        assert!(matches!(
            spool.read_state(&handle).await,
            Err(EngineError::Malformed(_))
        ));
    }

    #[test]
    fn group_labels_map_to_nested_dirs() {
        let spool = Spool::new("/var/w2k");
        assert_eq!(
            spool.group("commonwf-oxides/set1/structures"),
            PathBuf::from("/var/w2k/groups/commonwf-oxides/set1/structures")
        );
        assert_eq!(
            spool.code_file("wien2k-init_lapw@localhost"),
            PathBuf::from("/var/w2k/codes/wien2k-init_lapw@localhost.json")
        );
    }
}
