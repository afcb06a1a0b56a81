//! References to nodes owned by the workflow engine.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Machine on which codes run and remote folders live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Computer {
    pub uuid: NodeId,
    pub label: String,
}

/// Executable installed on a computer, addressed as `<name>@<computer>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Code {
    pub uuid: NodeId,
    pub label: String,
    /// Absolute path of the executable on `computer`.
    pub executable: PathBuf,
    pub computer: Computer,
}

/// Working directory left behind by a previous job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFolder {
    pub computer: NodeId,
    pub path: PathBuf,
}

impl RemoteFolder {
    pub fn new(computer: NodeId, path: impl Into<PathBuf>) -> Self {
        Self {
            computer,
            path: path.into(),
        }
    }

    /// Path of an entry inside the folder.
    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.path.join(rel)
    }
}

/// Single local file stored by the engine (e.g. a `case.struct`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinglefileData {
    pub uuid: NodeId,
    pub filename: String,
    /// Where the engine keeps the content locally.
    pub path: PathBuf,
}

impl SinglefileData {
    /// Reference a local file, using its file name as the node file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            uuid: NodeId::new_v4(),
            filename,
            path,
        }
    }
}
