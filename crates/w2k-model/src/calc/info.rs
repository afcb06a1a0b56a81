use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Invocation of one code inside a calculation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeInfo {
    /// Arguments passed to the code executable.
    #[serde(default)]
    pub cmdline_params: Vec<String>,
    /// Code node to run.
    pub code_uuid: NodeId,
    /// File (relative to the working directory) receiving stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_name: Option<String>,
}

/// Copy of a local file node into the working directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCopy {
    /// File node to copy from.
    pub uuid: NodeId,
    /// Name of the file inside the node.
    pub filename: String,
    /// Destination relative to the working directory.
    pub target: PathBuf,
}

/// Copy performed on the computer running the job, from a previous working directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCopy {
    /// Computer owning both paths.
    pub computer: NodeId,
    /// Absolute source path on that computer.
    pub source: PathBuf,
    /// Destination relative to the working directory.
    pub target: PathBuf,
}

/// Job descriptor handed to the engine: what to run, what to stage, what to retrieve.
///
/// Files placed in the sandbox folder during preparation are part of the descriptor
/// implicitly; the engine uploads the sandbox as the initial working directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcInfo {
    pub codes_info: Vec<CodeInfo>,
    #[serde(default)]
    pub local_copy_list: Vec<LocalCopy>,
    #[serde(default)]
    pub remote_copy_list: Vec<RemoteCopy>,
    /// Glob patterns, relative to the working directory, retrieved after execution.
    #[serde(default)]
    pub retrieve_list: Vec<String>,
}
