use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{CalcInfo, Code, EosInputs, Parameters, RemoteFolder, Resources, SinglefileData};

/// Inputs accepted by a calculation plugin.
///
/// Everything except `code` is optional; plugins decide what absence means.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcInputs {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    /// Structure file staged as the case structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structfile: Option<SinglefileData>,
    /// Working directory of a previous calculation to continue from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder: Option<RemoteFolder>,
    /// Overrides the plugin default resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
}

impl CalcInputs {
    /// Inputs with only a code set.
    pub fn new(code: Code) -> Self {
        Self {
            code,
            parameters: None,
            structfile: None,
            parent_folder: None,
            resources: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_structfile(mut self, structfile: SinglefileData) -> Self {
        self.structfile = Some(structfile);
        self
    }

    pub fn with_parent_folder(mut self, parent: RemoteFolder) -> Self {
        self.parent_folder = Some(parent);
        self
    }
}

/// Unit of work handed to an engine for execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Submission {
    /// Prepared single calculation.
    #[serde(rename_all = "camelCase")]
    Calculation {
        entry_point: String,
        code: Code,
        calc_info: CalcInfo,
        /// Sandbox folder filled during preparation, uploaded as the working directory.
        sandbox: PathBuf,
        resources: Resources,
    },
    /// Workflow executed by the engine itself.
    #[serde(rename_all = "camelCase")]
    Workflow {
        entry_point: String,
        inputs: Box<EosInputs>,
    },
}

impl Submission {
    pub fn entry_point(&self) -> &str {
        match self {
            Submission::Calculation { entry_point, .. } => entry_point,
            Submission::Workflow { entry_point, .. } => entry_point,
        }
    }

    /// Returns the kind as a static string.
    pub fn kind(&self) -> &'static str {
        match self {
            Submission::Calculation { .. } => "calculation",
            Submission::Workflow { .. } => "workflow",
        }
    }
}
