use serde::{Deserialize, Serialize};

use crate::{Code, ModelError, ModelResult, Parameters, Resources, Structure};

/// Codes used by the equation-of-state workflow, one per step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EosCodes {
    /// `x sgroup`
    pub sgroup: Code,
    /// `init_lapw`
    pub init_lapw: Code,
    /// `run_lapw`
    pub run_lapw: Code,
    /// `x optimize`
    pub optimize: Code,
    /// `run_lapw` with charge density extrapolation between volumes.
    pub run_lapw_clmextrapol: Code,
}

/// Inputs of one equation-of-state workflow submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EosInputs {
    pub structure: Structure,
    pub codes: EosCodes,
    /// Options for `x sgroup`.
    #[serde(default)]
    pub sgroup_params: Parameters,
    /// Options for `init_lapw -b`.
    #[serde(default)]
    pub init_params: Parameters,
    /// Options for `run_lapw`.
    #[serde(default)]
    pub scf_params: Parameters,
    /// Volume changes in percent relative to the input structure; 0 is implied.
    pub dvolumes: Vec<f64>,
    #[serde(default)]
    pub resources: Resources,
}

impl EosInputs {
    /// Validate before submission.
    ///
    /// Rules:
    /// - `dvolumes` is not empty and every entry is finite, non-zero and above -100;
    /// - resources are valid.
    pub fn validate(&self) -> ModelResult<()> {
        if self.dvolumes.is_empty() {
            return Err(ModelError::Invalid("dvolumes is empty".into()));
        }
        for dv in &self.dvolumes {
            if !dv.is_finite() || *dv == 0.0 || *dv <= -100.0 {
                return Err(ModelError::Invalid(format!("invalid volume change: {dv}%")));
            }
        }
        self.resources.validate()
    }

    /// Absolute volumes visited by the workflow, including the reference volume.
    pub fn target_volumes(&self) -> Vec<f64> {
        let v0 = self.structure.volume();
        let mut out: Vec<f64> = self
            .dvolumes
            .iter()
            .map(|dv| v0 * (1.0 + dv / 100.0))
            .chain(std::iter::once(v0))
            .collect();
        out.sort_by(|a, b| a.total_cmp(b));
        out
    }
}
