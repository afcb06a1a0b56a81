use serde::{Deserialize, Serialize};

use crate::{ModelError, ModelResult};

/// Scheduler resources requested for one job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub num_machines: u32,
    pub num_mpiprocs_per_machine: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cores_per_mpiproc: Option<u32>,
}

impl Resources {
    pub const fn new(num_machines: u32, num_mpiprocs_per_machine: u32) -> Self {
        Self {
            num_machines,
            num_mpiprocs_per_machine,
            num_cores_per_mpiproc: None,
        }
    }

    pub const fn with_cores_per_mpiproc(mut self, cores: u32) -> Self {
        self.num_cores_per_mpiproc = Some(cores);
        self
    }

    pub fn total_mpiprocs(&self) -> u32 {
        self.num_machines * self.num_mpiprocs_per_machine
    }

    /// Rules:
    /// - every count is non-zero.
    pub fn validate(&self) -> ModelResult<()> {
        if self.num_machines == 0 {
            return Err(ModelError::InvalidResources("num_machines cannot be zero".into()));
        }
        if self.num_mpiprocs_per_machine == 0 {
            return Err(ModelError::InvalidResources(
                "num_mpiprocs_per_machine cannot be zero".into(),
            ));
        }
        if self.num_cores_per_mpiproc == Some(0) {
            return Err(ModelError::InvalidResources(
                "num_cores_per_mpiproc cannot be zero".into(),
            ));
        }
        Ok(())
    }
}

/// One machine, one MPI process.
impl Default for Resources {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
