//! Calculation plugin for WIEN2k `init_lapw` in batch mode.
use std::{path::PathBuf, sync::Arc};

use tracing::trace;

use w2k_core::{CalcJob, CalcJobError, CalcJobRegistry, CoreError, Folder};
use w2k_model::{
    CalcInfo, CalcInputs, CodeInfo, ENTRY_POINT_INIT_LAPW, ExitCode, LocalCopy, RemoteCopy,
    Resources,
};

use crate::cli_options;

/// File receiving `init_lapw` stdout.
pub const INIT_LAPW_STDOUT: &str = "init_lapw.log";

/// Case directory inside the working directory.
pub const CASE_DIR: &str = "case";

/// Destination of the staged structure file.
pub const CASE_STRUCT: &str = "case/case.struct";

/// Input files generated by `init_lapw`, retrieved after execution.
pub const RETRIEVE_CASE_INPUTS: &str = "case/case.in*";

/// Batch (non-interactive) switch, always passed first.
const BATCH_FLAG: &str = "-b";

/// `init_lapw -b [options]`.
///
/// Inputs:
/// - `parameters`: rendered with [`cli_options`]; absent means no options
/// - `structfile`: staged as `case/case.struct`
/// - `parent_folder`: its `case` directory is copied into the working directory
///   instead of creating an empty one
#[derive(Debug, Default, Clone, Copy)]
pub struct InitLapw;

impl CalcJob for InitLapw {
    fn entry_point(&self) -> &'static str {
        ENTRY_POINT_INIT_LAPW
    }

    fn default_resources(&self) -> Resources {
        Resources::new(1, 1)
    }

    fn exit_codes(&self) -> Vec<ExitCode> {
        vec![ExitCode::missing_output_files()]
    }

    fn prepare_for_submission(
        &self,
        inputs: &CalcInputs,
        folder: &Folder,
    ) -> Result<CalcInfo, CalcJobError> {
        let mut cmdline_params = vec![BATCH_FLAG.to_string()];
        if let Some(parameters) = &inputs.parameters {
            cmdline_params.extend(cli_options(parameters));
        }

        let code_info = CodeInfo {
            cmdline_params,
            code_uuid: inputs.code.uuid,
            stdout_name: Some(INIT_LAPW_STDOUT.to_string()),
        };

        let remote_copy_list = match &inputs.parent_folder {
            Some(parent) => vec![RemoteCopy {
                computer: parent.computer,
                source: parent.join(CASE_DIR),
                target: PathBuf::from("./"),
            }],
            None => {
                folder.get_subfolder(CASE_DIR, true)?;
                Vec::new()
            }
        };

        let local_copy_list = inputs
            .structfile
            .iter()
            .map(|file| LocalCopy {
                uuid: file.uuid,
                filename: file.filename.clone(),
                target: PathBuf::from(CASE_STRUCT),
            })
            .collect();

        trace!(
            args = ?code_info.cmdline_params,
            parent = inputs.parent_folder.is_some(),
            structfile = inputs.structfile.is_some(),
            "init_lapw descriptor",
        );

        Ok(CalcInfo {
            codes_info: vec![code_info],
            local_copy_list,
            remote_copy_list,
            retrieve_list: vec![RETRIEVE_CASE_INPUTS.to_string()],
        })
    }
}

/// Register the WIEN2k calculation plugins in the given registry.
///
/// After this call, [`ENTRY_POINT_INIT_LAPW`] resolves to [`InitLapw`].
pub fn register_wien2k_plugins(registry: &mut CalcJobRegistry) -> Result<(), CoreError> {
    registry.register(Arc::new(InitLapw))
}
