//! Calculation plugin abstraction.
//!
//! A plugin turns [`CalcInputs`] into a job descriptor ([`CalcInfo`]) and may place
//! files into the sandbox [`Folder`]. It never runs anything itself.
mod error;
pub use error::CalcJobError;

use w2k_model::{CalcInfo, CalcInputs, ExitCode, Resources};

use crate::folder::Folder;

/// Calculation plugin for one external executable.
///
/// A plugin is responsible for:
/// - declaring its defaults and exit codes
/// - building the job descriptor for given inputs (`prepare_for_submission`)
pub trait CalcJob: Send + Sync {
    /// Entry point the plugin is registered under (e.g. `wien2k.init_lapw`).
    fn entry_point(&self) -> &'static str;

    /// Resources used when the inputs do not request any.
    fn default_resources(&self) -> Resources {
        Resources::default()
    }

    /// Exit codes the engine may attach to processes of this plugin.
    fn exit_codes(&self) -> Vec<ExitCode> {
        Vec::new()
    }

    /// Look up a declared exit code by status.
    fn exit_code(&self, status: u32) -> Option<ExitCode> {
        self.exit_codes().into_iter().find(|c| c.status == status)
    }

    /// Build the job descriptor.
    ///
    /// `folder` is the sandbox uploaded by the engine as the initial working directory.
    fn prepare_for_submission(
        &self,
        inputs: &CalcInputs,
        folder: &Folder,
    ) -> Result<CalcInfo, CalcJobError>;
}
