//! Registry of calculation plugins keyed by entry point.
//!
//! The registry is the only place that turns plugin output into a [`Submission`]:
//! it resolves the plugin, picks resources and records the sandbox location.
use std::sync::Arc;

use tracing::{debug, instrument, trace};
use w2k_model::{CalcInputs, Submission};

use crate::{calcjob::CalcJob, error::CoreError, folder::Folder};

/// Plugins in registration order; entry points are unique.
#[derive(Default)]
pub struct CalcJobRegistry {
    plugins: Vec<Arc<dyn CalcJob>>,
}

impl CalcJobRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Register a plugin.
    ///
    /// Fails if another plugin already uses the same entry point.
    pub fn register(&mut self, plugin: Arc<dyn CalcJob>) -> Result<(), CoreError> {
        let entry_point = plugin.entry_point();
        if self.get(entry_point).is_some() {
            return Err(CoreError::DuplicateEntryPoint(entry_point.to_string()));
        }
        debug!(entry_point, "calculation plugin registered");
        self.plugins.push(plugin);
        Ok(())
    }

    /// Find the plugin registered under `entry_point`.
    pub fn get(&self, entry_point: &str) -> Option<Arc<dyn CalcJob>> {
        self.plugins
            .iter()
            .find(|p| p.entry_point() == entry_point)
            .cloned()
    }

    /// Prepare a calculation for submission.
    ///
    /// Steps:
    /// 1. Resolve the plugin for `entry_point`.
    /// 2. Resolve resources (input override or plugin default) and validate them.
    /// 3. Let the plugin fill `folder` and build the job descriptor.
    #[instrument(level = "debug", skip(self, inputs, folder), fields(code = %inputs.code.label))]
    pub fn prepare(
        &self,
        entry_point: &str,
        inputs: &CalcInputs,
        folder: &Folder,
    ) -> Result<Submission, CoreError> {
        let plugin = self
            .get(entry_point)
            .ok_or_else(|| CoreError::NoPlugin(entry_point.to_string()))?;

        let resources = inputs.resources.unwrap_or_else(|| plugin.default_resources());
        resources.validate()?;

        let calc_info = plugin.prepare_for_submission(inputs, folder)?;
        trace!(
            codes = calc_info.codes_info.len(),
            local_copies = calc_info.local_copy_list.len(),
            remote_copies = calc_info.remote_copy_list.len(),
            retrieve = ?calc_info.retrieve_list,
            "job descriptor built",
        );

        Ok(Submission::Calculation {
            entry_point: plugin.entry_point().to_string(),
            code: inputs.code.clone(),
            calc_info,
            sandbox: folder.path().to_path_buf(),
            resources,
        })
    }
}
