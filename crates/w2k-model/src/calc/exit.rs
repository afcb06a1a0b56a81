use std::fmt;

use serde::{Deserialize, Serialize};

/// Exit status of a calculation whose expected output files are absent after execution.
pub const EXIT_MISSING_OUTPUT_FILES: u32 = 300;

/// Label of [`EXIT_MISSING_OUTPUT_FILES`].
pub const LABEL_MISSING_OUTPUT_FILES: &str = "ERROR_MISSING_OUTPUT_FILES";

/// Distinguished failure condition declared by a calculation plugin.
///
/// Plugins only declare codes; the engine raises them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitCode {
    pub status: u32,
    pub label: String,
    pub message: String,
}

impl ExitCode {
    pub fn new(status: u32, label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            label: label.into(),
            message: message.into(),
        }
    }

    /// The `300 ERROR_MISSING_OUTPUT_FILES` code.
    pub fn missing_output_files() -> Self {
        Self::new(
            EXIT_MISSING_OUTPUT_FILES,
            LABEL_MISSING_OUTPUT_FILES,
            "Calculation did not produce all expected output files.",
        )
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.label, self.message)
    }
}
