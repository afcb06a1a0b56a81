use std::{
    fs,
    path::{Path, PathBuf},
};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::trace;
use walkdir::WalkDir;

use crate::ExecError;

/// Compile retrieve patterns; `*` does not cross directory separators.
pub fn compile_patterns(patterns: &[String]) -> Result<GlobSet, ExecError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

/// Copy files of `work` matching any pattern into `dest`, keeping relative paths.
///
/// Returns the relative paths copied, sorted.
pub fn retrieve(work: &Path, dest: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, ExecError> {
    let set = compile_patterns(patterns)?;
    let mut copied = Vec::new();

    for entry in WalkDir::new(work).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(work) else {
            continue;
        };
        if !set.is_match(rel) {
            continue;
        }

        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)?;
        trace!(file = %rel.display(), "retrieved");
        copied.push(rel.to_path_buf());
    }
    Ok(copied)
}
