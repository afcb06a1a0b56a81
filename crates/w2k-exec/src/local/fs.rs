//! Blocking filesystem helpers used for staging and retrieval.
use std::{fs, io, path::Path};

use walkdir::WalkDir;

/// Recursively copy the contents of `src` into `dst`, merging with what is already there.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy `src` (file or directory) like `cp -r src target`.
///
/// If `target` is an existing directory, `src` lands inside it under its own name.
pub fn copy_into(src: &Path, target: &Path) -> io::Result<()> {
    let dst = match (target.is_dir(), src.file_name()) {
        (true, Some(name)) => target.join(name),
        _ => target.to_path_buf(),
    };

    if src.is_dir() {
        copy_tree(src, &dst)
    } else {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, &dst).map(|_| ())
    }
}
