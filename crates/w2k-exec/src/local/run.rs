use std::{
    fs::File,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;
use tracing::{debug, trace};

use w2k_model::{CalcInfo, Code, CodeInfo, NodeId};

use crate::{
    ExecError,
    local::{fs, retrieve, spool::Spool},
};

/// Scheduler stderr, kept next to the code's stdout.
pub const STDERR_FILE: &str = "_scheduler-stderr.txt";

/// Lay out the working directory: sandbox, then remote copies, then local copies.
///
/// Local copies go last so an explicit structure file wins over one inherited
/// from a parent folder.
pub async fn stage(
    spool: &Spool,
    computer: NodeId,
    sandbox: &Path,
    info: &CalcInfo,
    work: &Path,
) -> Result<(), ExecError> {
    let mut steps: Vec<(PathBuf, PathBuf)> = Vec::new();
    steps.push((sandbox.to_path_buf(), work.to_path_buf()));

    for rc in &info.remote_copy_list {
        if rc.computer != computer {
            return Err(ExecError::Stage(format!(
                "remote copy from foreign computer {}",
                rc.computer
            )));
        }
        steps.push((rc.source.clone(), work.join(&rc.target)));
    }

    let first_local = steps.len();
    for lc in &info.local_copy_list {
        steps.push((spool.file(lc.uuid, &lc.filename), work.join(&lc.target)));
    }

    tokio::task::spawn_blocking(move || -> Result<(), ExecError> {
        for (i, (src, dst)) in steps.iter().enumerate() {
            if !src.exists() {
                return Err(ExecError::Stage(format!("missing source {}", src.display())));
            }
            match i {
                0 => fs::copy_tree(src, dst)?,
                i if i < first_local => fs::copy_into(src, dst)?,
                _ => {
                    if let Some(parent) = dst.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::copy(src, dst)?;
                }
            }
            trace!(src = %src.display(), dst = %dst.display(), "staged");
        }
        Ok(())
    })
    .await
    .map_err(|e| ExecError::Stage(format!("staging task failed: {e}")))?
}

/// Run `code` in `work` with the arguments of `info`.
pub async fn execute(code: &Code, info: &CodeInfo, work: &Path) -> Result<(), ExecError> {
    if info.code_uuid != code.uuid {
        return Err(ExecError::CodeMismatch {
            expected: info.code_uuid.to_string(),
            actual: code.uuid.to_string(),
        });
    }

    trace!(
        executable = %code.executable.display(),
        args = ?info.cmdline_params,
        cwd = %work.display(),
        "spawning calculation",
    );

    let stdout = match &info.stdout_name {
        Some(name) => Stdio::from(File::create(work.join(name))?),
        None => Stdio::null(),
    };
    let stderr = Stdio::from(File::create(work.join(STDERR_FILE))?);

    let mut cmd = Command::new(&code.executable);
    cmd.args(&info.cmdline_params)
        .current_dir(work)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);

    let mut child = cmd
        .spawn()
        .map_err(|e| ExecError::Spawn(format!("{}: {e}", code.executable.display())))?;
    let status = child.wait().await?;

    if status.success() {
        debug!("calculation exited successfully");
        Ok(())
    } else if let Some(code) = status.code() {
        Err(ExecError::NonZeroExit(code))
    } else {
        Err(ExecError::Signaled)
    }
}

/// Copy retrieve-list matches from `work` into `dest`; returns how many files were copied.
pub async fn collect(work: &Path, dest: &Path, patterns: &[String]) -> Result<usize, ExecError> {
    let (work, dest, patterns) = (work.to_path_buf(), dest.to_path_buf(), patterns.to_vec());
    tokio::task::spawn_blocking(move || retrieve::retrieve(&work, &dest, &patterns))
        .await
        .map_err(|e| ExecError::Stage(format!("retrieve task failed: {e}")))?
        .map(|files| files.len())
}
