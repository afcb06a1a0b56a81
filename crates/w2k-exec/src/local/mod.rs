//! Filesystem-backed engine running calculations as local subprocesses.
//!
//! Workflows are only spooled: they stay `created` until whatever consumes the
//! spool rewrites their `state` file.
mod fs;
mod retrieve;
mod run;
mod spool;

pub use retrieve::compile_patterns;
pub use run::STDERR_FILE;
pub use spool::Spool;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use w2k_core::{Engine, EngineError, Folder};
use w2k_model::{
    CalcInfo, Code, Computer, EXIT_MISSING_OUTPUT_FILES, JobHandle, NodeId, ProcessState,
    RemoteFolder, SinglefileData, Structure, Submission,
};

use crate::ExecError;

const ENGINE_NAME: &str = "local";

/// Label of the single computer managed by the engine.
pub const LOCALHOST: &str = "localhost";

/// Engine that owns one computer (this host) and a spool directory.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    spool: Spool,
    computer: Computer,
}

impl LocalEngine {
    /// Open (or initialise) the spool rooted at `root`.
    ///
    /// The computer identity is persisted so codes and folders stay valid across runs.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let spool = Spool::new(root);
        spool.init().await?;

        let path = spool.computer_file();
        let computer = if tokio::fs::try_exists(&path).await? {
            spool::read_json(&path).await?
        } else {
            let computer = Computer {
                uuid: NodeId::new_v4(),
                label: LOCALHOST.to_string(),
            };
            spool::write_json(&path, &computer).await?;
            computer
        };

        debug!(root = %spool.root().display(), computer = %computer.uuid, "local engine opened");
        Ok(Self { spool, computer })
    }

    pub fn root(&self) -> &Path {
        self.spool.root()
    }

    pub fn computer(&self) -> &Computer {
        &self.computer
    }

    /// Working directory of a job.
    pub fn work_dir(&self, handle: &JobHandle) -> PathBuf {
        self.spool.work(handle)
    }

    /// Directory receiving retrieved files of a job.
    pub fn retrieved_dir(&self, handle: &JobHandle) -> PathBuf {
        self.spool.retrieved(handle)
    }

    /// Install a code under `label`, pointing at `executable` on this host.
    pub async fn register_code(
        &self,
        label: &str,
        executable: impl Into<PathBuf>,
    ) -> Result<Code, EngineError> {
        let code = Code {
            uuid: NodeId::new_v4(),
            label: label.to_string(),
            executable: executable.into(),
            computer: self.computer.clone(),
        };
        spool::write_json(&self.spool.code_file(label), &code).await?;
        debug!(label, executable = %code.executable.display(), "code registered");
        Ok(code)
    }

    /// Copy a file into the engine store.
    pub async fn store_file(&self, src: &Path) -> Result<SinglefileData, EngineError> {
        let mut file = SinglefileData::from_path(src);
        if file.filename.is_empty() {
            return Err(EngineError::Invalid(format!(
                "not a file path: {}",
                src.display()
            )));
        }

        let dst = self.spool.file(file.uuid, &file.filename);
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(src, &dst).await?;
        file.path = dst;
        Ok(file)
    }

    /// Create an empty sandbox folder for preparing a calculation.
    pub fn new_sandbox(&self) -> Result<Folder, EngineError> {
        Ok(Folder::create(self.spool.sandbox(NodeId::new_v4()))?)
    }

    /// Add a structure to a group, creating the group if needed.
    pub async fn store_structure(
        &self,
        group: &str,
        name: &str,
        structure: &Structure,
    ) -> Result<(), EngineError> {
        let path = self.spool.group(group).join(format!("{name}.json"));
        spool::write_json(&path, structure).await
    }

    /// Overwrite the state of a job.
    pub async fn set_state(
        &self,
        handle: &JobHandle,
        state: ProcessState,
    ) -> Result<(), EngineError> {
        // Fails for unknown jobs.
        let current = self.spool.read_state(handle).await?;
        if current.is_terminated() {
            warn!(job = %handle, from = %current, to = %state, "overwriting a terminal state");
        }
        self.spool.write_state(handle, state).await
    }

    async fn spool_submission(&self, submission: &Submission) -> Result<JobHandle, EngineError> {
        let handle = JobHandle::new();
        let job = self.spool.job(&handle);
        tokio::fs::create_dir_all(&job).await?;

        self.spool.write_state(&handle, ProcessState::Created).await?;
        spool::write_json(&job.join(spool::SUBMISSION_FILE), submission).await?;
        Ok(handle)
    }

    fn spawn_calculation(
        &self,
        handle: JobHandle,
        code: Code,
        calc_info: CalcInfo,
        sandbox: PathBuf,
    ) {
        let spool = self.spool.clone();
        let computer = self.computer.uuid;

        tokio::spawn(async move {
            let state = match run_calculation(&spool, computer, &handle, &code, &calc_info, &sandbox)
                .await
            {
                Ok(None) => {
                    info!(job = %handle, "calculation finished, no retrieve list");
                    ProcessState::Finished { exit_status: 0 }
                }
                Ok(Some(0)) => {
                    warn!(job = %handle, "no output matched the retrieve list");
                    ProcessState::Finished {
                        exit_status: EXIT_MISSING_OUTPUT_FILES,
                    }
                }
                Ok(Some(retrieved)) => {
                    info!(job = %handle, retrieved, "calculation finished");
                    ProcessState::Finished { exit_status: 0 }
                }
                Err(e) => {
                    warn!(job = %handle, error = %e, "calculation excepted");
                    ProcessState::Excepted
                }
            };
            if let Err(e) = spool.write_state(&handle, state).await {
                warn!(job = %handle, error = %e, "failed to record final state");
            }
        });
    }
}

async fn run_calculation(
    spool: &Spool,
    computer: NodeId,
    handle: &JobHandle,
    code: &Code,
    calc_info: &CalcInfo,
    sandbox: &Path,
) -> Result<Option<usize>, ExecError> {
    spool
        .write_state(handle, ProcessState::Running)
        .await
        .map_err(|e| ExecError::Stage(e.to_string()))?;

    let work = spool.work(handle);
    run::stage(spool, computer, sandbox, calc_info, &work).await?;

    for code_info in &calc_info.codes_info {
        run::execute(code, code_info, &work).await?;
    }

    if calc_info.retrieve_list.is_empty() {
        return Ok(None);
    }
    run::collect(&work, &spool.retrieved(handle), &calc_info.retrieve_list)
        .await
        .map(Some)
}

#[async_trait]
impl Engine for LocalEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    #[instrument(level = "debug", skip(self, submission), fields(kind = submission.kind(), entry_point = submission.entry_point()))]
    async fn submit(&self, submission: &Submission) -> Result<JobHandle, EngineError> {
        match submission {
            Submission::Calculation {
                code,
                calc_info,
                sandbox,
                resources,
                ..
            } => {
                if code.computer.uuid != self.computer.uuid {
                    return Err(EngineError::Unsupported {
                        engine: ENGINE_NAME,
                        what: format!("code on computer '{}'", code.computer.label),
                    });
                }
                let handle = self.spool_submission(submission).await?;
                self.spawn_calculation(handle, code.clone(), calc_info.clone(), sandbox.clone());
                debug!(job = %handle, mpiprocs = resources.total_mpiprocs(), "calculation submitted");
                Ok(handle)
            }
            Submission::Workflow { inputs, .. } => {
                inputs
                    .validate()
                    .map_err(|e| EngineError::Invalid(e.to_string()))?;
                let handle = self.spool_submission(submission).await?;
                debug!(job = %handle, "workflow spooled");
                Ok(handle)
            }
        }
    }

    async fn status(&self, handle: &JobHandle) -> Result<ProcessState, EngineError> {
        self.spool.read_state(handle).await
    }

    async fn copy(&self, source: &RemoteFolder, target: &Path) -> Result<(), EngineError> {
        if source.computer != self.computer.uuid {
            return Err(EngineError::Unsupported {
                engine: ENGINE_NAME,
                what: format!("copy from computer {}", source.computer),
            });
        }
        let (src, dst) = (source.path.clone(), target.to_path_buf());
        tokio::task::spawn_blocking(move || fs::copy_into(&src, &dst))
            .await
            .map_err(|e| EngineError::Internal(e.to_string()))??;
        Ok(())
    }

    async fn query(&self, entry_point: &str) -> Result<Vec<JobHandle>, EngineError> {
        let mut handles = Vec::new();
        let mut dir = tokio::fs::read_dir(self.spool.jobs()).await?;

        while let Some(entry) = dir.next_entry().await? {
            let Ok(id) = entry.file_name().to_string_lossy().parse::<NodeId>() else {
                continue;
            };
            let path = entry.path().join(spool::SUBMISSION_FILE);
            // Job directories exist briefly before their submission is written.
            if !tokio::fs::try_exists(&path).await? {
                continue;
            }
            let submission: Submission = spool::read_json(&path).await?;
            if submission.entry_point() == entry_point {
                handles.push(JobHandle(id));
            }
        }

        handles.sort();
        Ok(handles)
    }

    async fn load_code(&self, label: &str) -> Result<Code, EngineError> {
        let path = self.spool.code_file(label);
        if !tokio::fs::try_exists(&path).await? {
            return Err(EngineError::NotFound {
                kind: "code",
                label: label.to_string(),
            });
        }
        spool::read_json(&path).await
    }

    async fn load_group(&self, label: &str) -> Result<Vec<Structure>, EngineError> {
        let dir = self.spool.group(label);
        if !tokio::fs::try_exists(&dir).await? {
            return Err(EngineError::NotFound {
                kind: "group",
                label: label.to_string(),
            });
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut structures = Vec::with_capacity(paths.len());
        for path in &paths {
            structures.push(spool::read_json(path).await?);
        }
        debug!(label, count = structures.len(), "group loaded");
        Ok(structures)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use w2k_core::CalcJobRegistry;
    use w2k_model::{
        CalcInputs, CodeInfo, ENTRY_POINT_EOS, ENTRY_POINT_INIT_LAPW, EosCodes, EosInputs, Parameters,
        Resources, Site,
    };

    use super::*;
    use crate::register_wien2k_plugins;

    fn cubic(a: f64, symbols: &[&str]) -> Structure {
        let sites = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| Site::new(*s, [0.1 * i as f64, 0.0, 0.0]))
            .collect();
        Structure::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]], sites)
    }

    async fn wait_terminated(engine: &LocalEngine, handle: &JobHandle) -> ProcessState {
        for _ in 0..1000 {
            let state = engine.status(handle).await.unwrap();
            if state.is_terminated() {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {handle} did not terminate");
    }

    async fn eos_inputs(engine: &LocalEngine) -> EosInputs {
        let code = engine.register_code("x@localhost", "/bin/true").await.unwrap();
        EosInputs {
            structure: cubic(4.0, &["H", "O", "O", "O"]),
            codes: EosCodes {
                sgroup: code.clone(),
                init_lapw: code.clone(),
                run_lapw: code.clone(),
                optimize: code.clone(),
                run_lapw_clmextrapol: code,
            },
            sgroup_params: Parameters::new(),
            init_params: Parameters::new().with("-red", "3"),
            scf_params: Parameters::new(),
            dvolumes: vec![-2.0, 2.0],
            resources: Resources::default(),
        }
    }

    #[tokio::test]
    async fn open_persists_computer() {
        let tmp = tempfile::tempdir().unwrap();
        let first = LocalEngine::open(tmp.path()).await.unwrap();
        let second = LocalEngine::open(tmp.path()).await.unwrap();

        assert_eq!(first.computer(), second.computer());
        assert_eq!(first.computer().label, "localhost");
        for dir in ["codes", "files", "groups", "jobs"] {
            assert!(tmp.path().join(dir).is_dir(), "{dir}");
        }
    }

    #[tokio::test]
    async fn codes_and_groups_are_loaded_by_label() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = LocalEngine::open(tmp.path()).await.unwrap();

        let code = engine
            .register_code("wien2k-run_lapw@localhost", "/opt/wien2k/run_lapw")
            .await
            .unwrap();
        assert_eq!(engine.load_code("wien2k-run_lapw@localhost").await.unwrap(), code);
        assert!(matches!(
            engine.load_code("missing@localhost").await,
            Err(EngineError::NotFound { kind: "code", .. })
        ));

        let group = "commonwf-oxides/set1/structures";
        engine
            .store_structure(group, "b", &cubic(4.0, &["H", "O"]))
            .await
            .unwrap();
        engine
            .store_structure(group, "a", &cubic(3.0, &["H", "H", "O"]))
            .await
            .unwrap();
        let structures = engine.load_group(group).await.unwrap();
        assert_eq!(structures.len(), 2);
        assert_eq!(structures[0].natoms(), 3);
        assert!(matches!(
            engine.load_group("nope").await,
            Err(EngineError::NotFound { kind: "group", .. })
        ));
    }

    #[tokio::test]
    async fn workflows_are_spooled_and_queried() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = LocalEngine::open(tmp.path()).await.unwrap();
        let inputs = eos_inputs(&engine).await;

        let sub = Submission::Workflow {
            entry_point: ENTRY_POINT_EOS.into(),
            inputs: Box::new(inputs.clone()),
        };
        let a = engine.submit(&sub).await.unwrap();
        let b = engine.submit(&sub).await.unwrap();

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(engine.query(ENTRY_POINT_EOS).await.unwrap(), expected);
        assert!(engine.query(ENTRY_POINT_INIT_LAPW).await.unwrap().is_empty());
        assert_eq!(engine.status(&a).await.unwrap(), ProcessState::Created);

        engine.set_state(&a, ProcessState::Running).await.unwrap();
        assert_eq!(engine.status(&a).await.unwrap(), ProcessState::Running);
        assert!(matches!(
            engine.set_state(&JobHandle::new(), ProcessState::Killed).await,
            Err(EngineError::UnknownJob(_))
        ));

        let mut bad = inputs;
        bad.dvolumes.clear();
        let err = engine
            .submit(&Submission::Workflow {
                entry_point: ENTRY_POINT_EOS.into(),
                inputs: Box::new(bad),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)));
        assert_eq!(engine.query(ENTRY_POINT_EOS).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn copy_rejects_foreign_computer() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = LocalEngine::open(tmp.path().join("spool")).await.unwrap();

        let src = tmp.path().join("prev/case");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("case.in0"), "x").unwrap();

        let target = tmp.path().join("next");
        std::fs::create_dir_all(&target).unwrap();
        let folder = RemoteFolder::new(engine.computer().uuid, tmp.path().join("prev"));
        engine.copy(&folder, &target).await.unwrap();
        assert!(target.join("prev/case/case.in0").is_file());

        let foreign = RemoteFolder::new(NodeId::new_v4(), tmp.path().join("prev"));
        assert!(matches!(
            engine.copy(&foreign, &target).await,
            Err(EngineError::Unsupported { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn runs_init_lapw_and_retrieves_case_inputs() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let engine = LocalEngine::open(tmp.path().join("spool")).await.unwrap();

        // Stand-in for init_lapw: echoes its arguments and derives an input file from the struct.
        let script = tmp.path().join("init_lapw");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"$@\"\n[ -f case/case.struct ] && cp case/case.struct case/case.in0\nexit 0\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let code = engine
            .register_code("wien2k-init_lapw@localhost", &script)
            .await
            .unwrap();
        let structfile = tmp.path().join("H-XO3.struct");
        std::fs::write(&structfile, "H-XO3 struct").unwrap();
        let structfile = engine.store_file(&structfile).await.unwrap();

        let mut registry = CalcJobRegistry::new();
        register_wien2k_plugins(&mut registry).unwrap();

        // With a structure file, init_lapw produces case.in0.
        let sandbox = engine.new_sandbox().unwrap();
        let inputs = CalcInputs::new(code.clone())
            .with_parameters(Parameters::new().with("-red", "3").with("-hdlo", true))
            .with_structfile(structfile);
        let sub = registry
            .prepare(ENTRY_POINT_INIT_LAPW, &inputs, &sandbox)
            .unwrap();

        let job = engine.submit(&sub).await.unwrap();
        assert_eq!(
            wait_terminated(&engine, &job).await,
            ProcessState::Finished { exit_status: 0 }
        );
        let work = engine.work_dir(&job);
        assert_eq!(
            std::fs::read_to_string(work.join("init_lapw.log")).unwrap().trim(),
            "-b -red 3 -hdlo"
        );
        assert!(work.join(STDERR_FILE).is_file());
        assert_eq!(
            std::fs::read_to_string(engine.retrieved_dir(&job).join("case/case.in0")).unwrap(),
            "H-XO3 struct"
        );
        assert!(!engine.retrieved_dir(&job).join("case/case.struct").exists());

        // Without one, nothing matches the retrieve list.
        let sandbox = engine.new_sandbox().unwrap();
        let sub = registry
            .prepare(ENTRY_POINT_INIT_LAPW, &CalcInputs::new(code.clone()), &sandbox)
            .unwrap();
        let job = engine.submit(&sub).await.unwrap();
        assert_eq!(
            wait_terminated(&engine, &job).await,
            ProcessState::Finished { exit_status: 300 }
        );
        assert!(engine.work_dir(&job).join("case").is_dir());

        // Continuing from the first job copies its case directory.
        let parent = RemoteFolder::new(engine.computer().uuid, work.clone());
        let sandbox = engine.new_sandbox().unwrap();
        let sub = registry
            .prepare(
                ENTRY_POINT_INIT_LAPW,
                &CalcInputs::new(code.clone()).with_parent_folder(parent),
                &sandbox,
            )
            .unwrap();
        let job = engine.submit(&sub).await.unwrap();
        assert_eq!(
            wait_terminated(&engine, &job).await,
            ProcessState::Finished { exit_status: 0 }
        );
        assert!(engine.work_dir(&job).join("case/case.struct").is_file());
        assert_eq!(engine.query(ENTRY_POINT_INIT_LAPW).await.unwrap().len(), 3);

        // A failing executable ends the job as excepted.
        let failing = tmp.path().join("failing");
        std::fs::write(&failing, "#!/bin/sh\nexit 3\n").unwrap();
        std::fs::set_permissions(&failing, std::fs::Permissions::from_mode(0o755)).unwrap();
        let bad_code = engine
            .register_code("failing@localhost", &failing)
            .await
            .unwrap();
        let sandbox = engine.new_sandbox().unwrap();
        let sub = registry
            .prepare(ENTRY_POINT_INIT_LAPW, &CalcInputs::new(bad_code), &sandbox)
            .unwrap();
        let job = engine.submit(&sub).await.unwrap();
        assert_eq!(wait_terminated(&engine, &job).await, ProcessState::Excepted);

        // Nothing to retrieve is a plain success.
        let sandbox = engine.new_sandbox().unwrap();
        let sub = Submission::Calculation {
            entry_point: ENTRY_POINT_INIT_LAPW.to_string(),
            calc_info: CalcInfo {
                codes_info: vec![CodeInfo {
                    code_uuid: code.uuid,
                    ..Default::default()
                }],
                ..Default::default()
            },
            code,
            sandbox: sandbox.path().to_path_buf(),
            resources: Resources::default(),
        };
        let job = engine.submit(&sub).await.unwrap();
        assert_eq!(
            wait_terminated(&engine, &job).await,
            ProcessState::Finished { exit_status: 0 }
        );
        assert!(engine.work_dir(&job).join(STDERR_FILE).is_file());
        assert!(!engine.retrieved_dir(&job).exists());
    }
}
