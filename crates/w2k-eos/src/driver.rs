//! Submission loop: one equation-of-state workflow per selected structure.
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use w2k_core::{Engine, EngineError};
use w2k_model::{
    ENTRY_POINT_EOS, EosCodes, EosInputs, JobHandle, ModelError, Structure, Submission,
};

use crate::config::DriverConfig;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("structure {formula}: {source}")]
    Rescale {
        formula: String,
        source: ModelError,
    },
}

/// What one run did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Summary {
    /// Formula key and handle of each submitted workflow, in submission order.
    pub submitted: Vec<(String, JobHandle)>,
    /// Structures whose element or configuration was not selected.
    pub filtered: usize,
    /// Structures skipped because their formula is already completed.
    pub completed: usize,
    /// Structures without `element`/`configuration` extras.
    pub unlabelled: usize,
}

/// Walk the configured group and submit a workflow for every selected structure,
/// throttling after each submission.
#[instrument(skip_all, fields(engine = engine.name(), group = %cfg.group))]
pub async fn run(engine: &dyn Engine, cfg: &DriverConfig) -> Result<Summary, DriverError> {
    let structures = engine.load_group(&cfg.group).await?;
    info!(count = structures.len(), "group loaded");

    let throttle = cfg.throttle();
    let mut loaded_codes: Option<EosCodes> = None;
    let mut summary = Summary::default();

    for structure in structures {
        let (Some(element), Some(configuration), Some(key)) = (
            structure.element(),
            structure.configuration(),
            structure.formula_key(),
        ) else {
            warn!(formula = %structure.formula(), "structure has no element/configuration extras");
            summary.unlabelled += 1;
            continue;
        };
        if !cfg.elements.iter().any(|e| e == element)
            || !cfg.configurations.iter().any(|c| c == configuration)
        {
            summary.filtered += 1;
            continue;
        }
        info!(%key, extras = ?structure.extras, "structure selected");

        let formula = structure.formula();
        if cfg.completed_formulas.contains(&formula) {
            debug!(%formula, "already completed");
            summary.completed += 1;
            continue;
        }

        let structure = match cfg.scale_volumes.get(&key) {
            Some(&target) => rescale(structure, target)?,
            None => structure,
        };

        // Codes are resolved on first use only.
        let codes = match loaded_codes.clone() {
            Some(codes) => codes,
            None => {
                let codes = load_codes(engine, cfg).await?;
                loaded_codes = Some(codes.clone());
                codes
            }
        };

        let inputs = EosInputs {
            structure,
            codes,
            sgroup_params: cfg.sgroup_params.clone(),
            init_params: cfg.init_params.clone(),
            scf_params: cfg.scf_params.clone(),
            dvolumes: cfg.dvolumes.clone(),
            resources: cfg.resources,
        };
        debug!(volumes = ?inputs.target_volumes(), "volume scan");
        let submission = Submission::Workflow {
            entry_point: ENTRY_POINT_EOS.to_string(),
            inputs: Box::new(inputs),
        };
        let handle = engine.submit(&submission).await?;
        info!(%key, %formula, job = %handle, "workflow submitted");
        summary.submitted.push((key, handle));

        let polls = throttle.wait_below_ceiling(engine, ENTRY_POINT_EOS).await?;
        debug!(polls, "throttle released");
    }

    info!(
        submitted = summary.submitted.len(),
        filtered = summary.filtered,
        completed = summary.completed,
        unlabelled = summary.unlabelled,
        "all structures processed",
    );
    Ok(summary)
}

fn rescale(structure: Structure, target: f64) -> Result<Structure, DriverError> {
    let before = structure.volume();
    let scaled = structure
        .rescaled(target)
        .map_err(|source| DriverError::Rescale {
            formula: structure.formula(),
            source,
        })?;
    info!(
        before,
        after = scaled.volume(),
        natoms = scaled.natoms(),
        "structure rescaled"
    );
    Ok(scaled)
}

async fn load_codes(engine: &dyn Engine, cfg: &DriverConfig) -> Result<EosCodes, EngineError> {
    let labels = &cfg.codes;
    Ok(EosCodes {
        sgroup: engine.load_code(&labels.sgroup).await?,
        init_lapw: engine.load_code(&labels.init_lapw).await?,
        run_lapw: engine.load_code(&labels.run_lapw).await?,
        optimize: engine.load_code(&labels.optimize).await?,
        run_lapw_clmextrapol: engine.load_code(&labels.run_lapw_clmextrapol).await?,
    })
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        path::Path,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use tokio::time::Instant;
    use w2k_model::{Code, Computer, NodeId, ProcessState, RemoteFolder, Site};

    use super::*;

    /// In-memory engine: every submitted workflow stays active for `active_polls` status checks.
    struct Memory {
        group: Vec<Structure>,
        codes: BTreeMap<String, Code>,
        submitted: Mutex<Vec<(JobHandle, Submission)>>,
        status_calls: Mutex<BTreeMap<JobHandle, usize>>,
        active_polls: usize,
        code_loads: AtomicUsize,
    }

    impl Memory {
        fn new(group: Vec<Structure>, active_polls: usize) -> Self {
            let computer = Computer {
                uuid: NodeId::new_v4(),
                label: "localhost".into(),
            };
            let codes = DriverConfig::default().codes;
            let codes = [
                codes.sgroup,
                codes.init_lapw,
                codes.run_lapw,
                codes.optimize,
                codes.run_lapw_clmextrapol,
            ]
            .into_iter()
            .map(|label| {
                let code = Code {
                    uuid: NodeId::new_v4(),
                    label: label.clone(),
                    executable: format!("/opt/wien2k/{label}").into(),
                    computer: computer.clone(),
                };
                (label, code)
            })
            .collect();

            Self {
                group,
                codes,
                submitted: Mutex::new(Vec::new()),
                status_calls: Mutex::new(BTreeMap::new()),
                active_polls,
                code_loads: AtomicUsize::new(0),
            }
        }

        fn workflows(&self) -> Vec<EosInputs> {
            self.submitted
                .lock()
                .unwrap()
                .iter()
                .map(|(_, s)| match s {
                    Submission::Workflow { entry_point, inputs } => {
                        assert_eq!(entry_point, ENTRY_POINT_EOS);
                        (**inputs).clone()
                    }
                    other => panic!("unexpected submission {other:?}"),
                })
                .collect()
        }
    }

    #[async_trait]
    impl Engine for Memory {
        fn name(&self) -> &'static str {
            "memory"
        }

        async fn submit(&self, submission: &Submission) -> Result<JobHandle, EngineError> {
            let handle = JobHandle::new();
            self.submitted
                .lock()
                .unwrap()
                .push((handle, submission.clone()));
            Ok(handle)
        }

        async fn status(&self, handle: &JobHandle) -> Result<ProcessState, EngineError> {
            let mut calls = self.status_calls.lock().unwrap();
            let n = calls.entry(*handle).or_default();
            *n += 1;
            if *n <= self.active_polls {
                Ok(ProcessState::Created)
            } else {
                Ok(ProcessState::Running)
            }
        }

        async fn copy(&self, _: &RemoteFolder, _: &Path) -> Result<(), EngineError> {
            Ok(())
        }

        async fn query(&self, _: &str) -> Result<Vec<JobHandle>, EngineError> {
            Ok(self.submitted.lock().unwrap().iter().map(|(h, _)| *h).collect())
        }

        async fn load_code(&self, label: &str) -> Result<Code, EngineError> {
            self.code_loads.fetch_add(1, Ordering::SeqCst);
            self.codes.get(label).cloned().ok_or_else(|| EngineError::NotFound {
                kind: "code",
                label: label.to_string(),
            })
        }

        async fn load_group(&self, label: &str) -> Result<Vec<Structure>, EngineError> {
            if label == "commonwf-oxides/set1/structures" {
                Ok(self.group.clone())
            } else {
                Err(EngineError::NotFound {
                    kind: "group",
                    label: label.to_string(),
                })
            }
        }
    }

    fn oxide(element: &str, configuration: &str, a: f64, symbols: &[&str]) -> Structure {
        let sites = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| Site::new(*s, [0.2 * i as f64, 0.1, 0.0]))
            .collect();
        let mut s = Structure::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]], sites);
        s.extras
            .insert("element", element)
            .insert("configuration", configuration);
        s
    }

    fn campaign() -> Vec<Structure> {
        vec![
            oxide("H", "X2O", 3.0, &["H", "H", "O"]),
            oxide("Li", "XO", 4.0, &["Li", "O"]),
            oxide("H", "XO3", 5.0, &["H", "O", "O", "O"]),
            oxide("H", "X2O7", 6.0, &["H", "H", "O", "O", "O", "O", "O", "O", "O"]),
            Structure::new([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]], vec![]),
            oxide("H", "XO", 3.5, &["H", "O"]),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn submits_selected_structures_in_order() {
        let engine = Memory::new(campaign(), 0);
        let cfg = DriverConfig::default();

        let summary = run(&engine, &cfg).await.unwrap();

        let keys: Vec<&str> = summary.submitted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["H-X2O", "H-XO3", "H-XO"]);
        assert_eq!(summary.filtered, 2);
        assert_eq!(summary.unlabelled, 1);
        assert_eq!(summary.completed, 0);
        assert_eq!(engine.code_loads.load(Ordering::SeqCst), 5);

        let workflows = engine.workflows();
        assert_eq!(workflows.len(), 3);
        for wf in &workflows {
            assert_eq!(wf.codes.init_lapw.label, "wien2k-init_lapw@localhost");
            assert_eq!(wf.init_params, cfg.init_params);
            assert_eq!(wf.scf_params, cfg.scf_params);
            assert_eq!(wf.dvolumes, cfg.dvolumes);
            assert_eq!(wf.resources, cfg.resources);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rescales_only_listed_formulas() {
        let engine = Memory::new(campaign(), 0);
        run(&engine, &DriverConfig::default()).await.unwrap();

        let workflows = engine.workflows();
        // H-XO3 starts at 125 Å³ and is scaled to 20.
        assert!((workflows[1].structure.volume() - 20.0).abs() < 1e-9);
        assert_eq!(workflows[1].structure.extras.get("configuration"), Some("XO3"));
        assert!((workflows[0].structure.volume() - 27.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_formulas_are_skipped() {
        let engine = Memory::new(campaign(), 0);
        let cfg = DriverConfig {
            completed_formulas: vec!["H2O".into(), "HO".into()],
            ..Default::default()
        };

        let summary = run(&engine, &cfg).await.unwrap();
        assert_eq!(summary.completed, 2);
        let keys: Vec<&str> = summary.submitted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["H-XO3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttles_after_each_submission() {
        // Each workflow stays active for its first status check.
        let engine = Memory::new(campaign(), 1);
        let cfg = DriverConfig {
            ceiling: 1,
            ..Default::default()
        };

        let start = Instant::now();
        let summary = run(&engine, &cfg).await.unwrap();
        assert_eq!(summary.submitted.len(), 3);

        // Per submission: 15 s initial delay, one blocked poll, then 30 s.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3 * (15 + 30)), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3 * (15 + 60)), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn codes_are_not_loaded_when_nothing_is_selected() {
        let engine = Memory::new(campaign(), 0);
        let cfg = DriverConfig {
            elements: vec!["Kr".into()],
            ..Default::default()
        };

        let summary = run(&engine, &cfg).await.unwrap();
        assert!(summary.submitted.is_empty());
        assert_eq!(engine.code_loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_code_or_group_aborts() {
        let engine = Memory::new(campaign(), 0);
        let mut cfg = DriverConfig::default();
        cfg.codes.optimize = "wien2k-x-optimize@cluster".into();
        let err = run(&engine, &cfg).await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Engine(EngineError::NotFound { kind: "code", .. })
        ));
        assert!(engine.workflows().is_empty());

        let cfg = DriverConfig {
            group: "other".into(),
            ..Default::default()
        };
        assert!(matches!(
            run(&engine, &cfg).await,
            Err(DriverError::Engine(EngineError::NotFound { kind: "group", .. }))
        ));
    }
}
