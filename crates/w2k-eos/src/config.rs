//! Driver configuration.
//!
//! Compiled-in defaults reproduce the oxides set-1 campaign; a JSON file named
//! by `W2K_EOS_CONFIG` may override any field.
use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use w2k_core::Throttle;
use w2k_model::{Parameters, Resources};
use w2k_observe::LoggerConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "W2K_EOS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Labels of the codes handed to each workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeLabels {
    pub sgroup: String,
    pub init_lapw: String,
    pub run_lapw: String,
    pub optimize: String,
    pub run_lapw_clmextrapol: String,
}

impl Default for CodeLabels {
    fn default() -> Self {
        Self {
            sgroup: "wien2k-x-sgroup@localhost".into(),
            init_lapw: "wien2k-init_lapw@localhost".into(),
            run_lapw: "wien2k-run_lapw@localhost".into(),
            optimize: "wien2k-x-optimize@localhost".into(),
            run_lapw_clmextrapol: "wien2k-run_lapw_clmextrapol@localhost".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Group holding the input structures.
    pub group: String,
    /// Chemical elements to process.
    pub elements: Vec<String>,
    /// Oxide configurations to process.
    pub configurations: Vec<String>,
    /// Target volumes (Å³) keyed by `<element>-<configuration>`.
    pub scale_volumes: BTreeMap<String, f64>,
    /// Hill formulas already done; never appended to by the driver.
    pub completed_formulas: Vec<String>,

    pub codes: CodeLabels,
    /// `x sgroup` options.
    pub sgroup_params: Parameters,
    /// `init_lapw -b` options.
    pub init_params: Parameters,
    /// `run_lapw` options.
    pub scf_params: Parameters,
    /// Volume changes in percent, 0 excluded.
    pub dvolumes: Vec<f64>,
    pub resources: Resources,

    /// Maximum number of created or waiting workflows.
    pub ceiling: usize,
    pub poll_interval_secs: u64,
    pub initial_delay_secs: u64,

    /// Spool directory of the local engine.
    pub engine_root: PathBuf,
    pub logger: LoggerConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            group: "commonwf-oxides/set1/structures".into(),
            elements: vec!["H".into()],
            configurations: ["X2O", "XO", "X2O3", "X2O5", "XO2", "XO3"]
                .into_iter()
                .map(String::from)
                .collect(),
            scale_volumes: BTreeMap::from([("H-XO3".to_string(), 20.0)]),
            completed_formulas: Vec::new(),
            codes: CodeLabels::default(),
            sgroup_params: Parameters::new(),
            init_params: Parameters::new()
                .with("-red", "3")
                .with("-prec", "2")
                .with("-hdlo", true),
            scf_params: Parameters::new()
                .with("-i", "100")
                .with("-ec", "0.000001")
                .with("-cc", "0.0001"),
            dvolumes: vec![-6.0, -4.0, -2.0, 2.0, 4.0, 6.0],
            resources: Resources::new(1, 1).with_cores_per_mpiproc(1),
            ceiling: 8,
            poll_interval_secs: 30,
            initial_delay_secs: 15,
            engine_root: PathBuf::from("w2k-spool"),
            logger: LoggerConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Read the file named by [`CONFIG_ENV`], or use the defaults when it is unset.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Streaming keeps the order of parameter keys.
        let cfg: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ceiling == 0 {
            return Err(ConfigError::Invalid("ceiling must be at least 1".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("poll_interval_secs must be positive".into()));
        }
        if let Some((key, v)) = self
            .scale_volumes
            .iter()
            .find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(ConfigError::Invalid(format!("scale volume of {key}: {v}")));
        }
        self.resources
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn throttle(&self) -> Throttle {
        Throttle::new(self.ceiling, Duration::from_secs(self.poll_interval_secs))
            .with_initial_delay(Duration::from_secs(self.initial_delay_secs))
    }
}
