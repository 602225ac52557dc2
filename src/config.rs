//! TOML configuration: where the solver, the model and the data file live.

use std::{path::{Path, PathBuf}, time::Duration};

use anyhow::Context;
use serde::{Serialize, Deserialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "minpol.toml";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_model")]
    pub model: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Data file written by `convert`/`build` and read by `solve`.
    #[serde(default = "default_data")]
    pub data: PathBuf,
    /// Directory holding the plain-text instances.
    #[serde(default = "default_instances")]
    pub instances: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data: default_data(),
            instances: default_instances(),
        }
    }
}

fn default_program() -> String {
    "minizinc".into()
}
fn default_model() -> PathBuf {
    "Proyecto.mzn".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_data() -> PathBuf {
    "DatosProyecto.dzn".into()
}
fn default_instances() -> PathBuf {
    "Mis Instancias".into()
}

impl Config {
    /// Loads `path` if given, otherwise `minpol.toml` when it exists,
    /// otherwise falls back to the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    log::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration '{}'", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("invalid configuration '{}'", path.display()))?;
        log::debug!("configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Looks a relative path up in the instances directory when it does not
    /// exist as given. A path found in neither place is returned as typed.
    pub fn instance_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        let candidate = self.paths.instances.join(path);
        if candidate.exists() {
            candidate
        } else {
            path.to_path_buf()
        }
    }
}
