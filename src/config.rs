use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::dataset::{LabelRule, SyntheticSeed};
use crate::error::ConfigError;
use crate::features::ContextDefaults;
use crate::forest::ForestParams;

pub const CONFIG_PATH_VAR: &str = "POOL_ADVISOR_CONFIG";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Directory holding the model and scaler artifacts.
    pub model_dir: PathBuf,
    pub n_trees: usize,
    pub forest_seed: u64,
    pub seed_rows: usize,
    pub seed_rng: Option<u64>,
    pub label_rule: LabelRule,
    pub estimate_traffic: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            model_dir: PathBuf::from("."),
            n_trees: 100,
            forest_seed: 42,
            seed_rows: 1000,
            seed_rng: None,
            label_rule: LabelRule::default(),
            estimate_traffic: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Defaults, then the JSON file named by `POOL_ADVISOR_CONFIG`, then
    /// `BIND_ADDR` / `PORT` / `MODEL_DIR`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(cfg)
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(addr) = get("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(port) = get("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::Env { var: "PORT", value: port })?;
        }
        if let Some(dir) = get("MODEL_DIR") {
            self.model_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            seed: self.forest_seed,
        }
    }

    pub fn seed(&self) -> SyntheticSeed {
        SyntheticSeed {
            rows: self.seed_rows,
            rng_seed: self.seed_rng,
        }
    }

    pub fn context_defaults(&self) -> ContextDefaults {
        ContextDefaults {
            estimate_traffic: self.estimate_traffic,
        }
    }
}
