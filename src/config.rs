//! Layered configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`BOLSAS_*`, `__` separates nested sections,
//!    e.g. `BOLSAS_METRICS__ALURA_ACCESS_THRESHOLD=75`)
//! 2. `bolsas.toml` in the working directory
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::metrics::MetricsConfig;

pub const CONFIG_FILE: &str = "bolsas.toml";
pub const ENV_PREFIX: &str = "BOLSAS_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

fn default_data_path() -> Option<PathBuf> {
    Some(PathBuf::from("results.xlsx"))
}

fn default_title() -> String {
    "Central de bolsas acadêmicas".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    /// Dataset opened at startup, if the file exists.
    #[serde(default = "default_data_path")]
    pub data_path: Option<PathBuf>,

    /// Image shown at the top of the filter sidebar.
    #[serde(default)]
    pub logo_path: Option<PathBuf>,

    /// Window and page heading.
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            logo_path: None,
            title: default_title(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract::<Self>()?.validated()
    }

    /// Build the provider chain. `Path::new(CONFIG_FILE)` is relative to the
    /// current directory.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let threshold = self.metrics.alura_access_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                field: "metrics.alura_access_threshold".into(),
                reason: format!("{threshold} is not a percentage between 0 and 100"),
            });
        }
        Ok(self)
    }
}
