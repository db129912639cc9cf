//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione persistente del planner.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i default della CLI
//! - Fornisce validazione dei parametri (preset esistente, worker > 0, calibrazione)
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Risolve il path di default `<config_dir>/gif-planner/config.json`
//!
//! ## Parametri di configurazione:
//! - `preset`: Preset di qualità di default (default: "Medium")
//! - `workers`: Numero di worker per il planning batch (default: 4)
//! - `json_output`: Output JSON invece dei log (default: false)
//! - `calibration`: Costanti dello stimatore (`EstimatorCalibration`)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     preset: "Small".to_string(),
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::estimator::EstimatorCalibration;
use crate::presets::Preset;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the planner CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preset used when `--preset` is not given
    pub preset: String,
    /// Number of parallel workers for batch planning
    pub workers: usize,
    /// Output progress and jobs as JSON for programmatic use
    pub json_output: bool,
    pub calibration: EstimatorCalibration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preset: Preset::Medium.to_string(),
            workers: 4,
            json_output: false,
            calibration: EstimatorCalibration::default(),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.preset.parse::<Preset>()?;

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        self.calibration.validate()?;
        Ok(())
    }

    /// `<config_dir>/gif-planner/config.json`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gif-planner").join("config.json"))
    }

    /// Load configuration from file; a missing file yields the defaults
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
