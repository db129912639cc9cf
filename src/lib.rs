//! # GIF Export Planner Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `params`: Modello dati `ExportParameters` e metadati del clip
//! - `presets`: Catalogo dei preset di qualità
//! - `estimator`: Stima euristica della dimensione del GIF
//! - `auto_adjust`: Riduzione a tier dei parametri fino al target
//! - `planner`: Orchestratore delle modalità di export
//! - `probe`: Lettura metadati con ffprobe
//! - `transcoder`: Consegna dei job all'encoder
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `file_manager`: Discovery dei video di input
//! - `progress`: Progress tracking e statistiche
//! - `json_output`: Eventi JSON per integrazione con altri processi
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use gif_export_planner::{ExportMode, ExportPlanner, ExportRequest, PresetCatalog, SourceClip};
//!
//! let request = ExportRequest {
//!     mode: ExportMode::Full,
//!     sources: vec![SourceClip::new("clip.mp4", clip)],
//!     template: PresetCatalog::resolve("Medium")?,
//! };
//! let jobs = ExportPlanner::default().plan(&request)?;
//! ```

pub mod auto_adjust;
pub mod config;
pub mod error;
pub mod estimator;
pub mod file_manager;
pub mod json_output;
pub mod params;
pub mod planner;
pub mod platform;
pub mod presets;
pub mod probe;
pub mod progress;
pub mod transcoder;

pub use auto_adjust::{AdjustStatus, AutoAdjuster, TierLevel};
pub use config::Config;
pub use error::{PlanError, PlanResult};
pub use estimator::{EstimatorCalibration, SizeEstimator, SizeModel};
pub use params::{ClipMetadata, ExportParameters, TimeRange};
pub use planner::{BatchPlanner, ExportJob, ExportMode, ExportPlanner, ExportRequest, SourceClip};
pub use presets::{PinnedFields, Preset, PresetCatalog};
pub use probe::{FfprobeProbe, MediaProbe};
pub use transcoder::{hand_off, Transcoder};
