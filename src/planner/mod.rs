//! # Planner Module
//!
//! Modulo che separa le responsabilità del planning in sottomoduli:
//! - `export_planner`: Orchestratore principale per le modalità di export
//! - `batch`: Planning concorrente dei batch
//! - `range_validator`: Validazione centralizzata dei range temporali

pub mod export_planner;
pub mod batch;
pub mod range_validator;

pub use export_planner::{ExportJob, ExportMode, ExportPlanner, ExportRequest, SourceClip};
pub use batch::BatchPlanner;
pub use range_validator::RangeValidator;
