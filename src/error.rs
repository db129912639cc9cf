//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom del planner.
//!
//! ## Responsabilità:
//! - Definisce `PlanError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `InvalidParameters`: Campo fuori range o malformato (es. fps = 0)
//! - `UnknownPreset`: Nome preset non presente nel catalogo
//! - `InvalidTimeRange`: Range sovrapposti, non ordinati o fuori durata clip
//! - `Probe`: Errore durante l'analisi del clip con ffprobe
//! - `MissingDependency`: Tool esterno mancante (ffprobe)
//! - `Io` / `Json`: Errori di I/O e parsing
//!
//! ## Nota:
//! Un target di dimensione irraggiungibile NON è un errore: viene riportato
//! come `AdjustStatus::TargetUnreachable` insieme ai parametri best-effort.
//!
//! ## Esempio:
//! ```rust,ignore
//! if params.fps == 0 {
//!     return Err(PlanError::InvalidParameters("fps must be at least 1".to_string()));
//! }
//! ```

/// Custom error types for GIF export planning
#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the planning engine
pub type PlanResult<T> = std::result::Result<T, PlanError>;
