//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'integrazione con altri processi.
//!
//! ## Responsabilità:
//! - Emette un messaggio JSON per riga su stdout
//! - Riutilizza `ExportJob` e `PlanStats` come payload
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del planning (modalità, preset, numero di sorgenti)
//! - `job`: Un job finalizzato, pronto per il transcoder
//! - `complete`: Fine del planning con statistiche finali
//! - `error`: Errore durante il probe o il planning

use crate::planner::{ExportJob, ExportMode};
use crate::progress::PlanStats;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del planning
    Start {
        mode: ExportMode,
        preset: String,
        total_sources: usize,
        workers: usize,
    },

    /// Job finalizzato
    Job {
        index: usize,
        total: usize,
        output: PathBuf,
        job: ExportJob,
    },

    /// Planning completato
    Complete {
        jobs_planned: usize,
        jobs_adjusted: usize,
        jobs_unreachable: usize,
        total_estimated_bytes: u64,
        duration_seconds: f64,
    },

    /// Errore generale
    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(mode: ExportMode, preset: impl Into<String>, total_sources: usize, workers: usize) -> Self {
        Self::Start {
            mode,
            preset: preset.into(),
            total_sources,
            workers,
        }
    }

    pub fn job(index: usize, total: usize, output: PathBuf, job: ExportJob) -> Self {
        Self::Job { index, total, output, job }
    }

    /// Crea un messaggio di completamento dalle statistiche
    pub fn complete(stats: &PlanStats, duration_seconds: f64) -> Self {
        Self::Complete {
            jobs_planned: stats.jobs_planned,
            jobs_adjusted: stats.jobs_adjusted,
            jobs_unreachable: stats.jobs_unreachable,
            total_estimated_bytes: stats.total_estimated_bytes,
            duration_seconds,
        }
    }

    pub fn error(message: impl Into<String>, details: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_adjust::{AdjustStatus, TierLevel};
    use crate::params::{ExportParameters, TimeRange};
    use serde_json::Value;

    #[test]
    fn test_start_message_shape() {
        let value = serde_json::to_value(JsonMessage::start(ExportMode::Batch, "Small", 3, 4)).unwrap();
        assert_eq!(value["type"], "start");
        assert_eq!(value["mode"], "batch");
        assert_eq!(value["preset"], "Small");
        assert_eq!(value["total_sources"], 3);
    }

    #[test]
    fn test_job_message_carries_parameters() {
        let job = ExportJob {
            source: "clip.mp4".to_string(),
            params: ExportParameters {
                width_px: Some(854),
                fps: 12,
                ..Default::default()
            },
            time_ranges: vec![TimeRange::new(0.0, 4.5)],
            estimate_bytes: 123_456,
            tiers_applied: vec![TierLevel::Heavy],
            passes: 2,
            status: AdjustStatus::WithinTarget,
        };

        let value = serde_json::to_value(JsonMessage::job(0, 1, PathBuf::from("clip.gif"), job)).unwrap();
        assert_eq!(value["type"], "job");
        assert_eq!(value["output"], "clip.gif");
        assert_eq!(value["job"]["params"]["width_px"], 854);
        assert_eq!(value["job"]["params"]["dithering"], "sierra2_4a");
        assert_eq!(value["job"]["tiers_applied"], Value::from(vec!["heavy"]));
        assert_eq!(value["job"]["status"], "within_target");
        assert_eq!(value["job"]["time_ranges"][0]["end"], 4.5);
    }

    #[test]
    fn test_complete_and_error_messages() {
        let stats = PlanStats {
            jobs_planned: 2,
            total_estimated_bytes: 10,
            ..Default::default()
        };
        let value = serde_json::to_value(JsonMessage::complete(&stats, 0.5)).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["jobs_planned"], 2);
        assert!(value.get("errors").is_none());

        let value = serde_json::to_value(JsonMessage::error("probe failed", Some("clip.mp4".into()))).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["details"], "clip.mp4");
    }
}
