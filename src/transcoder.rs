//! # Transcoder Hand-off Module
//!
//! Questo modulo consegna i job finalizzati a un encoder esterno.
//!
//! ## Responsabilità:
//! - Trait `Transcoder`: esegue un `ExportJob` e ritorna i byte prodotti;
//!   il filter graph (trim, scale, palette, lossy) è affare dell'implementazione
//! - `hand_off`: esegue i job in ordine e confronta stima e dimensione reale
//!
//! ## Esempio:
//! ```rust,ignore
//! let reports = hand_off(&my_transcoder, &jobs);
//! for report in &reports {
//!     println!("{}", report.summary());
//! }
//! ```

use crate::file_manager::FileManager;
use crate::planner::ExportJob;
use anyhow::Result;
use serde::Serialize;
use tracing::{error, info};

/// Anything able to encode a finalized job
pub trait Transcoder {
    /// Encode the job and return the produced GIF size in bytes
    fn transcode(&self, job: &ExportJob) -> Result<u64>;
}

/// Estimate vs. actual for one handed-off job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscodeReport {
    pub source: String,
    pub estimate_bytes: u64,
    pub actual_bytes: Option<u64>,
    pub target_bytes: Option<u64>,
    pub error: Option<String>,
}

impl TranscodeReport {
    pub fn succeeded(&self) -> bool {
        self.actual_bytes.is_some()
    }

    /// True when the real file ended up over the requested target
    pub fn exceeded_target(&self) -> bool {
        match (self.actual_bytes, self.target_bytes) {
            (Some(actual), Some(target)) => actual > target,
            _ => false,
        }
    }

    /// Actual size as a fraction of the estimate
    pub fn estimate_ratio(&self) -> Option<f64> {
        self.actual_bytes
            .filter(|_| self.estimate_bytes > 0)
            .map(|actual| actual as f64 / self.estimate_bytes as f64)
    }

    pub fn summary(&self) -> String {
        match (&self.actual_bytes, &self.error) {
            (Some(actual), _) => format!(
                "{}: {} (estimated {})",
                self.source,
                FileManager::format_size(*actual),
                FileManager::format_size(self.estimate_bytes)
            ),
            (None, Some(error)) => format!("{}: failed: {}", self.source, error),
            (None, None) => format!("{}: not run", self.source),
        }
    }
}

/// Run every job through `transcoder`; failures are reported, not propagated
pub fn hand_off<T: Transcoder + ?Sized>(transcoder: &T, jobs: &[ExportJob]) -> Vec<TranscodeReport> {
    jobs.iter()
        .map(|job| {
            let (actual_bytes, error) = match transcoder.transcode(job) {
                Ok(bytes) => {
                    info!(
                        "✅ {}: {} (estimated {})",
                        job.source,
                        FileManager::format_size(bytes),
                        FileManager::format_size(job.estimate_bytes)
                    );
                    (Some(bytes), None)
                }
                Err(e) => {
                    error!("❌ Failed to transcode {}: {}", job.source, e);
                    (None, Some(e.to_string()))
                }
            };

            TranscodeReport {
                source: job.source.clone(),
                estimate_bytes: job.estimate_bytes,
                actual_bytes,
                target_bytes: job.params.target_size_bytes,
                error,
            }
        })
        .collect()
}
