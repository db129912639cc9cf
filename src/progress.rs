//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche del planning.
//!
//! ## Responsabilità:
//! - Progress bar visuale con `indicatif` durante probe e planning dei batch
//! - Tracking statistiche dei job pianificati (adattati, irraggiungibili)
//! - Report finale con dimensione totale stimata
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce la progress bar principale
//! - `PlanStats`: Traccia statistiche cumulative
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:03] [========================================] 12/12 (100%) planned clip_12.mp4
//! ```
//!
//! ## Esempio:
//! ```rust,ignore
//! let progress = ProgressManager::new(total_files);
//! let mut stats = PlanStats::new();
//!
//! for job in &jobs {
//!     stats.add_job(job);
//! }
//! progress.finish(&stats.format_summary());
//! ```

use crate::file_manager::FileManager;
use crate::planner::ExportJob;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for probing and planning
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A bar that draws nothing, for JSON mode
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for a planning run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlanStats {
    pub jobs_planned: usize,
    /// Jobs where at least one tier changed the parameters
    pub jobs_adjusted: usize,
    pub jobs_unreachable: usize,
    pub total_estimated_bytes: u64,
}

impl PlanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job(&mut self, job: &ExportJob) {
        self.jobs_planned += 1;
        if job.was_adjusted() {
            self.jobs_adjusted += 1;
        }
        if job.target_unreachable() {
            self.jobs_unreachable += 1;
        }
        self.total_estimated_bytes += job.estimate_bytes;
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Planned: {} jobs | Adjusted: {} | Target unreachable: {} | Total estimated: {}",
            self.jobs_planned,
            self.jobs_adjusted,
            self.jobs_unreachable,
            FileManager::format_size(self.total_estimated_bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_adjust::{AdjustStatus, TierLevel};
    use crate::params::ExportParameters;

    fn job(estimate: u64, tiers: Vec<TierLevel>, status: AdjustStatus) -> ExportJob {
        ExportJob {
            source: "clip.mp4".to_string(),
            params: ExportParameters::default(),
            time_ranges: Vec::new(),
            estimate_bytes: estimate,
            tiers_applied: tiers,
            passes: 1,
            status,
        }
    }

    #[test]
    fn test_stats_accumulate() {
        let mut stats = PlanStats::new();
        stats.add_job(&job(1024, vec![], AdjustStatus::Unconstrained));
        stats.add_job(&job(2048, vec![TierLevel::Moderate], AdjustStatus::WithinTarget));
        stats.add_job(&job(1024, vec![TierLevel::Severe], AdjustStatus::TargetUnreachable));

        assert_eq!(stats.jobs_planned, 3);
        assert_eq!(stats.jobs_adjusted, 2);
        assert_eq!(stats.jobs_unreachable, 1);
        assert_eq!(stats.total_estimated_bytes, 4096);
        assert!(stats.format_summary().contains("Total estimated: 4.00 KB"));
    }

    #[test]
    fn test_hidden_progress_counts() {
        let progress = ProgressManager::hidden();
        progress.update("one");
        progress.update("two");
        assert_eq!(progress.position(), 2);
        progress.finish("done");
    }
}
