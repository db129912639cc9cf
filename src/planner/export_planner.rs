//! # Export Planner Orchestrator
//!
//! Orchestratore principale che trasforma una richiesta di export
//! (modalità + clip sorgenti + template) in una lista di job finalizzati.
//! Delega la validazione dei range a `RangeValidator` e la convergenza
//! sul target di dimensione ad `AutoAdjuster`.

use crate::{
    auto_adjust::{AdjustStatus, AutoAdjuster, TierLevel},
    error::{PlanError, PlanResult},
    estimator::{SizeEstimator, SizeModel},
    file_manager::FileManager,
    params::{ClipMetadata, ExportParameters, TimeRange},
    planner::range_validator::RangeValidator,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Modalità di export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// Video intero → un GIF
    Full,
    /// Un segmento → un GIF
    SingleSegment,
    /// Più segmenti dello stesso video → un GIF unito
    MergedSegments,
    /// Più video → un GIF per video
    Batch,
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportMode::Full => write!(f, "full"),
            ExportMode::SingleSegment => write!(f, "segment"),
            ExportMode::MergedSegments => write!(f, "merged"),
            ExportMode::Batch => write!(f, "batch"),
        }
    }
}

impl FromStr for ExportMode {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "full" | "full-video" => Ok(ExportMode::Full),
            "segment" | "single" | "single-segment" => Ok(ExportMode::SingleSegment),
            "merged" | "merge" | "merged-segments" => Ok(ExportMode::MergedSegments),
            "batch" => Ok(ExportMode::Batch),
            other => Err(PlanError::InvalidParameters(format!("unknown export mode '{}'", other))),
        }
    }
}

/// A probed input clip and the ranges selected on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceClip {
    pub name: String,
    pub metadata: ClipMetadata,
    #[serde(default)]
    pub ranges: Vec<TimeRange>,
}

impl SourceClip {
    pub fn new(name: impl Into<String>, metadata: ClipMetadata) -> Self {
        Self {
            name: name.into(),
            metadata,
            ranges: Vec::new(),
        }
    }

    pub fn with_ranges(mut self, ranges: Vec<TimeRange>) -> Self {
        self.ranges = ranges;
        self
    }
}

/// Everything the planner needs for one export action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub mode: ExportMode,
    pub sources: Vec<SourceClip>,
    pub template: ExportParameters,
}

/// A finalized job ready for the transcoder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportJob {
    pub source: String,
    pub params: ExportParameters,
    pub time_ranges: Vec<TimeRange>,
    pub estimate_bytes: u64,
    pub tiers_applied: Vec<TierLevel>,
    pub passes: u32,
    pub status: AdjustStatus,
}

impl ExportJob {
    /// True when the caller should warn before exporting an oversized file
    pub fn target_unreachable(&self) -> bool {
        self.status == AdjustStatus::TargetUnreachable
    }

    pub fn was_adjusted(&self) -> bool {
        !self.tiers_applied.is_empty()
    }
}

/// Orchestratore del planning per tutte le modalità di export
#[derive(Debug, Clone)]
pub struct ExportPlanner<M = SizeEstimator> {
    adjuster: AutoAdjuster<M>,
}

impl Default for ExportPlanner<SizeEstimator> {
    fn default() -> Self {
        Self::new(SizeEstimator::default())
    }
}

impl<M: SizeModel> ExportPlanner<M> {
    pub fn new(model: M) -> Self {
        Self {
            adjuster: AutoAdjuster::new(model),
        }
    }

    /// Produce i job ordinati per la richiesta
    pub fn plan(&self, request: &ExportRequest) -> PlanResult<Vec<ExportJob>> {
        request.template.validate()?;
        debug!("Planning {} export for {} source(s)", request.mode, request.sources.len());

        match request.mode {
            ExportMode::Full => {
                let source = Self::single_source(request)?;
                let ranges = RangeValidator::full_clip(&source.metadata);
                Ok(vec![self.plan_job(source, &request.template, ranges)?])
            }
            ExportMode::SingleSegment => {
                let source = Self::single_source(request)?;
                let ranges = Self::selected_ranges(source, &request.template);
                if ranges.len() != 1 {
                    return Err(PlanError::InvalidTimeRange(format!(
                        "single-segment export needs exactly one range, got {}",
                        ranges.len()
                    )));
                }
                Ok(vec![self.plan_job(source, &request.template, ranges.to_vec())?])
            }
            ExportMode::MergedSegments => {
                let source = Self::single_source(request)?;
                let ranges = Self::selected_ranges(source, &request.template);
                if ranges.is_empty() {
                    return Err(PlanError::InvalidTimeRange(
                        "merged export needs at least one range".to_string(),
                    ));
                }
                Ok(vec![self.plan_job(source, &request.template, ranges.to_vec())?])
            }
            ExportMode::Batch => {
                if request.sources.is_empty() {
                    return Err(PlanError::InvalidParameters(
                        "batch export needs at least one source".to_string(),
                    ));
                }
                request
                    .sources
                    .iter()
                    .map(|source| self.plan_batch_item(source, &request.template))
                    .collect()
            }
        }
    }

    /// Pianifica un singolo file di un batch (clip intera se non ci sono range)
    pub fn plan_batch_item(&self, source: &SourceClip, template: &ExportParameters) -> PlanResult<ExportJob> {
        let ranges = Self::selected_ranges(source, template);
        let ranges = if ranges.is_empty() {
            RangeValidator::full_clip(&source.metadata)
        } else {
            ranges.to_vec()
        };
        self.plan_job(source, template, ranges)
    }

    /// Risolve e adatta i parametri di un job
    fn plan_job(
        &self,
        source: &SourceClip,
        template: &ExportParameters,
        ranges: Vec<TimeRange>,
    ) -> PlanResult<ExportJob> {
        source.metadata.validate()?;
        RangeValidator::validate(&ranges, &source.metadata)?;

        let mut params = template.clone();
        params.time_ranges = ranges.clone();
        params.validate()?;

        let result = self.adjuster.converge(&params, &source.metadata);

        match result.status {
            AdjustStatus::TargetUnreachable => warn!(
                "⚠️ {}: target {} not reachable, best effort {} (tiers {:?})",
                source.name,
                FileManager::format_size(params.target_size_bytes.unwrap_or_default()),
                FileManager::format_size(result.estimate_bytes),
                result.tiers_applied
            ),
            _ => info!(
                "{}: {:.1}s @ {}fps, ~{} ({:?})",
                source.name,
                RangeValidator::total_duration(&ranges),
                result.params.fps,
                FileManager::format_size(result.estimate_bytes),
                result.status
            ),
        }

        Ok(ExportJob {
            source: source.name.clone(),
            params: result.params,
            time_ranges: ranges,
            estimate_bytes: result.estimate_bytes,
            tiers_applied: result.tiers_applied,
            passes: result.passes,
            status: result.status,
        })
    }

    fn single_source(request: &ExportRequest) -> PlanResult<&SourceClip> {
        match request.sources.as_slice() {
            [source] => Ok(source),
            sources => Err(PlanError::InvalidParameters(format!(
                "{} export needs exactly one source, got {}",
                request.mode,
                sources.len()
            ))),
        }
    }

    /// Range del sorgente, altrimenti quelli pinned nel template
    fn selected_ranges<'a>(source: &'a SourceClip, template: &'a ExportParameters) -> &'a [TimeRange] {
        if source.ranges.is_empty() {
            &template.time_ranges
        } else {
            &source.ranges
        }
    }
}
