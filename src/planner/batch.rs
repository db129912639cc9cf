//! # Batch Planner
//!
//! Worker che pianifica i job di un batch in parallelo.
//! Ogni sorgente viene risolta su un task bloccante di tokio, con un
//! semaforo che limita il numero di worker attivi.

use crate::{
    estimator::{SizeEstimator, SizeModel},
    params::ExportParameters,
    planner::export_planner::{ExportJob, ExportPlanner, SourceClip},
    progress::ProgressManager,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Pianificatore concorrente per la modalità batch
pub struct BatchPlanner<M = SizeEstimator> {
    planner: Arc<ExportPlanner<M>>,
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl<M> BatchPlanner<M>
where
    M: SizeModel + Send + Sync + 'static,
{
    pub fn new(planner: Arc<ExportPlanner<M>>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            planner,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Pianifica un job per sorgente; l'ordine dei risultati segue l'input
    pub async fn plan_concurrent(
        &self,
        sources: Vec<SourceClip>,
        template: ExportParameters,
        progress: Option<ProgressManager>,
    ) -> Result<Vec<ExportJob>> {
        template.validate()?;
        if sources.is_empty() {
            return Err(anyhow::anyhow!("batch export needs at least one source"));
        }

        debug!("Planning {} sources with {} workers", sources.len(), self.workers);
        let template = Arc::new(template);
        let mut tasks = Vec::with_capacity(sources.len());

        for source in sources {
            let permit = self.semaphore.clone().acquire_owned().await?;
            let planner = Arc::clone(&self.planner);
            let template = Arc::clone(&template);
            let progress = progress.clone();

            tasks.push(tokio::task::spawn_blocking(move || {
                let _permit = permit; // rilasciato a fine task
                let result = planner.plan_batch_item(&source, &template);
                if let Some(progress) = &progress {
                    progress.update(&format!("planned {}", source.name));
                }
                result
            }));
        }

        let mut jobs = Vec::with_capacity(tasks.len());
        for result in futures::future::join_all(tasks).await {
            jobs.push(result??);
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ClipMetadata, TimeRange, MIB};
    use crate::planner::export_planner::{ExportMode, ExportRequest};
    use crate::presets::Preset;

    fn planner() -> ExportPlanner {
        ExportPlanner::default()
    }

    fn sources() -> Vec<SourceClip> {
        (1..=12)
            .map(|i| {
                let metadata = ClipMetadata {
                    duration_seconds: f64::from(i) * 7.5,
                    native_width: 480 * (1 + i % 4),
                    native_height: 270 * (1 + i % 4),
                    native_fps: 30.0,
                };
                let source = SourceClip::new(format!("clip_{:02}.mp4", i), metadata);
                if i % 3 == 0 {
                    source.with_ranges(vec![TimeRange::new(1.0, 4.0)])
                } else {
                    source
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let template = ExportParameters {
            target_size_bytes: Some(3 * MIB),
            ..Preset::Large.template()
        };
        let planner = Arc::new(planner());

        let sequential = planner
            .plan(&ExportRequest {
                mode: ExportMode::Batch,
                sources: sources(),
                template: template.clone(),
            })
            .unwrap();

        let batch = BatchPlanner::new(Arc::clone(&planner), 4);
        let concurrent = batch.plan_concurrent(sources(), template, None).await.unwrap();

        assert_eq!(concurrent, sequential);
        assert_eq!(concurrent[2].time_ranges, vec![TimeRange::new(1.0, 4.0)]);
    }

    #[tokio::test]
    async fn test_single_worker_preserves_order() {
        let batch = BatchPlanner::new(Arc::new(planner()), 0);
        assert_eq!(batch.workers(), 1);

        let jobs = batch
            .plan_concurrent(sources(), Preset::Small.template(), None)
            .await
            .unwrap();
        let names: Vec<_> = jobs.iter().map(|job| job.source.clone()).collect();
        let expected: Vec<_> = sources().into_iter().map(|source| source.name).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_progress_advances_per_source() {
        let progress = ProgressManager::hidden();
        let batch = BatchPlanner::new(Arc::new(planner()), 3);

        let jobs = batch
            .plan_concurrent(sources(), Preset::Small.template(), Some(progress.clone()))
            .await
            .unwrap();
        assert_eq!(progress.position(), jobs.len() as u64);
        assert_eq!(progress.position(), 12);
    }

    #[tokio::test]
    async fn test_invalid_source_fails_batch() {
        let mut inputs = sources();
        inputs[5].ranges = vec![TimeRange::new(0.0, 500.0)];

        let batch = BatchPlanner::new(Arc::new(planner()), 3);
        assert!(batch
            .plan_concurrent(inputs, Preset::Medium.template(), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let batch = BatchPlanner::new(Arc::new(planner()), 2);
        assert!(batch
            .plan_concurrent(Vec::new(), Preset::Medium.template(), None)
            .await
            .is_err());
    }
}
