//! # Auto Adjust Module
//!
//! Questo modulo implementa il controller che degrada i parametri finché la
//! stima rientra nel target di dimensione.
//!
//! ## Responsabilità:
//! - Tabella statica e ordinata dei tier di riduzione (`ADJUSTMENT_TIERS`)
//! - Selezione pura del tier in base all'overage ratio
//! - Applicazione di un tier UNA volta per chiamata (`adjust`)
//! - Loop limitato di convergenza (`converge`, max 4 passate)
//!
//! ## Tabella dei tier (valutata dal più severo):
//! | overage_ratio | override                                          |
//! |---------------|---------------------------------------------------|
//! | ≥ 0.70        | width 640, fps 10, palette 128, lossy ≥ 60        |
//! | [0.50, 0.70)  | width 854, fps 12, palette 256, lossy ≥ 35        |
//! | [0.30, 0.50)  | width 1280, fps 15, lossy ≥ 15                    |
//! | (0, 0.30)     | lossy ≥ 5                                         |
//!
//! ## Regole di override:
//! - Width/fps/palette vengono solo abbassati, mai alzati oltre il valore utente
//! - Lossy viene solo alzato
//! - Riapplicare lo stesso tier non cambia nulla (punto fisso)
//!
//! ## Esito:
//! Un target irraggiungibile viene riportato come `AdjustStatus::TargetUnreachable`
//! con i parametri best-effort, non come errore.
//!
//! ## Esempio:
//! ```rust,ignore
//! let adjuster = AutoAdjuster::default();
//! let outcome = adjuster.converge(&params, &clip);
//! if outcome.status == AdjustStatus::TargetUnreachable {
//!     warn!("target not reachable");
//! }
//! ```

use crate::estimator::{SizeEstimator, SizeModel};
use crate::params::{ClipMetadata, ExportParameters};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on `adjust` calls made by `converge`
pub const MAX_ADJUST_PASSES: u32 = 4;

/// Severity of a reduction tier, least severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierLevel {
    None,
    Minimal,
    Moderate,
    Heavy,
    Severe,
}

/// One row of the reduction policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentTier {
    pub level: TierLevel,
    /// Inclusive lower bound on the overage ratio
    pub min_overage: f64,
    pub width_px: Option<u32>,
    pub fps: Option<u32>,
    pub palette_size: Option<u16>,
    pub min_lossy_level: u8,
}

/// Reduction policy, most severe first; first match wins
pub const ADJUSTMENT_TIERS: [AdjustmentTier; 4] = [
    AdjustmentTier {
        level: TierLevel::Severe,
        min_overage: 0.70,
        width_px: Some(640),
        fps: Some(10),
        palette_size: Some(128),
        min_lossy_level: 60,
    },
    AdjustmentTier {
        level: TierLevel::Heavy,
        min_overage: 0.50,
        width_px: Some(854),
        fps: Some(12),
        palette_size: Some(256),
        min_lossy_level: 35,
    },
    AdjustmentTier {
        level: TierLevel::Moderate,
        min_overage: 0.30,
        width_px: Some(1280),
        fps: Some(15),
        palette_size: None,
        min_lossy_level: 15,
    },
    AdjustmentTier {
        level: TierLevel::Minimal,
        min_overage: 0.0,
        width_px: None,
        fps: None,
        palette_size: None,
        min_lossy_level: 5,
    },
];

/// Fractional amount by which `estimate` exceeds `target`
pub fn overage_ratio(estimate: u64, target: u64) -> f64 {
    (estimate as f64 - target as f64) / target as f64
}

/// Pick the tier for an overage ratio; `None` when nothing is over
pub fn select_tier(overage_ratio: f64) -> Option<&'static AdjustmentTier> {
    if overage_ratio.is_nan() || overage_ratio <= 0.0 {
        return None;
    }
    ADJUSTMENT_TIERS.iter().find(|tier| overage_ratio >= tier.min_overage)
}

impl AdjustmentTier {
    /// Move `params` toward this tier, never past a more conservative user value
    pub fn apply(&self, params: &ExportParameters, clip: &ClipMetadata) -> ExportParameters {
        let mut adjusted = params.clone();

        if let Some(width) = self.width_px {
            // An absent width means source width; only materialise it when it shrinks
            if width < params.effective_width(clip) {
                adjusted.width_px = Some(width);
            }
        }
        if let Some(fps) = self.fps {
            adjusted.fps = adjusted.fps.min(fps);
        }
        if let Some(palette_size) = self.palette_size {
            adjusted.palette_size = adjusted.palette_size.min(palette_size);
        }
        adjusted.lossy_level = adjusted.lossy_level.max(self.min_lossy_level);

        adjusted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustStatus {
    /// No target size was set
    Unconstrained,
    WithinTarget,
    /// Still over target; another pass may help
    OverTarget,
    /// Quality floor reached while still over target
    TargetUnreachable,
}

/// Result of a single `adjust` call
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustOutcome {
    pub params: ExportParameters,
    pub estimate_bytes: u64,
    pub tier: TierLevel,
    pub status: AdjustStatus,
}

/// Result of the bounded convergence loop
#[derive(Debug, Clone, PartialEq)]
pub struct Convergence {
    pub params: ExportParameters,
    pub estimate_bytes: u64,
    /// Tiers that actually changed something, in order
    pub tiers_applied: Vec<TierLevel>,
    pub passes: u32,
    pub status: AdjustStatus,
}

/// Controller fitting parameters under a target size
#[derive(Debug, Clone)]
pub struct AutoAdjuster<M = SizeEstimator> {
    model: M,
}

impl Default for AutoAdjuster<SizeEstimator> {
    fn default() -> Self {
        Self::new(SizeEstimator::default())
    }
}

impl<M: SizeModel> AutoAdjuster<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Apply at most one tier and re-estimate
    pub fn adjust(&self, params: &ExportParameters, clip: &ClipMetadata) -> AdjustOutcome {
        let estimate = self.model.estimate(params, clip);

        let Some(target) = params.target_size_bytes else {
            return AdjustOutcome {
                params: params.clone(),
                estimate_bytes: estimate,
                tier: TierLevel::None,
                status: AdjustStatus::Unconstrained,
            };
        };

        let ratio = overage_ratio(estimate, target);
        let Some(tier) = select_tier(ratio) else {
            return AdjustOutcome {
                params: params.clone(),
                estimate_bytes: estimate,
                tier: TierLevel::None,
                status: AdjustStatus::WithinTarget,
            };
        };

        let adjusted = tier.apply(params, clip);
        let new_estimate = self.model.estimate(&adjusted, clip);

        debug!(
            "Overage {:.3} -> tier {:?}: {} -> {} bytes (target {})",
            ratio, tier.level, estimate, new_estimate, target
        );

        let status = if new_estimate <= target {
            AdjustStatus::WithinTarget
        } else if adjusted == *params {
            AdjustStatus::TargetUnreachable
        } else {
            AdjustStatus::OverTarget
        };

        AdjustOutcome {
            params: adjusted,
            estimate_bytes: new_estimate,
            tier: tier.level,
            status,
        }
    }

    /// Call `adjust` until the estimate fits, a fixed point is hit, or the pass budget runs out
    pub fn converge(&self, params: &ExportParameters, clip: &ClipMetadata) -> Convergence {
        let mut current = params.clone();
        let mut tiers_applied = Vec::new();
        let mut passes = 0;

        loop {
            let outcome = self.adjust(&current, clip);
            passes += 1;

            if outcome.params != current {
                tiers_applied.push(outcome.tier);
            }
            current = outcome.params;

            let status = match outcome.status {
                AdjustStatus::OverTarget if passes < MAX_ADJUST_PASSES => continue,
                AdjustStatus::OverTarget => AdjustStatus::TargetUnreachable,
                other => other,
            };

            return Convergence {
                params: current,
                estimate_bytes: outcome.estimate_bytes,
                tiers_applied,
                passes,
                status,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MIB;
    use crate::presets::Preset;

    /// Real estimator rescaled so a reference parameter set hits a chosen size
    struct ScaledModel {
        inner: SizeEstimator,
        scale: f64,
    }

    impl ScaledModel {
        fn calibrated(reference: &ExportParameters, clip: &ClipMetadata, bytes: u64) -> Self {
            let inner = SizeEstimator::default();
            let scale = bytes as f64 / inner.estimate(reference, clip) as f64;
            Self { inner, scale }
        }
    }

    impl SizeModel for ScaledModel {
        fn estimate(&self, params: &ExportParameters, clip: &ClipMetadata) -> u64 {
            (self.inner.estimate(params, clip) as f64 * self.scale).round() as u64
        }
    }

    fn adjuster() -> AutoAdjuster {
        AutoAdjuster::default()
    }

    fn clip() -> ClipMetadata {
        ClipMetadata {
            duration_seconds: 120.0,
            native_width: 1920,
            native_height: 1080,
            native_fps: 30.0,
        }
    }

    #[test]
    fn test_tier_table_is_ordered() {
        assert!(ADJUSTMENT_TIERS
            .windows(2)
            .all(|pair| pair[0].min_overage > pair[1].min_overage && pair[0].level > pair[1].level));
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(select_tier(0.70).unwrap().level, TierLevel::Severe);
        assert_eq!(select_tier(0.6999).unwrap().level, TierLevel::Heavy);
        assert_eq!(select_tier(0.50).unwrap().level, TierLevel::Heavy);
        assert_eq!(select_tier(0.4999).unwrap().level, TierLevel::Moderate);
        assert_eq!(select_tier(0.30).unwrap().level, TierLevel::Moderate);
        assert_eq!(select_tier(0.2999).unwrap().level, TierLevel::Minimal);
        assert_eq!(select_tier(0.0001).unwrap().level, TierLevel::Minimal);
        assert_eq!(select_tier(5.0).unwrap().level, TierLevel::Severe);
        assert!(select_tier(0.0).is_none());
        assert!(select_tier(-0.5).is_none());
    }

    #[test]
    fn test_no_target_is_noop() {
        let params = Preset::HighQuality.template();
        let adjuster = adjuster();

        let outcome = adjuster.adjust(&params, &clip());
        assert_eq!(outcome.params, params);
        assert_eq!(outcome.estimate_bytes, SizeEstimator::default().estimate(&params, &clip()));
        assert_eq!(outcome.tier, TierLevel::None);
        assert_eq!(outcome.status, AdjustStatus::Unconstrained);
    }

    #[test]
    fn test_within_target_is_unchanged() {
        let mut params = Preset::Medium.template();
        let estimate = SizeEstimator::default().estimate(&params, &clip());
        params.target_size_bytes = Some(estimate);

        let outcome = adjuster().adjust(&params, &clip());
        assert_eq!(outcome.params, params);
        assert_eq!(outcome.tier, TierLevel::None);
        assert_eq!(outcome.status, AdjustStatus::WithinTarget);
    }

    #[test]
    fn test_medium_preset_scenario() {
        let params = Preset::Medium.template();
        let model = ScaledModel::calibrated(&params, &clip(), 8 * MIB);
        let adjuster = AutoAdjuster::new(model);

        assert_eq!(adjuster.model().estimate(&params, &clip()), 8 * MIB);
        assert!((overage_ratio(8 * MIB, 5 * MIB) - 0.6).abs() < 1e-12);

        let outcome = adjuster.adjust(&params, &clip());
        assert_eq!(outcome.tier, TierLevel::Heavy);
        assert_eq!(outcome.params.width_px, Some(854));
        assert_eq!(outcome.params.fps, 12);
        assert_eq!(outcome.params.palette_size, 256);
        assert_eq!(outcome.params.lossy_level, 35);
        assert!(outcome.estimate_bytes < 8 * MIB);
    }

    #[test]
    fn test_no_upward_override() {
        let params = ExportParameters {
            palette_size: 64,
            fps: 8,
            lossy_level: 90,
            target_size_bytes: Some(5 * MIB),
            ..Preset::Medium.template()
        };
        // 1.6x the target selects the tier that asks for palette 256 and fps 12
        let model = ScaledModel::calibrated(&params, &clip(), 8 * MIB);
        let outcome = AutoAdjuster::new(model).adjust(&params, &clip());

        assert_eq!(outcome.tier, TierLevel::Heavy);
        assert_eq!(outcome.params.palette_size, 64);
        assert_eq!(outcome.params.fps, 8);
        assert_eq!(outcome.params.lossy_level, 90);
        assert_eq!(outcome.params.width_px, Some(854));
    }

    #[test]
    fn test_source_width_not_upscaled() {
        let small_clip = ClipMetadata { native_width: 480, native_height: 270, ..clip() };
        let params = ExportParameters { target_size_bytes: Some(2048), ..Default::default() };

        let tier = &ADJUSTMENT_TIERS[0];
        let adjusted = tier.apply(&params, &small_clip);
        assert_eq!(adjusted.width_px, None);

        let adjusted = tier.apply(&params, &clip());
        assert_eq!(adjusted.width_px, Some(640));
    }

    #[test]
    fn test_reapplying_tier_is_fixed_point() {
        for tier in &ADJUSTMENT_TIERS {
            let once = tier.apply(&Preset::Large.template(), &clip());
            let twice = tier.apply(&once, &clip());
            assert_eq!(once, twice, "{:?} is not idempotent", tier.level);
        }
    }

    #[test]
    fn test_repeated_adjust_reaches_fixed_point() {
        let adjuster = adjuster();
        let estimator = SizeEstimator::default();

        for preset in [Preset::Large, Preset::Medium, Preset::HighQuality, Preset::Custom] {
            let base = preset.template();
            let full = estimator.estimate(&base, &clip());

            for divisor in [1.1, 1.4, 1.6, 2.0, 1_000.0, 1_000_000.0] {
                let mut params = ExportParameters {
                    target_size_bytes: Some(((full as f64 / divisor) as u64).max(1)),
                    ..base.clone()
                };
                let mut previous_estimate = u64::MAX;
                let mut reached = false;

                for _ in 0..MAX_ADJUST_PASSES {
                    let outcome = adjuster.adjust(&params, &clip());
                    assert!(outcome.estimate_bytes <= previous_estimate);
                    previous_estimate = outcome.estimate_bytes;
                    if outcome.params == params {
                        reached = true;
                        break;
                    }
                    params = outcome.params;
                }
                assert!(reached, "{} / {} did not stabilise", preset, divisor);
            }
        }
    }

    #[test]
    fn test_converge_fits_with_minimal_tier() {
        let mut params = Preset::Medium.template();
        let estimate = SizeEstimator::default().estimate(&params, &clip());
        params.target_size_bytes = Some((estimate as f64 * 0.99) as u64);

        let result = adjuster().converge(&params, &clip());
        assert_eq!(result.status, AdjustStatus::WithinTarget);
        assert_eq!(result.tiers_applied, vec![TierLevel::Minimal]);
        assert_eq!(result.params.lossy_level, 5);
        assert_eq!(result.params.width_px, Some(1280));
    }

    #[test]
    fn test_converge_reports_unreachable_target() {
        let params = ExportParameters {
            target_size_bytes: Some(4096),
            ..Preset::Large.template()
        };

        let result = adjuster().converge(&params, &clip());
        assert_eq!(result.status, AdjustStatus::TargetUnreachable);
        assert_eq!(result.tiers_applied, vec![TierLevel::Severe]);
        assert!(result.passes <= MAX_ADJUST_PASSES);
        assert_eq!(result.params.width_px, Some(640));
        assert_eq!(result.params.fps, 10);
        assert_eq!(result.params.palette_size, 128);
        assert_eq!(result.params.lossy_level, 60);
        assert!(result.estimate_bytes > 4096);
    }

    #[test]
    fn test_converge_without_target() {
        let params = Preset::HighQuality.template();
        let result = adjuster().converge(&params, &clip());
        assert_eq!(result.status, AdjustStatus::Unconstrained);
        assert_eq!(result.passes, 1);
        assert!(result.tiers_applied.is_empty());
        assert_eq!(result.params, params);
    }
}
