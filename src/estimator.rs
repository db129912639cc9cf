//! # Size Estimator Module
//!
//! Questo modulo stima la dimensione del GIF risultante SENZA invocare l'encoder.
//!
//! ## Responsabilità:
//! - Funzione pura e deterministica (`ExportParameters`, `ClipMetadata`) → byte stimati
//! - Calcolo del numero effettivo di frame (velocità, boomerang, range selezionati)
//! - Costanti di calibrazione configurabili (`EstimatorCalibration`)
//!
//! ## Modello di costo (euristico, upper-bound):
//! 1. Larghezza effettiva `w` (o larghezza sorgente), altezza dall'aspect ratio
//! 2. Frame `F = durata_range × fps / speed`, boomerang → `2F − 1`
//! 3. Costo per frame ∝ `w × h × log2(palette) / 8 × peso_dithering`
//! 4. Totale = costo per frame × F × `bytes_per_pixel_weight`
//! 5. Sconto lossy: `× (1 − lossy/100 × lossy_discount_factor)`
//! 6. Overlay di testo: `× overlay_multiplier` + `overlay_bytes` per overlay attivo
//! 7. Clamp al minimo plausibile `min_gif_bytes`
//!
//! ## Proprietà garantite:
//! - Non decrescente in larghezza, fps e palette
//! - Non crescente in lossy level
//! - Mai zero: lo sconto lossy è limitato da `lossy_discount_factor < 1`
//!
//! ## Esempio:
//! ```rust,ignore
//! let estimator = SizeEstimator::default();
//! let bytes = estimator.estimate(&params, &clip);
//! ```

use crate::error::{PlanError, PlanResult};
use crate::params::{ClipMetadata, ExportParameters};
use serde::{Deserialize, Serialize};

/// Anything able to predict an output size for a parameter set
pub trait SizeModel {
    fn estimate(&self, params: &ExportParameters, clip: &ClipMetadata) -> u64;
}

/// Tunable constants of the cost model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorCalibration {
    /// Bytes per (pixel × palette bit / 8) after LZW, including container overhead
    pub bytes_per_pixel_weight: f64,
    /// Maximum fraction removed by lossy level 100
    pub lossy_discount_factor: f64,
    /// Fixed surcharge per active text overlay
    pub overlay_bytes: u64,
    /// Compressibility penalty when any overlay is present
    pub overlay_multiplier: f64,
    pub min_gif_bytes: u64,
}

impl Default for EstimatorCalibration {
    fn default() -> Self {
        Self {
            // LZW ratio ~4 plus 5% for headers and colour tables
            bytes_per_pixel_weight: 1.05 / 4.0,
            lossy_discount_factor: 0.5,
            overlay_bytes: 2048,
            overlay_multiplier: 1.03,
            min_gif_bytes: 1024,
        }
    }
}

impl EstimatorCalibration {
    pub fn validate(&self) -> PlanResult<()> {
        if !self.bytes_per_pixel_weight.is_finite() || self.bytes_per_pixel_weight <= 0.0 {
            return Err(PlanError::InvalidParameters(
                "bytes_per_pixel_weight must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.lossy_discount_factor) {
            return Err(PlanError::InvalidParameters(
                "lossy_discount_factor must be in [0, 1)".to_string(),
            ));
        }
        if !self.overlay_multiplier.is_finite() || self.overlay_multiplier < 1.0 {
            return Err(PlanError::InvalidParameters(
                "overlay_multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.min_gif_bytes == 0 {
            return Err(PlanError::InvalidParameters(
                "min_gif_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Heuristic GIF size estimator
#[derive(Debug, Clone, Default)]
pub struct SizeEstimator {
    calibration: EstimatorCalibration,
}

impl SizeEstimator {
    pub fn new(calibration: EstimatorCalibration) -> PlanResult<Self> {
        calibration.validate()?;
        Ok(Self { calibration })
    }

    /// Output frame size after scaling
    pub fn output_dimensions(params: &ExportParameters, clip: &ClipMetadata) -> (u32, u32) {
        let width = params.effective_width(clip);
        (width, clip.scaled_height(width))
    }

    /// Number of frames the encoder will write
    pub fn frame_count(params: &ExportParameters, clip: &ClipMetadata) -> u64 {
        // Faster playback covers the same span with fewer frames
        let forward = (params.covered_duration(clip) * f64::from(params.fps) / params.speed_multiplier)
            .round()
            .max(1.0);

        let frames = if params.boomerang {
            // The turning-point frame is shared by both directions
            2.0 * forward - 1.0
        } else {
            forward
        };
        // Float to int casts saturate on absurd probe durations
        frames as u64
    }

    /// Estimated output size in bytes (upper-bound heuristic)
    pub fn estimate(&self, params: &ExportParameters, clip: &ClipMetadata) -> u64 {
        let cal = &self.calibration;
        let (width, height) = Self::output_dimensions(params, clip);
        let frames = Self::frame_count(params, clip);

        let palette_bits = f64::from(params.palette_size).log2();
        let per_frame = f64::from(width) * f64::from(height) * palette_bits / 8.0
            * params.dithering.size_weight();
        let raw = per_frame * frames as f64 * cal.bytes_per_pixel_weight;

        let lossy = raw * (1.0 - f64::from(params.lossy_level) / 100.0 * cal.lossy_discount_factor);

        let overlays = params.active_overlays().count() as u64;
        let total = if overlays > 0 {
            lossy * cal.overlay_multiplier + (overlays * cal.overlay_bytes) as f64
        } else {
            lossy
        };

        (total.ceil() as u64).max(cal.min_gif_bytes)
    }
}

impl SizeModel for SizeEstimator {
    fn estimate(&self, params: &ExportParameters, clip: &ClipMetadata) -> u64 {
        SizeEstimator::estimate(self, params, clip)
    }
}
