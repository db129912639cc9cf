//! # Export Parameters Module
//!
//! Questo modulo definisce il modello dati su cui opera tutto il planner.
//!
//! ## Responsabilità:
//! - Definisce `ExportParameters`, il bundle risolto di parametri per un job GIF
//! - Definisce i metadati del clip (`ClipMetadata`) forniti dal probe esterno
//! - Fornisce validazione robusta dei campi (mai clamping silenzioso)
//! - Parsing da stringa di dithering, loop, scaling e range temporali
//!
//! ## Parametri principali:
//! - `width_px`: Larghezza output (None = larghezza sorgente)
//! - `fps`: Frame rate (1-60)
//! - `palette_size`: Colori della palette globale (2-256)
//! - `dithering`: Algoritmo di dithering (none, bayer, sierra2_4a, floyd_steinberg)
//! - `lossy_level`: Compressione lossy post-encoding (0-100, 0 = disattivata)
//! - `speed_multiplier`: Velocità di riproduzione (0.25x - 4x)
//! - `reverse` / `boomerang`: Effetti di riproduzione
//! - `text_overlays`: Testi sovrapposti (contenuto opaco per lo stimatore)
//! - `time_ranges`: Range selezionati (vuoto = clip intera)
//! - `target_size_bytes`: Tetto di dimensione (None = nessun vincolo)
//!
//! ## Parametri lato transcoder (ignorati dallo stimatore):
//! - `loop_mode`, `scale_filter`, `optimize_palette`
//!
//! ## Esempio:
//! ```rust,ignore
//! let params = ExportParameters {
//!     width_px: Some(854),
//!     fps: 12,
//!     target_size_bytes: Some(2 * MIB),
//!     ..Default::default()
//! };
//! params.validate()?;
//! ```

use crate::error::{PlanError, PlanResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One mebibyte in bytes
pub const MIB: u64 = 1024 * 1024;

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 60;
pub const MIN_PALETTE_SIZE: u16 = 2;
pub const MAX_PALETTE_SIZE: u16 = 256;
pub const MAX_LOSSY_LEVEL: u8 = 100;
pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

/// Dithering algorithm used when mapping frames onto the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dithering {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "bayer")]
    Bayer,
    /// Sierra-2-4A error diffusion
    #[default]
    #[serde(rename = "sierra2_4a")]
    Sierra,
    #[serde(rename = "floyd_steinberg")]
    FloydSteinberg,
}

impl Dithering {
    /// Relative size weight: noisier dithers compress worse
    pub fn size_weight(&self) -> f64 {
        match self {
            Dithering::None => 0.85,
            Dithering::Bayer => 0.95,
            Dithering::Sierra => 1.0,
            Dithering::FloydSteinberg => 1.1,
        }
    }
}

impl fmt::Display for Dithering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dithering::None => write!(f, "none"),
            Dithering::Bayer => write!(f, "bayer"),
            Dithering::Sierra => write!(f, "sierra2_4a"),
            Dithering::FloydSteinberg => write!(f, "floyd_steinberg"),
        }
    }
}

impl FromStr for Dithering {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(Dithering::None),
            "bayer" => Ok(Dithering::Bayer),
            "sierra" | "sierra2_4a" => Ok(Dithering::Sierra),
            "floyd_steinberg" | "fs" => Ok(Dithering::FloydSteinberg),
            other => Err(PlanError::InvalidParameters(format!(
                "unknown dithering algorithm '{}'",
                other
            ))),
        }
    }
}

/// Scaling algorithm the transcoder should use when resizing frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleFilter {
    /// Lanczos - migliore qualità per downscaling
    #[default]
    Lanczos,
    Bicubic,
    /// Bilinear - veloce, qualità accettabile
    Bilinear,
}

impl fmt::Display for ScaleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleFilter::Lanczos => write!(f, "lanczos"),
            ScaleFilter::Bicubic => write!(f, "bicubic"),
            ScaleFilter::Bilinear => write!(f, "bilinear"),
        }
    }
}

/// How many times the GIF loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    #[default]
    Forever,
    /// Play once, no looping
    Once,
    Times(u16),
}

impl LoopMode {
    /// Value of the GIF loop extension as understood by ffmpeg (`-loop`)
    pub fn loop_value(&self) -> i32 {
        match self {
            LoopMode::Forever => 0,
            LoopMode::Once => -1,
            LoopMode::Times(n) => i32::from(*n),
        }
    }
}

impl FromStr for LoopMode {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forever" | "infinite" | "0" => Ok(LoopMode::Forever),
            "once" => Ok(LoopMode::Once),
            other => other
                .parse::<u16>()
                .map(LoopMode::Times)
                .map_err(|_| PlanError::InvalidParameters(format!("invalid loop mode '{}'", s))),
        }
    }
}

/// Anchor of a text overlay inside the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPosition {
    #[default]
    BottomLeft,
    BottomCenter,
    BottomRight,
    CenterLeft,
    Center,
    CenterRight,
    TopLeft,
    TopCenter,
    TopRight,
    Custom { x: u32, y: u32 },
}

/// Text burned into every frame by the transcoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub enabled: bool,
    pub text: String,
    pub position: OverlayPosition,
    pub padding_px: u32,
    pub font_size: u32,
    pub font_color: String,
    pub bold: bool,
    pub outline: bool,
    pub background_box: bool,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            enabled: true,
            text: String::new(),
            position: OverlayPosition::default(),
            padding_px: 16,
            font_size: 24,
            font_color: "white".to_string(),
            bold: false,
            outline: true,
            background_box: false,
        }
    }
}

impl TextOverlay {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// An overlay only costs bytes when it is enabled and has visible text
    pub fn is_active(&self) -> bool {
        self.enabled && !self.text.trim().is_empty()
    }
}

/// A selected `[start, end)` span of the source clip, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}-{:.3}", self.start, self.end)
    }
}

/// Parses `"12.5-20"` or `"1:05-1:30.5"` (minutes:seconds)
impl FromStr for TimeRange {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| PlanError::InvalidTimeRange(format!("expected START-END, got '{}'", s)))?;

        Ok(Self::new(parse_timestamp(start)?, parse_timestamp(end)?))
    }
}

fn parse_timestamp(raw: &str) -> PlanResult<f64> {
    let mut seconds = 0.0;
    for part in raw.trim().split(':') {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| PlanError::InvalidTimeRange(format!("invalid timestamp '{}'", raw.trim())))?;
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}

/// Clip properties reported by the media probe (read-only for the planner)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipMetadata {
    pub duration_seconds: f64,
    pub native_width: u32,
    pub native_height: u32,
    pub native_fps: f64,
}

impl ClipMetadata {
    pub fn validate(&self) -> PlanResult<()> {
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(PlanError::InvalidParameters(format!(
                "clip duration must be positive, got {}",
                self.duration_seconds
            )));
        }
        if self.native_width == 0 || self.native_height == 0 {
            return Err(PlanError::InvalidParameters(format!(
                "clip resolution must be positive, got {}x{}",
                self.native_width, self.native_height
            )));
        }
        if !self.native_fps.is_finite() || self.native_fps <= 0.0 {
            return Err(PlanError::InvalidParameters(format!(
                "clip frame rate must be positive, got {}",
                self.native_fps
            )));
        }
        Ok(())
    }

    /// Height matching `width` under the source aspect ratio
    pub fn scaled_height(&self, width: u32) -> u32 {
        let height = f64::from(width) * f64::from(self.native_height) / f64::from(self.native_width);
        (height.round() as u32).max(1)
    }
}

/// The resolved bundle of encoding knobs for one export job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportParameters {
    pub width_px: Option<u32>,
    pub fps: u32,
    pub palette_size: u16,
    pub dithering: Dithering,
    pub lossy_level: u8,
    pub speed_multiplier: f64,
    pub reverse: bool,
    pub boomerang: bool,
    pub text_overlays: Vec<TextOverlay>,
    pub time_ranges: Vec<TimeRange>,
    pub target_size_bytes: Option<u64>,
    pub loop_mode: LoopMode,
    pub scale_filter: ScaleFilter,
    /// Generate the palette from inter-frame differences (`stats_mode=diff`)
    pub optimize_palette: bool,
}

impl Default for ExportParameters {
    fn default() -> Self {
        Self {
            width_px: None,
            fps: 15,
            palette_size: 256,
            dithering: Dithering::default(),
            lossy_level: 0,
            speed_multiplier: 1.0,
            reverse: false,
            boomerang: false,
            text_overlays: Vec::new(),
            time_ranges: Vec::new(),
            target_size_bytes: None,
            loop_mode: LoopMode::default(),
            scale_filter: ScaleFilter::default(),
            optimize_palette: true,
        }
    }
}

impl ExportParameters {
    /// Validate every field; out-of-range values are rejected, never clamped
    pub fn validate(&self) -> PlanResult<()> {
        if self.width_px == Some(0) {
            return Err(PlanError::InvalidParameters("width must be a positive integer".to_string()));
        }

        if !(MIN_FPS..=MAX_FPS).contains(&self.fps) {
            return Err(PlanError::InvalidParameters(format!(
                "fps must be between {} and {}, got {}",
                MIN_FPS, MAX_FPS, self.fps
            )));
        }

        if !(MIN_PALETTE_SIZE..=MAX_PALETTE_SIZE).contains(&self.palette_size) {
            return Err(PlanError::InvalidParameters(format!(
                "palette size must be between {} and {}, got {}",
                MIN_PALETTE_SIZE, MAX_PALETTE_SIZE, self.palette_size
            )));
        }

        if self.lossy_level > MAX_LOSSY_LEVEL {
            return Err(PlanError::InvalidParameters(format!(
                "lossy level must be between 0 and {}, got {}",
                MAX_LOSSY_LEVEL, self.lossy_level
            )));
        }

        if !self.speed_multiplier.is_finite()
            || self.speed_multiplier < MIN_SPEED
            || self.speed_multiplier > MAX_SPEED
        {
            return Err(PlanError::InvalidParameters(format!(
                "speed multiplier must be between {} and {}, got {}",
                MIN_SPEED, MAX_SPEED, self.speed_multiplier
            )));
        }

        if self.target_size_bytes == Some(0) {
            return Err(PlanError::InvalidParameters("target size must be positive".to_string()));
        }

        for range in &self.time_ranges {
            if !range.start.is_finite() || !range.end.is_finite() || range.end <= range.start {
                return Err(PlanError::InvalidTimeRange(format!(
                    "range {} must have end > start",
                    range
                )));
            }
        }

        Ok(())
    }

    pub fn active_overlays(&self) -> impl Iterator<Item = &TextOverlay> {
        self.text_overlays.iter().filter(|overlay| overlay.is_active())
    }

    /// Output width: explicit width or the source width
    pub fn effective_width(&self, clip: &ClipMetadata) -> u32 {
        self.width_px.unwrap_or(clip.native_width)
    }

    /// Seconds of source material covered: sum of ranges, or the whole clip
    pub fn covered_duration(&self, clip: &ClipMetadata) -> f64 {
        if self.time_ranges.is_empty() {
            clip.duration_seconds
        } else {
            self.time_ranges.iter().map(TimeRange::duration).sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> ClipMetadata {
        ClipMetadata {
            duration_seconds: 120.0,
            native_width: 1920,
            native_height: 1080,
            native_fps: 30.0,
        }
    }

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(ExportParameters::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_out_of_range_fields() {
        let base = ExportParameters::default();

        let bad = [
            ExportParameters { fps: 0, ..base.clone() },
            ExportParameters { fps: 61, ..base.clone() },
            ExportParameters { palette_size: 1, ..base.clone() },
            ExportParameters { palette_size: 257, ..base.clone() },
            ExportParameters { lossy_level: 101, ..base.clone() },
            ExportParameters { speed_multiplier: 0.1, ..base.clone() },
            ExportParameters { speed_multiplier: f64::NAN, ..base.clone() },
            ExportParameters { width_px: Some(0), ..base.clone() },
            ExportParameters { target_size_bytes: Some(0), ..base.clone() },
        ];

        for params in bad {
            assert!(
                matches!(params.validate(), Err(PlanError::InvalidParameters(_))),
                "expected rejection for {:?}",
                params
            );
        }
    }

    #[test]
    fn test_validation_rejects_empty_range() {
        let params = ExportParameters {
            time_ranges: vec![TimeRange::new(5.0, 5.0)],
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(PlanError::InvalidTimeRange(_))));
    }

    #[test]
    fn test_custom_width_accepts_arbitrary_positive_value() {
        let params = ExportParameters { width_px: Some(333), ..Default::default() };
        assert!(params.validate().is_ok());
        assert_eq!(params.effective_width(&clip()), 333);
    }

    #[test]
    fn test_covered_duration_sums_ranges() {
        let clip = clip();
        let mut params = ExportParameters::default();
        assert_eq!(params.covered_duration(&clip), 120.0);

        params.time_ranges = vec![TimeRange::new(0.0, 10.0), TimeRange::new(20.0, 25.5)];
        assert!((params.covered_duration(&clip) - 15.5).abs() < 1e-9);
    }

    #[test]
    fn test_scaled_height_keeps_aspect_ratio() {
        let clip = clip();
        assert_eq!(clip.scaled_height(1280), 720);
        assert_eq!(clip.scaled_height(854), 480);
        assert_eq!(clip.scaled_height(1), 1);
    }

    #[test]
    fn test_inactive_overlays_are_ignored() {
        let mut hidden = TextOverlay::new("hidden");
        hidden.enabled = false;
        let params = ExportParameters {
            text_overlays: vec![TextOverlay::new("hello"), TextOverlay::new("   "), hidden],
            ..Default::default()
        };
        assert_eq!(params.active_overlays().count(), 1);
    }

    #[test]
    fn test_parse_dithering_and_loop() {
        assert_eq!("Floyd-Steinberg".parse::<Dithering>().unwrap(), Dithering::FloydSteinberg);
        assert_eq!("sierra2_4a".parse::<Dithering>().unwrap(), Dithering::Sierra);
        assert!("ordered".parse::<Dithering>().is_err());

        assert_eq!("forever".parse::<LoopMode>().unwrap().loop_value(), 0);
        assert_eq!("once".parse::<LoopMode>().unwrap().loop_value(), -1);
        assert_eq!("3".parse::<LoopMode>().unwrap(), LoopMode::Times(3));
    }

    #[test]
    fn test_parse_time_range() {
        let range: TimeRange = "12.5-20".parse().unwrap();
        assert_eq!(range, TimeRange::new(12.5, 20.0));

        let range: TimeRange = "1:05-1:30.5".parse().unwrap();
        assert_eq!(range, TimeRange::new(65.0, 90.5));

        assert!("12.5".parse::<TimeRange>().is_err());
        assert!("a-b".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_dithering_serializes_with_encoder_names() {
        let json = serde_json::to_string(&Dithering::Sierra).unwrap();
        assert_eq!(json, "\"sierra2_4a\"");
    }
}
