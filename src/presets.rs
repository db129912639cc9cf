//! # Preset Catalog Module
//!
//! Questo modulo mappa i preset di qualità con nome su template di `ExportParameters`.
//!
//! ## Responsabilità:
//! - Catalogo immutabile dei preset (Tiny, Small, Medium, Large, High Quality, Custom)
//! - Risoluzione tollerante dei nomi (case-insensitive, ignora spazi/trattini
//!   e l'etichetta tra parentesi come in "Tiny (<1MB)")
//! - Applicazione di un preset a un bundle esistente preservando i campi "pinned"
//!
//! ## Catalogo:
//! | Preset       | Width  | FPS | Palette | Lossy | Target  |
//! |--------------|--------|-----|---------|-------|---------|
//! | Tiny         | 640    | 10  | 128     | 80    | 1 MiB   |
//! | Small        | 854    | 12  | 256     | 40    | 2 MiB   |
//! | Medium       | 1280   | 15  | 256     | 0     | 5 MiB   |
//! | Large        | 1920   | 20  | 256     | 0     | 10 MiB  |
//! | High Quality | source | 24  | 256     | 0     | nessuno |
//! | Custom       | source | 15  | 256     | 0     | nessuno |
//!
//! ## Esempio:
//! ```rust,ignore
//! let template = PresetCatalog::resolve("Medium (<5MB)")?;
//! let params = PresetCatalog::apply(Preset::Tiny, &current, PinnedFields::default());
//! ```

use crate::error::{PlanError, PlanResult};
use crate::params::{Dithering, ExportParameters, MIB};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    Tiny,
    Small,
    Medium,
    Large,
    HighQuality,
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Tiny,
        Preset::Small,
        Preset::Medium,
        Preset::Large,
        Preset::HighQuality,
        Preset::Custom,
    ];

    /// Baseline parameter bundle for this preset
    pub fn template(&self) -> ExportParameters {
        let base = ExportParameters::default();
        match self {
            Preset::Tiny => ExportParameters {
                width_px: Some(640),
                fps: 10,
                palette_size: 128,
                lossy_level: 80,
                target_size_bytes: Some(MIB),
                ..base
            },
            Preset::Small => ExportParameters {
                width_px: Some(854),
                fps: 12,
                palette_size: 256,
                lossy_level: 40,
                target_size_bytes: Some(2 * MIB),
                ..base
            },
            Preset::Medium => ExportParameters {
                width_px: Some(1280),
                fps: 15,
                palette_size: 256,
                lossy_level: 0,
                target_size_bytes: Some(5 * MIB),
                ..base
            },
            Preset::Large => ExportParameters {
                width_px: Some(1920),
                fps: 20,
                palette_size: 256,
                lossy_level: 0,
                dithering: Dithering::FloydSteinberg,
                target_size_bytes: Some(10 * MIB),
                ..base
            },
            Preset::HighQuality => ExportParameters {
                width_px: None,
                fps: 24,
                palette_size: 256,
                lossy_level: 0,
                dithering: Dithering::FloydSteinberg,
                target_size_bytes: None,
                ..base
            },
            Preset::Custom => base,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Tiny => write!(f, "Tiny"),
            Preset::Small => write!(f, "Small"),
            Preset::Medium => write!(f, "Medium"),
            Preset::Large => write!(f, "Large"),
            Preset::HighQuality => write!(f, "High Quality"),
            Preset::Custom => write!(f, "Custom"),
        }
    }
}

impl FromStr for Preset {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "Tiny (<1MB)" -> "tiny", "High-Quality" -> "highquality"
        let label = s.split('(').next().unwrap_or_default();
        let key: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "tiny" => Ok(Preset::Tiny),
            "small" => Ok(Preset::Small),
            "medium" => Ok(Preset::Medium),
            "large" => Ok(Preset::Large),
            "highquality" | "hq" => Ok(Preset::HighQuality),
            "custom" => Ok(Preset::Custom),
            _ => Err(PlanError::UnknownPreset(s.to_string())),
        }
    }
}

/// Fields that survive when a preset replaces the bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinnedFields {
    pub time_ranges: bool,
    pub text_overlays: bool,
    /// speed, reverse, boomerang and loop mode
    pub playback: bool,
    pub target_size: bool,
}

impl Default for PinnedFields {
    fn default() -> Self {
        Self {
            time_ranges: true,
            text_overlays: false,
            playback: false,
            target_size: false,
        }
    }
}

impl PinnedFields {
    pub fn all() -> Self {
        Self {
            time_ranges: true,
            text_overlays: true,
            playback: true,
            target_size: true,
        }
    }
}

/// Fixed catalog of quality presets
pub struct PresetCatalog;

impl PresetCatalog {
    /// Resolve a preset name to its template
    pub fn resolve(name: &str) -> PlanResult<ExportParameters> {
        Ok(name.parse::<Preset>()?.template())
    }

    /// Replace `current` with the preset's template, keeping pinned fields
    pub fn apply(preset: Preset, current: &ExportParameters, pinned: PinnedFields) -> ExportParameters {
        let mut params = preset.template();

        if pinned.time_ranges {
            params.time_ranges = current.time_ranges.clone();
        }
        if pinned.text_overlays {
            params.text_overlays = current.text_overlays.clone();
        }
        if pinned.playback {
            params.speed_multiplier = current.speed_multiplier;
            params.reverse = current.reverse;
            params.boomerang = current.boomerang;
            params.loop_mode = current.loop_mode;
        }
        if pinned.target_size {
            params.target_size_bytes = current.target_size_bytes;
        }

        params
    }

    pub fn names() -> Vec<String> {
        Preset::ALL.iter().map(ToString::to_string).collect()
    }
}
