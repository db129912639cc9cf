//! # Media Probe Module
//!
//! Questo modulo legge i metadati di un video tramite ffprobe.
//!
//! ## Responsabilità:
//! - Trait `MediaProbe` usato dalla CLI per ottenere `ClipMetadata`
//! - Implementazione `FfprobeProbe` basata sull'output JSON di ffprobe
//! - Parsing puro dell'output (`parse_ffprobe_json`), testabile senza ffprobe
//!
//! ## Regole di parsing:
//! - Solo il primo stream video (`-select_streams v:0`)
//! - `r_frame_rate` può essere "30000/1001" oppure "25"
//! - La durata dello stream ha precedenza su quella del container
//!
//! ## Esempio:
//! ```rust,ignore
//! let probe = FfprobeProbe::new();
//! let clip = probe.probe(Path::new("input.mp4")).await?;
//! ```

use crate::error::{PlanError, PlanResult};
use crate::params::ClipMetadata;
use crate::platform::PlatformCommands;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Frame rate assumed when the stream does not report one
const FALLBACK_FPS: f64 = 30.0;

/// Source of clip metadata
#[allow(async_fn_in_trait)]
pub trait MediaProbe {
    async fn probe(&self, path: &Path) -> PlanResult<ClipMetadata>;
}

/// `MediaProbe` backed by the ffprobe binary
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    timeout: Duration,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl MediaProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> PlanResult<ClipMetadata> {
        let ffprobe_cmd = PlatformCommands::instance().get_command("ffprobe");
        debug!("Probing {}", path.display());

        let mut cmd = tokio::process::Command::new(ffprobe_cmd);
        cmd.args(["-v", "error", "-show_streams", "-select_streams", "v:0", "-show_format", "-of", "json"])
            .arg(path)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| PlanError::Probe(format!("ffprobe timed out on {}", path.display())))?
            .map_err(|e| PlanError::MissingDependency(format!("failed to execute {}: {}", ffprobe_cmd, e)))?;

        if !output.status.success() {
            return Err(PlanError::Probe(format!(
                "{}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let clip = parse_ffprobe_json(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            "{}: {:.3}s {}x{} @ {:.3}fps",
            path.display(),
            clip.duration_seconds,
            clip.native_width,
            clip.native_height,
            clip.native_fps
        );
        Ok(clip)
    }
}

/// Extract `ClipMetadata` from `ffprobe -of json` output
pub fn parse_ffprobe_json(json: &str) -> PlanResult<ClipMetadata> {
    let info: Value = serde_json::from_str(json)?;

    let stream = info["streams"]
        .as_array()
        .and_then(|streams| streams.first())
        .ok_or_else(|| PlanError::Probe("no video stream found".to_string()))?;

    let width = dimension_field(&stream["width"], "width")?;
    let height = dimension_field(&stream["height"], "height")?;

    let native_fps = stream["r_frame_rate"]
        .as_str()
        .and_then(parse_frame_rate)
        .unwrap_or(FALLBACK_FPS);

    let duration = number_field(&stream["duration"])
        .or_else(|| number_field(&info["format"]["duration"]))
        .unwrap_or(0.0);

    let clip = ClipMetadata {
        duration_seconds: duration,
        native_width: width,
        native_height: height,
        native_fps,
    };
    clip.validate().map_err(|e| PlanError::Probe(e.to_string()))?;
    Ok(clip)
}

/// "30000/1001" or "25" → frames per second
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let fps = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

// Missing dimensions read as 0 and fail validation later
fn dimension_field(value: &Value, name: &str) -> PlanResult<u32> {
    match value.as_u64() {
        Some(raw) => u32::try_from(raw).map_err(|_| PlanError::Probe(format!("{} {} is out of range", name, raw))),
        None => Ok(0),
    }
}

// ffprobe prints numbers as strings
fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
