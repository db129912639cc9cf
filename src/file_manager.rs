//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei video di input.
//!
//! ## Responsabilità:
//! - Espansione degli input della CLI (file singoli o directory)
//! - Discovery ricorsiva dei video nelle directory con `walkdir`
//! - Path di output `.gif` accanto al sorgente
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! - **Video**: MP4, MOV, AVI, MKV, WebM, M4V, WMV, FLV
//!
//! ## Esempio:
//! ```rust,ignore
//! let inputs = FileManager::collect_inputs(&[PathBuf::from("clips/")])?;
//! for input in inputs {
//!     println!("{} -> {}", input.display(), FileManager::gif_output_path(&input).display());
//! }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v", "wmv", "flv"];

/// Manages input discovery
pub struct FileManager;

impl FileManager {
    /// Expand CLI inputs: files are kept as given, directories are walked for videos
    pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                files.extend(Self::find_video_files(input)?);
            } else if input.is_file() {
                files.push(input.clone());
            } else {
                anyhow::bail!("Input path does not exist: {}", input.display());
            }
        }

        Ok(files)
    }

    /// Find all videos below a directory, sorted by path
    pub fn find_video_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::is_video(path))
            .collect();

        files.sort();
        Ok(files)
    }

    /// Check if a file is a video
    pub fn is_video(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
    }

    /// `clip.mp4` -> `clip.gif` in the same directory
    pub fn gif_output_path(input: &Path) -> PathBuf {
        input.with_extension("gif")
    }

    /// Display name used in logs and JSON events
    pub fn display_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
