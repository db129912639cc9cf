//! # GIF Export Planner - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione e risoluzione del template (preset + override)
//! - Probe dei video con ffprobe e planning dei job
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (input, modalità, preset, override)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica il file di configurazione (o i default)
//! 4. Risolve il preset e applica gli override manuali
//! 5. Analizza i video con ffprobe
//! 6. Pianifica i job e li stampa come log o eventi JSON
//!
//! ## Esempio di utilizzo:
//! ```bash
//! gif-planner clip.mp4 --mode merged --range 0-3 --range 60-62 --preset small --target-mb 2
//! gif-planner ./videos --mode batch --preset tiny --workers 8 --json
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use gif_export_planner::{
    file_manager::FileManager,
    json_output::JsonMessage,
    params::{Dithering, LoopMode, TextOverlay, MIB},
    platform::PlatformCommands,
    progress::{PlanStats, ProgressManager},
    BatchPlanner, Config, ExportJob, ExportMode, ExportParameters, ExportPlanner, ExportRequest,
    FfprobeProbe, MediaProbe, PresetCatalog, SizeEstimator, SourceClip, TimeRange,
};

#[derive(Parser)]
#[command(name = "gif-planner")]
#[command(about = "Plan size-aware GIF exports from video clips")]
struct Args {
    /// Video files or directories (directories are scanned for videos)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Export mode: full, segment, merged or batch
    #[arg(short, long, default_value = "full")]
    mode: ExportMode,

    /// Quality preset (Tiny, Small, Medium, Large, High Quality, Custom)
    #[arg(short, long)]
    preset: Option<String>,

    /// Output width in pixels (height follows the aspect ratio)
    #[arg(long)]
    width: Option<u32>,

    /// Output frame rate (1-60)
    #[arg(long)]
    fps: Option<u32>,

    /// Palette size (2-256)
    #[arg(long)]
    colors: Option<u16>,

    /// Dithering: none, bayer, sierra2_4a, floyd_steinberg
    #[arg(long)]
    dither: Option<Dithering>,

    /// Lossy compression level (0-100)
    #[arg(long)]
    lossy: Option<u8>,

    /// Playback speed multiplier (0.25-4.0)
    #[arg(long)]
    speed: Option<f64>,

    /// Play the clip backwards
    #[arg(long)]
    reverse: bool,

    /// Play forward then backward
    #[arg(long)]
    boomerang: bool,

    /// Loop count: forever, once or a number
    #[arg(long = "loop")]
    loop_mode: Option<LoopMode>,

    /// Text overlay burned into every frame (repeatable)
    #[arg(long)]
    text: Vec<String>,

    /// Time range START-END in seconds or mm:ss (repeatable)
    #[arg(long)]
    range: Vec<TimeRange>,

    /// Target size in MB (0 disables the target)
    #[arg(short, long)]
    target_mb: Option<f64>,

    /// Ignore the preset's target size
    #[arg(long, conflicts_with = "target_mb")]
    no_target: bool,

    /// Number of parallel workers for batch planning
    #[arg(short, long)]
    workers: Option<usize>,

    /// Configuration file (default: <config_dir>/gif-planner/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output progress and jobs as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout stays clean for JSON events
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(args.config.as_deref()).await?;
    let json_output = args.json || config.json_output;

    match run(&args, &config, json_output).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if json_output {
                JsonMessage::error(e.to_string(), e.chain().nth(1).map(|cause| cause.to_string())).emit();
            }
            Err(e)
        }
    }
}

async fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path).await,
        None => match Config::default_path() {
            Some(path) => Config::from_file(&path).await,
            None => Ok(Config::default()),
        },
    }
}

async fn run(args: &Args, config: &Config, json_output: bool) -> Result<()> {
    let start = Instant::now();
    let preset_name = args.preset.clone().unwrap_or_else(|| config.preset.clone());
    let workers = args.workers.unwrap_or(config.workers);

    let template = build_template(args, &preset_name)?;
    template.validate()?;

    let inputs = FileManager::collect_inputs(&args.inputs)?;
    if inputs.is_empty() {
        return Err(anyhow::anyhow!("No video files found in the given inputs"));
    }

    if json_output {
        JsonMessage::start(args.mode, preset_name.as_str(), inputs.len(), workers).emit();
    } else {
        info!("🎞️  {} export of {} video(s) with preset {}", args.mode, inputs.len(), preset_name);
    }

    PlatformCommands::instance().check_dependencies(&["ffprobe"]).await?;

    let progress = if json_output {
        ProgressManager::hidden()
    } else {
        ProgressManager::new(inputs.len() as u64)
    };
    let sources = probe_sources(&FfprobeProbe::new(), &inputs, &args.range, &progress).await?;
    progress.finish("probe complete");

    let planner = Arc::new(ExportPlanner::new(SizeEstimator::new(config.calibration)?));
    let jobs = match args.mode {
        ExportMode::Batch => {
            let planning = if json_output {
                ProgressManager::hidden()
            } else {
                ProgressManager::new(sources.len() as u64)
            };
            let jobs = BatchPlanner::new(Arc::clone(&planner), workers)
                .plan_concurrent(sources, template, Some(planning.clone()))
                .await?;
            planning.finish("planning complete");
            jobs
        }
        mode => planner.plan(&ExportRequest { mode, sources, template })?,
    };

    report(&jobs, &inputs, json_output, start);
    Ok(())
}

/// Preset template with the manual overrides on top
fn build_template(args: &Args, preset_name: &str) -> Result<ExportParameters> {
    let mut params = PresetCatalog::resolve(preset_name)?;

    if let Some(width) = args.width {
        params.width_px = Some(width);
    }
    if let Some(fps) = args.fps {
        params.fps = fps;
    }
    if let Some(colors) = args.colors {
        params.palette_size = colors;
    }
    if let Some(dither) = args.dither {
        params.dithering = dither;
    }
    if let Some(lossy) = args.lossy {
        params.lossy_level = lossy;
    }
    if let Some(speed) = args.speed {
        params.speed_multiplier = speed;
    }
    if let Some(loop_mode) = args.loop_mode {
        params.loop_mode = loop_mode;
    }
    params.reverse |= args.reverse;
    params.boomerang |= args.boomerang;
    params.text_overlays.extend(args.text.iter().map(TextOverlay::new));

    if args.no_target {
        params.target_size_bytes = None;
    } else if let Some(mb) = args.target_mb {
        if !mb.is_finite() || mb < 0.0 {
            return Err(anyhow::anyhow!("Target size must be a non-negative number of MB"));
        }
        params.target_size_bytes = (mb > 0.0).then(|| (mb * MIB as f64).round() as u64);
    }

    Ok(params)
}

/// Probe every input; CLI ranges apply to each source
async fn probe_sources<P: MediaProbe>(
    probe: &P,
    inputs: &[PathBuf],
    ranges: &[TimeRange],
    progress: &ProgressManager,
) -> Result<Vec<SourceClip>> {
    let mut sources = Vec::with_capacity(inputs.len());

    for input in inputs {
        let metadata = probe.probe(input).await?;
        let name = FileManager::display_name(input);
        progress.update(&format!("probed {}", name));
        sources.push(SourceClip::new(input.display().to_string(), metadata).with_ranges(ranges.to_vec()));
    }

    Ok(sources)
}

fn report(jobs: &[ExportJob], inputs: &[PathBuf], json_output: bool, start: Instant) {
    let mut stats = PlanStats::new();

    for (index, job) in jobs.iter().enumerate() {
        stats.add_job(job);
        // Merged and full jobs map to the first input; batch jobs keep input order
        let input = inputs.get(index).or(inputs.first());
        let output = input.map(|path| FileManager::gif_output_path(path)).unwrap_or_default();

        if json_output {
            JsonMessage::job(index, jobs.len(), output, job.clone()).emit();
            continue;
        }

        let width = job.params.width_px.map_or("source".to_string(), |w| w.to_string());
        info!(
            "📄 {} -> {}: width {}, {} fps, {} colors, {}, lossy {}, ~{}",
            job.source,
            output.display(),
            width,
            job.params.fps,
            job.params.palette_size,
            job.params.dithering,
            job.params.lossy_level,
            FileManager::format_size(job.estimate_bytes)
        );
        if job.target_unreachable() {
            warn!("⚠️ {} will likely exceed its target size", job.source);
        }
    }

    if json_output {
        JsonMessage::complete(&stats, start.elapsed().as_secs_f64()).emit();
    } else {
        info!("✅ {}", stats.format_summary());
    }
}
