use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use facerecog_core::pipeline::pipeline_engine::{PipelineConfiguration, PipelineEngine};
use facerecog_core::pipeline::recognition_controller::{
    FrameIntake, RecognitionController, RecognitionEvent,
};
use facerecog_core::pipeline::recognition_logger::StdoutRecognitionLogger;
use facerecog_core::recognition::domain::embedding_extractor::EmbeddingExtractor;
use facerecog_core::recognition::domain::recent_face_cache::CompareScope;
use facerecog_core::recognition::domain::stage::Stage;
use facerecog_core::recognition::infrastructure::full_frame_detector::FullFrameFaceDetector;
use facerecog_core::recognition::infrastructure::model_resolver;
use facerecog_core::recognition::infrastructure::onnx_embedding_extractor::OnnxEmbeddingExtractor;
use facerecog_core::recognition::infrastructure::png_frame_sink::PngFrameSink;
use facerecog_core::recognition::stages::add_record_stage::{AddRecordPolicy, AddRecordStage};
use facerecog_core::recognition::stages::angle_z_stage::AngleZStage;
use facerecog_core::recognition::stages::compare_stage::CompareStage;
use facerecog_core::recognition::stages::embedding_stage::EmbeddingStage;
use facerecog_core::recognition::stages::live_stage::LiveStage;
use facerecog_core::recognition::stages::persist_stage::PersistStage;
use facerecog_core::recognition::stages::range_stage::RangeStage;
use facerecog_core::recognition::stages::rect_stage::RectStage;
use facerecog_core::shared::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_FACE_RATIO, DEFAULT_MAX_ROLL_DEGREES,
    DEFAULT_MIN_FACE_RATIO, DEFAULT_SIMILARITY_THRESHOLD, EMBEDDING_MODEL_NAME,
    EMBEDDING_MODEL_URL, IMAGE_EXTENSIONS,
};
use facerecog_core::shared::frame::Frame;

/// Face recognition over a directory of image frames.
#[derive(Parser)]
#[command(name = "facerecog")]
struct Cli {
    /// Directory of face images, processed in sorted filename order.
    input: PathBuf,

    /// Similarity threshold (0.0-1.0); smaller differences count as a match.
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    threshold: f64,

    /// Minimum face area as a fraction of the frame (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_FACE_RATIO)]
    min_area: f64,

    /// Maximum face area as a fraction of the frame (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MAX_FACE_RATIO)]
    max_area: f64,

    /// Maximum absolute roll angle in degrees.
    #[arg(long, default_value_t = DEFAULT_MAX_ROLL_DEGREES)]
    max_roll: f32,

    /// Compare against the newest cached face only.
    #[arg(long)]
    compare_recent: bool,

    /// Reject frames whose best match is above the threshold.
    #[arg(long)]
    reject_unmatched: bool,

    /// Do not add processed faces to the recent-face cache.
    #[arg(long)]
    no_add_recent: bool,

    /// Require blink-based liveness before recognition (needs a detector
    /// that reports eye state; rejects every frame with the built-in
    /// file detector).
    #[arg(long)]
    require_live: bool,

    /// Recent-face cache capacity.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Export each fully processed frame to this image path.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Directory containing a bundled embedding model (skips download).
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// JSON run configuration; present fields override the flags above.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// JSON counterpart of the tuning flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RunConfigFile {
    threshold: Option<f64>,
    min_area: Option<f64>,
    max_area: Option<f64>,
    max_roll: Option<f32>,
    compare_recent: Option<bool>,
    reject_unmatched: Option<bool>,
    add_recent: Option<bool>,
    require_live: Option<bool>,
    cache_capacity: Option<usize>,
    save: Option<PathBuf>,
}

/// Flags and config file merged into one effective configuration.
struct Settings {
    threshold: f64,
    min_area: f64,
    max_area: f64,
    max_roll: f32,
    compare_recent: bool,
    reject_unmatched: bool,
    add_recent: bool,
    require_live: bool,
    cache_capacity: usize,
    save: Option<PathBuf>,
}

impl Settings {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            threshold: cli.threshold,
            min_area: cli.min_area,
            max_area: cli.max_area,
            max_roll: cli.max_roll,
            compare_recent: cli.compare_recent,
            reject_unmatched: cli.reject_unmatched,
            add_recent: !cli.no_add_recent,
            require_live: cli.require_live,
            cache_capacity: cli.cache_capacity,
            save: cli.save.clone(),
        }
    }

    fn apply(&mut self, file: RunConfigFile) {
        if let Some(v) = file.threshold {
            self.threshold = v;
        }
        if let Some(v) = file.min_area {
            self.min_area = v;
        }
        if let Some(v) = file.max_area {
            self.max_area = v;
        }
        if let Some(v) = file.max_roll {
            self.max_roll = v;
        }
        if let Some(v) = file.compare_recent {
            self.compare_recent = v;
        }
        if let Some(v) = file.reject_unmatched {
            self.reject_unmatched = v;
        }
        if let Some(v) = file.add_recent {
            self.add_recent = v;
        }
        if let Some(v) = file.require_live {
            self.require_live = v;
        }
        if let Some(v) = file.cache_capacity {
            self.cache_capacity = v;
        }
        if let Some(v) = file.save {
            self.save = Some(v);
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    validate(&cli, &settings)?;

    let frame_paths = list_frame_paths(&cli.input)?;
    if frame_paths.is_empty() {
        return Err(format!("no image files found in {}", cli.input.display()).into());
    }

    let extractor = build_extractor(&cli)?;
    let configuration = build_configuration(&settings, extractor)?;
    log::info!("Stage chain: {}", configuration.stage_names().join(" -> "));
    let engine = Arc::new(PipelineEngine::new(configuration, settings.cache_capacity));

    let mut controller = RecognitionController::new(
        Box::new(FullFrameFaceDetector::new()),
        engine,
        Box::new(StdoutRecognitionLogger::default()),
    );
    controller.start()?;

    let intake = controller.intake();
    let events = controller.events();
    let mut matched = 0usize;
    let mut unmatched = 0usize;
    let mut rejected = 0usize;
    let mut errored = 0usize;

    for (index, path) in frame_paths.iter().enumerate() {
        let frame = load_frame(path, index)?;
        push_paced(&intake, frame);

        let event = events.recv()?;
        report(path, &event);
        match event {
            RecognitionEvent::Success { match_result, .. } => {
                match match_result {
                    Some(result) if result.matched => matched += 1,
                    _ => unmatched += 1,
                }
            }
            RecognitionEvent::Failure { .. } => rejected += 1,
            RecognitionEvent::Exception { .. } => errored += 1,
        }
    }

    let cached = controller
        .engine()
        .cache()
        .lock()
        .map(|c| c.len())
        .unwrap_or(0);
    if controller.dropped_frames() > 0 {
        log::warn!("{} frames dropped under backpressure", controller.dropped_frames());
    }
    controller.stop();

    println!(
        "{} frames: {matched} matched, {unmatched} unmatched, {rejected} rejected, {errored} errors ({cached} cached)",
        frame_paths.len()
    );
    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error + Send + Sync>> {
    let mut settings = Settings::from_cli(cli);
    if let Some(ref path) = cli.config {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let file: RunConfigFile = serde_json::from_str(&text)
            .map_err(|e| format!("invalid run configuration {}: {e}", path.display()))?;
        settings.apply(file);
    }
    Ok(settings)
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !cli.input.is_dir() {
        return Err(format!("Input directory not found: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&settings.threshold) {
        return Err(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            settings.threshold
        )
        .into());
    }
    if !(0.0..=1.0).contains(&settings.min_area)
        || !(0.0..=1.0).contains(&settings.max_area)
        || settings.min_area >= settings.max_area
    {
        return Err(format!(
            "Face area band must satisfy 0.0 <= min < max <= 1.0, got [{}, {}]",
            settings.min_area, settings.max_area
        )
        .into());
    }
    if !(0.0..=180.0).contains(&settings.max_roll) {
        return Err(format!(
            "Max roll must be between 0 and 180 degrees, got {}",
            settings.max_roll
        )
        .into());
    }
    if settings.cache_capacity == 0 {
        return Err("Cache capacity must be at least 1".into());
    }
    Ok(())
}

fn build_extractor(cli: &Cli) -> Result<Box<dyn EmbeddingExtractor>, Box<dyn std::error::Error + Send + Sync>> {
    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        cli.model_dir.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    Ok(Box::new(OnnxEmbeddingExtractor::new(&model_path)?))
}

/// Assembles the stage chain in the same order a camera host would:
/// geometry filters first, then liveness, then the expensive embedding,
/// comparison, export, and cache insertion.
fn build_configuration(
    settings: &Settings,
    extractor: Box<dyn EmbeddingExtractor>,
) -> Result<PipelineConfiguration, Box<dyn std::error::Error + Send + Sync>> {
    let mut stages: Vec<Box<dyn Stage>> = Vec::new();

    stages.push(Box::new(RectStage::new(Box::new(|rect| {
        log::debug!(
            "face at ({}, {}) {}x{}",
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
    }))));
    stages.push(Box::new(RangeStage::new(
        settings.min_area,
        settings.max_area,
    )));
    stages.push(Box::new(AngleZStage::new(settings.max_roll)));
    if settings.require_live {
        stages.push(Box::new(LiveStage::new()));
    }
    stages.push(Box::new(EmbeddingStage::new(extractor)));

    let scope = if settings.compare_recent {
        CompareScope::NewestOnly
    } else {
        CompareScope::All
    };
    stages.push(Box::new(
        CompareStage::new(scope).with_reject_unmatched(settings.reject_unmatched),
    ));

    if let Some(ref path) = settings.save {
        stages.push(Box::new(PersistStage::new(
            Box::new(PngFrameSink::new()),
            path.clone(),
        )));
    }
    if settings.add_recent {
        stages.push(Box::new(AddRecordStage::new(AddRecordPolicy::Always)));
    }

    Ok(PipelineConfiguration::new(stages, settings.threshold)?)
}

fn list_frame_paths(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_image(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_frame(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
    let img = image::open(path)
        .map_err(|e| format!("cannot load {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = (img.width(), img.height());
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

/// A file-driven source has no capture clock, so pace pushes against the
/// worker instead of dropping frames on the floor.
fn push_paced(intake: &FrameIntake, frame: Frame) {
    while !intake.push(frame.clone()) {
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn report(path: &Path, event: &RecognitionEvent) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match event {
        RecognitionEvent::Success {
            face_type,
            match_result,
        } => match match_result {
            Some(result) if result.matched => println!(
                "{name}: matched record {} (difference {:.4}, {face_type})",
                result.record_id.unwrap_or_default(),
                result.difference
            ),
            Some(result) => println!(
                "{name}: unmatched (difference {:.4}, {face_type})",
                result.difference
            ),
            None => println!("{name}: processed ({face_type})"),
        },
        RecognitionEvent::Failure { reason } => println!("{name}: rejected ({reason})"),
        RecognitionEvent::Exception { message } => println!("{name}: error ({message})"),
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading embedding model... {pct}%");
    } else {
        eprint!("\rDownloading embedding model... {downloaded} bytes");
    }
}
