use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use thiserror::Error;

use crate::pipeline::recognition_logger::RecognitionLogger;
use crate::recognition::domain::liveness_tracker::LivenessTracker;
use crate::recognition::domain::recent_face_cache::RecentFaceCache;
use crate::recognition::domain::stage::{
    RejectReason, Stage, StageContext, StageError, StageOutcome,
};
use crate::shared::constants::{LIVENESS_MAX_LOST, LIVENESS_WINDOW_FRAMES};
use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("similarity threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("stage list must not be empty")]
    EmptyStages,
}

/// An immutable snapshot of the stage chain plus the similarity threshold.
///
/// Snapshots are validated at construction and never mutated afterwards;
/// the engine swaps whole snapshots, so an invalid replacement leaves the
/// previous configuration active.
pub struct PipelineConfiguration {
    stages: Vec<Box<dyn Stage>>,
    threshold: f64,
}

impl PipelineConfiguration {
    pub fn new(stages: Vec<Box<dyn Stage>>, threshold: f64) -> Result<Self, ConfigError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        if stages.is_empty() {
            return Err(ConfigError::EmptyStages);
        }
        Ok(Self { stages, threshold })
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

/// Result of driving one frame through the stage chain.
#[derive(Debug)]
pub enum FrameOutcome {
    /// Every stage continued; carries the fully annotated face.
    Completed(FaceInfo),
    /// A stage (or missing detection) rejected the frame.
    Rejected(RejectReason),
    /// A stage hit an underlying error (inference, I/O).
    Failed(StageError),
}

/// Mutable per-session state threaded through frame processing, owned by
/// the worker driving the engine. Keeping it outside the engine keeps
/// `process` free of hidden cross-frame state.
pub struct SessionState {
    liveness: LivenessTracker,
}

impl SessionState {
    pub fn new(liveness_window: usize, liveness_max_lost: usize) -> Self {
        Self {
            liveness: LivenessTracker::new(liveness_window, liveness_max_lost),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(LIVENESS_WINDOW_FRAMES, LIVENESS_MAX_LOST)
    }
}

/// Drives frames through the configured stage chain.
///
/// The configuration lives behind an `RwLock<Arc<_>>`: `process` clones the
/// `Arc` under a brief read lock and traverses without any lock held, so a
/// concurrent `replace_configuration` can never hand one frame a mix of old
/// and new stages. The recent-face cache is serialized behind a single
/// mutex; stages only read it, and insertion is committed here after a
/// frame completes, so rejected and failed frames leave the cache untouched.
pub struct PipelineEngine {
    config: RwLock<Arc<PipelineConfiguration>>,
    cache: Mutex<RecentFaceCache>,
}

impl PipelineEngine {
    pub fn new(config: PipelineConfiguration, cache_capacity: usize) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            cache: Mutex::new(RecentFaceCache::new(cache_capacity)),
        }
    }

    /// Swaps in a new configuration. Takes effect from the next frame;
    /// a frame already traversing keeps its snapshot.
    pub fn replace_configuration(&self, config: PipelineConfiguration) {
        let mut slot = self.config.write().unwrap_or_else(|e| e.into_inner());
        *slot = Arc::new(config);
    }

    pub fn current_configuration(&self) -> Arc<PipelineConfiguration> {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn cache(&self) -> &Mutex<RecentFaceCache> {
        &self.cache
    }

    pub fn process(
        &self,
        frame: &Frame,
        face: Option<FaceInfo>,
        session: &mut SessionState,
        logger: &mut dyn RecognitionLogger,
    ) -> FrameOutcome {
        let config = self.current_configuration();

        let Some(mut face) = face else {
            return FrameOutcome::Rejected(RejectReason::NoFace);
        };

        let mut ctx = StageContext::new(config.threshold(), &self.cache, &mut session.liveness);
        for stage in config.stages() {
            let started = Instant::now();
            let outcome = stage.process(frame, face, &mut ctx);
            logger.timing(stage.name(), started.elapsed().as_secs_f64() * 1000.0);

            match outcome {
                StageOutcome::Continue(annotated) => face = annotated,
                StageOutcome::Reject(reason) => return FrameOutcome::Rejected(reason),
                StageOutcome::Fail(error) => return FrameOutcome::Failed(error),
            }
        }

        if let Some(embedding) = ctx.take_pending_record() {
            match self.cache.lock() {
                Ok(mut cache) => {
                    let id = cache.add(embedding);
                    log::debug!("recent face {id} recorded, cache size {}", cache.len());
                }
                Err(e) => return FrameOutcome::Failed(format!("cache lock poisoned: {e}").into()),
            }
        }

        FrameOutcome::Completed(face)
    }
}
