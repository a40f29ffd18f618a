use std::sync::Mutex;

use crate::recognition::domain::liveness_tracker::LivenessTracker;
use crate::recognition::domain::recent_face_cache::RecentFaceCache;
use crate::shared::embedding::Embedding;
use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

pub type StageError = Box<dyn std::error::Error + Send + Sync>;

/// Expected per-frame rejections. Non-fatal: the pipeline keeps accepting
/// frames, the caller sees a failure event with the reason string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    NoFace,
    SizeOutOfRange,
    AngleOutOfRange,
    NotLive,
    BelowThreshold,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RejectReason::NoFace => "no face",
            RejectReason::SizeOutOfRange => "size out of range",
            RejectReason::AngleOutOfRange => "angle out of range",
            RejectReason::NotLive => "not live",
            RejectReason::BelowThreshold => "below similarity threshold",
        };
        f.write_str(text)
    }
}

/// What a stage decided about the current frame's face.
pub enum StageOutcome {
    /// Hand the (possibly annotated) face to the next stage.
    Continue(FaceInfo),
    /// Stop the chain for this frame only.
    Reject(RejectReason),
    /// Underlying error (inference, I/O); stops the chain for this frame.
    Fail(StageError),
}

/// Per-frame execution context handed to every stage.
///
/// Carries the configured threshold, shared access to the recent-face cache,
/// and the session's liveness state, so stage instances themselves stay
/// stateless. Cache insertion is deferred: a stage records the embedding
/// here and the engine commits it only after the whole chain continued to
/// completion, keeping rejected and failed frames out of the cache.
pub struct StageContext<'a> {
    threshold: f64,
    cache: &'a Mutex<RecentFaceCache>,
    liveness: &'a mut LivenessTracker,
    pending_record: Option<Embedding>,
}

impl<'a> StageContext<'a> {
    pub fn new(
        threshold: f64,
        cache: &'a Mutex<RecentFaceCache>,
        liveness: &'a mut LivenessTracker,
    ) -> Self {
        Self {
            threshold,
            cache,
            liveness,
            pending_record: None,
        }
    }

    /// Similarity threshold from the configuration snapshot this frame runs
    /// against.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn cache(&self) -> &Mutex<RecentFaceCache> {
        self.cache
    }

    pub fn liveness_mut(&mut self) -> &mut LivenessTracker {
        self.liveness
    }

    /// Stages an embedding for insertion into the cache.
    pub fn stage_record(&mut self, embedding: Embedding) {
        self.pending_record = Some(embedding);
    }

    /// Drained by the engine once the traversal completed.
    pub fn take_pending_record(&mut self) -> Option<Embedding> {
        self.pending_record.take()
    }
}

/// One composable step in the per-frame processing chain.
///
/// Stages run strictly in configuration order on a single worker; they must
/// not hold per-frame state across calls (cross-frame state belongs in the
/// session structures reached through [`StageContext`]).
pub trait Stage: Send + Sync {
    /// Short identifier used for timing and diagnostics.
    fn name(&self) -> &'static str;

    fn process(&self, frame: &Frame, face: FaceInfo, ctx: &mut StageContext<'_>) -> StageOutcome;
}
