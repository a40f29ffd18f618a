use crate::recognition::domain::stage::{RejectReason, Stage, StageContext, StageOutcome};
use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

/// Gates the chain on blink-based liveness evidence.
///
/// The stage itself is stateless; the per-track blink machine lives in the
/// session's [`LivenessTracker`](crate::recognition::domain::liveness_tracker::LivenessTracker)
/// reached through the context. Faces without a tracking identity can never
/// accumulate evidence and are rejected.
pub struct LiveStage;

impl LiveStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LiveStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for LiveStage {
    fn name(&self) -> &'static str {
        "live"
    }

    fn process(&self, _frame: &Frame, face: FaceInfo, ctx: &mut StageContext<'_>) -> StageOutcome {
        let Some(track_id) = face.track_id() else {
            return StageOutcome::Reject(RejectReason::NotLive);
        };
        if ctx.liveness_mut().observe(track_id, face.eyes_open()) {
            StageOutcome::Continue(face.mark_live())
        } else {
            StageOutcome::Reject(RejectReason::NotLive)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::liveness_tracker::LivenessTracker;
    use crate::recognition::domain::recent_face_cache::RecentFaceCache;
    use crate::shared::face_info::FaceRect;
    use std::sync::Mutex;

    fn frame() -> Frame {
        Frame::new(vec![0; 100 * 100 * 3], 100, 100, 3, 0)
    }

    fn face(track_id: Option<u32>, eyes: Option<(f32, f32)>) -> FaceInfo {
        let mut face = FaceInfo::new(FaceRect::new(0, 0, 50, 50), 0.0, 0.0, 0.0);
        if let Some(id) = track_id {
            face = face.with_track_id(id);
        }
        if let Some((l, r)) = eyes {
            face = face.with_eyes_open(l, r);
        }
        face
    }

    #[test]
    fn test_rejects_until_blink_completes() {
        let stage = LiveStage::new();
        let cache = Mutex::new(RecentFaceCache::new(4));
        let mut liveness = LivenessTracker::new(10, 5);
        let frame = frame();

        let mut ctx = StageContext::new(0.5, &cache, &mut liveness);
        assert!(matches!(
            stage.process(&frame, face(Some(1), Some((0.9, 0.9))), &mut ctx),
            StageOutcome::Reject(RejectReason::NotLive)
        ));
        assert!(matches!(
            stage.process(&frame, face(Some(1), Some((0.1, 0.1))), &mut ctx),
            StageOutcome::Reject(RejectReason::NotLive)
        ));

        match stage.process(&frame, face(Some(1), Some((0.9, 0.9))), &mut ctx) {
            StageOutcome::Continue(annotated) => assert!(annotated.is_live()),
            _ => panic!("expected the reopened face to pass"),
        }
    }

    #[test]
    fn test_untracked_face_rejected() {
        let stage = LiveStage::new();
        let cache = Mutex::new(RecentFaceCache::new(4));
        let mut liveness = LivenessTracker::new(10, 5);
        let mut ctx = StageContext::new(0.5, &cache, &mut liveness);

        assert!(matches!(
            stage.process(&frame(), face(None, Some((0.9, 0.9))), &mut ctx),
            StageOutcome::Reject(RejectReason::NotLive)
        ));
    }

    #[test]
    fn test_evidence_survives_across_contexts() {
        // Each frame gets a fresh StageContext but shares the session tracker.
        let stage = LiveStage::new();
        let cache = Mutex::new(RecentFaceCache::new(4));
        let mut liveness = LivenessTracker::new(10, 5);
        let frame = frame();

        {
            let mut ctx = StageContext::new(0.5, &cache, &mut liveness);
            stage.process(&frame, face(Some(1), Some((0.1, 0.1))), &mut ctx);
        }
        let mut ctx = StageContext::new(0.5, &cache, &mut liveness);
        assert!(matches!(
            stage.process(&frame, face(Some(1), Some((0.9, 0.9))), &mut ctx),
            StageOutcome::Continue(_)
        ));
    }
}
