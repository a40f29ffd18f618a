use crate::recognition::domain::stage::{Stage, StageContext, StageOutcome};
use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

/// When an unmatched-only policy should still insert the face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddRecordPolicy {
    /// Insert every face that reaches this stage.
    Always,
    /// Insert only faces the comparison did not recognize, so the cache
    /// learns new faces without filling up with duplicates.
    UnmatchedOnly,
}

/// Stages the current embedding for insertion into the recent-face cache.
///
/// The insertion itself is committed by the engine after the whole chain
/// completes, so a rejection or failure later in the chain never leaves a
/// half-processed frame in the cache.
pub struct AddRecordStage {
    policy: AddRecordPolicy,
}

impl AddRecordStage {
    pub fn new(policy: AddRecordPolicy) -> Self {
        Self { policy }
    }
}

impl Default for AddRecordStage {
    fn default() -> Self {
        Self::new(AddRecordPolicy::Always)
    }
}

impl Stage for AddRecordStage {
    fn name(&self) -> &'static str {
        "add_record"
    }

    fn process(&self, _frame: &Frame, face: FaceInfo, ctx: &mut StageContext<'_>) -> StageOutcome {
        let Some(embedding) = face.embedding() else {
            return StageOutcome::Fail("no embedding attached before record insertion".into());
        };

        let should_add = match self.policy {
            AddRecordPolicy::Always => true,
            AddRecordPolicy::UnmatchedOnly => {
                face.match_result().map_or(true, |result| !result.matched)
            }
        };
        if should_add {
            ctx.stage_record(embedding.clone());
        }
        StageOutcome::Continue(face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::liveness_tracker::LivenessTracker;
    use crate::recognition::domain::recent_face_cache::RecentFaceCache;
    use crate::shared::constants::EMBEDDING_LEN;
    use crate::shared::embedding::Embedding;
    use crate::shared::face_info::{FaceRect, MatchResult};
    use std::sync::Mutex;

    fn embedding() -> Embedding {
        let mut v = vec![0.0f32; EMBEDDING_LEN];
        v[0] = 1.0;
        Embedding::new(v).unwrap()
    }

    fn frame() -> Frame {
        Frame::new(vec![0; 100 * 100 * 3], 100, 100, 3, 0)
    }

    fn face(matched: Option<bool>) -> FaceInfo {
        let mut face =
            FaceInfo::new(FaceRect::new(0, 0, 50, 50), 0.0, 0.0, 0.0).with_embedding(embedding());
        if let Some(matched) = matched {
            face = face.with_match(MatchResult {
                matched,
                record_id: matched.then_some(1),
                difference: 0.1,
            });
        }
        face
    }

    fn staged_after(stage: &AddRecordStage, face: FaceInfo) -> bool {
        let cache = Mutex::new(RecentFaceCache::new(4));
        let mut liveness = LivenessTracker::new(10, 5);
        let mut ctx = StageContext::new(0.5, &cache, &mut liveness);
        let outcome = stage.process(&frame(), face, &mut ctx);
        assert!(matches!(outcome, StageOutcome::Continue(_)));
        ctx.take_pending_record().is_some()
    }

    #[test]
    fn test_always_policy_stages_record() {
        let stage = AddRecordStage::new(AddRecordPolicy::Always);
        assert!(staged_after(&stage, face(Some(true))));
        assert!(staged_after(&stage, face(Some(false))));
        assert!(staged_after(&stage, face(None)));
    }

    #[test]
    fn test_unmatched_only_skips_recognized_faces() {
        let stage = AddRecordStage::new(AddRecordPolicy::UnmatchedOnly);
        assert!(!staged_after(&stage, face(Some(true))));
        assert!(staged_after(&stage, face(Some(false))));
        // No comparison ran at all: treat as unrecognized.
        assert!(staged_after(&stage, face(None)));
    }

    #[test]
    fn test_stage_does_not_touch_cache_directly() {
        let stage = AddRecordStage::default();
        let cache = Mutex::new(RecentFaceCache::new(4));
        let mut liveness = LivenessTracker::new(10, 5);
        let mut ctx = StageContext::new(0.5, &cache, &mut liveness);

        stage.process(&frame(), face(None), &mut ctx);
        // Only staged; commit is the engine's call.
        assert_eq!(cache.lock().unwrap().len(), 0);
        assert!(ctx.take_pending_record().is_some());
    }

    #[test]
    fn test_missing_embedding_fails() {
        let stage = AddRecordStage::default();
        let cache = Mutex::new(RecentFaceCache::new(4));
        let mut liveness = LivenessTracker::new(10, 5);
        let mut ctx = StageContext::new(0.5, &cache, &mut liveness);

        let bare = FaceInfo::new(FaceRect::new(0, 0, 50, 50), 0.0, 0.0, 0.0);
        assert!(matches!(
            stage.process(&frame(), bare, &mut ctx),
            StageOutcome::Fail(_)
        ));
    }
}
