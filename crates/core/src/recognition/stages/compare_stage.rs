use crate::recognition::domain::recent_face_cache::CompareScope;
use crate::recognition::domain::stage::{RejectReason, Stage, StageContext, StageOutcome};
use crate::shared::face_info::{FaceInfo, MatchResult};
use crate::shared::frame::Frame;

/// Compares the fresh embedding against the recent-face cache and attaches
/// the verdict.
///
/// Nearest neighbor wins; a distance at or below the configured threshold is
/// a match. Against an empty cache the face is always unmatched with an
/// infinite difference. In `reject_unmatched` mode an unmatched face is
/// rejected instead of forwarded, which keeps later stages (export, record
/// insertion) reserved for recognized faces.
pub struct CompareStage {
    scope: CompareScope,
    reject_unmatched: bool,
}

impl CompareStage {
    pub fn new(scope: CompareScope) -> Self {
        Self {
            scope,
            reject_unmatched: false,
        }
    }

    pub fn with_reject_unmatched(mut self, reject_unmatched: bool) -> Self {
        self.reject_unmatched = reject_unmatched;
        self
    }
}

impl Stage for CompareStage {
    fn name(&self) -> &'static str {
        "compare"
    }

    fn process(&self, _frame: &Frame, face: FaceInfo, ctx: &mut StageContext<'_>) -> StageOutcome {
        let Some(embedding) = face.embedding() else {
            return StageOutcome::Fail("no embedding attached before comparison".into());
        };

        let best = match ctx.cache().lock() {
            Ok(cache) => cache.best_match(embedding, self.scope),
            Err(e) => return StageOutcome::Fail(format!("cache lock poisoned: {e}").into()),
        };

        let result = match best {
            Some((id, distance)) if distance <= ctx.threshold() => MatchResult {
                matched: true,
                record_id: Some(id),
                difference: distance,
            },
            Some((_, distance)) => MatchResult {
                matched: false,
                record_id: None,
                difference: distance,
            },
            None => MatchResult {
                matched: false,
                record_id: None,
                difference: f64::INFINITY,
            },
        };

        if !result.matched && self.reject_unmatched {
            return StageOutcome::Reject(RejectReason::BelowThreshold);
        }
        StageOutcome::Continue(face.with_match(result))
    }
}
