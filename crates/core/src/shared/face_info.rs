use crate::shared::embedding::Embedding;

/// Yaw beyond which a face counts as a profile view rather than frontal.
const PROFILE_YAW_DEGREES: f32 = 20.0;

/// A detection rectangle in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle area in pixels; degenerate rectangles count as zero.
    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Fraction of a `frame_width` x `frame_height` frame this rectangle
    /// covers, in `[0, 1]` for an in-bounds rectangle.
    pub fn area_ratio(&self, frame_width: u32, frame_height: u32) -> f64 {
        let frame_area = frame_width as f64 * frame_height as f64;
        if frame_area == 0.0 {
            return 0.0;
        }
        self.area() as f64 / frame_area
    }

    /// Intersects the rectangle with the frame bounds.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> FaceRect {
        let x1 = self.x.clamp(0, frame_width as i32);
        let y1 = self.y.clamp(0, frame_height as i32);
        let x2 = (self.x + self.width).clamp(0, frame_width as i32);
        let y2 = (self.y + self.height).clamp(0, frame_height as i32);
        FaceRect::new(x1, y1, (x2 - x1).max(0), (y2 - y1).max(0))
    }
}

/// Coarse head orientation derived from yaw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceType {
    Frontal,
    ProfileLeft,
    ProfileRight,
}

impl FaceType {
    pub fn from_yaw(yaw: f32) -> Self {
        if yaw < -PROFILE_YAW_DEGREES {
            FaceType::ProfileLeft
        } else if yaw > PROFILE_YAW_DEGREES {
            FaceType::ProfileRight
        } else {
            FaceType::Frontal
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FaceType::Frontal => "frontal",
            FaceType::ProfileLeft => "profile-left",
            FaceType::ProfileRight => "profile-right",
        }
    }
}

impl std::fmt::Display for FaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of comparing a fresh embedding against the recent-face cache.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    /// Id of the matched record; `None` when unmatched.
    pub record_id: Option<u64>,
    /// Distance to the nearest record, `f64::INFINITY` for an empty cache.
    pub difference: f64,
}

/// A detected face within one frame.
///
/// Geometry and pose are fixed by detection; pipeline stages attach derived
/// annotations (embedding, liveness, match result) but never alter the
/// detection itself.
#[derive(Clone, Debug)]
pub struct FaceInfo {
    rect: FaceRect,
    yaw: f32,
    pitch: f32,
    roll: f32,
    face_type: FaceType,
    landmarks: Option<[(f64, f64); 5]>,
    track_id: Option<u32>,
    eyes_open: Option<(f32, f32)>,
    embedding: Option<Embedding>,
    live: bool,
    match_result: Option<MatchResult>,
}

impl FaceInfo {
    pub fn new(rect: FaceRect, yaw: f32, pitch: f32, roll: f32) -> Self {
        Self {
            rect,
            yaw,
            pitch,
            roll,
            face_type: FaceType::from_yaw(yaw),
            landmarks: None,
            track_id: None,
            eyes_open: None,
            embedding: None,
            live: false,
            match_result: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: [(f64, f64); 5]) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_track_id(mut self, track_id: u32) -> Self {
        self.track_id = Some(track_id);
        self
    }

    /// Left/right eye-open probabilities reported by the detector.
    pub fn with_eyes_open(mut self, left: f32, right: f32) -> Self {
        self.eyes_open = Some((left, right));
        self
    }

    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn mark_live(mut self) -> Self {
        self.live = true;
        self
    }

    pub fn with_match(mut self, result: MatchResult) -> Self {
        self.match_result = Some(result);
        self
    }

    pub fn rect(&self) -> &FaceRect {
        &self.rect
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    pub fn face_type(&self) -> FaceType {
        self.face_type
    }

    pub fn landmarks(&self) -> Option<&[(f64, f64); 5]> {
        self.landmarks.as_ref()
    }

    pub fn track_id(&self) -> Option<u32> {
        self.track_id
    }

    pub fn eyes_open(&self) -> Option<(f32, f32)> {
        self.eyes_open
    }

    pub fn embedding(&self) -> Option<&Embedding> {
        self.embedding.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn match_result(&self) -> Option<&MatchResult> {
        self.match_result.as_ref()
    }
}
