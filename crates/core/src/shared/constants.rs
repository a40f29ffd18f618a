pub const EMBEDDING_MODEL_NAME: &str = "mobilefacenet.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/facerecog/facerecog/releases/download/v0.1.0/mobilefacenet.onnx";

/// MobileFaceNet output vector length.
pub const EMBEDDING_LEN: usize = 192;

/// Model input is a square RGB crop of this side length.
pub const EMBEDDING_INPUT_SIZE: usize = 112;

pub const EMBEDDING_NORM_MEAN: f32 = 128.0;
pub const EMBEDDING_NORM_STD: f32 = 128.0;

/// Frames allowed for a blink to show up before liveness evidence resets
/// (~3 seconds at 30 fps).
pub const LIVENESS_WINDOW_FRAMES: usize = 90;

/// Max frames a tracked face can go unseen before its liveness state is
/// discarded (~1 second at 30 fps).
pub const LIVENESS_MAX_LOST: usize = 30;

/// Eye-open probability at or above which an eye counts as open.
pub const EYE_OPEN_THRESHOLD: f32 = 0.6;

/// Eye-open probability at or below which an eye counts as closed.
pub const EYE_CLOSED_THRESHOLD: f32 = 0.3;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.70;

pub const DEFAULT_MIN_FACE_RATIO: f64 = 0.10;
pub const DEFAULT_MAX_FACE_RATIO: f64 = 0.75;

pub const DEFAULT_MAX_ROLL_DEGREES: f32 = 20.0;

pub const DEFAULT_CACHE_CAPACITY: usize = 16;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
