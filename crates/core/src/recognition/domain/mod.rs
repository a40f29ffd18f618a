pub mod embedding_extractor;
pub mod face_detector;
pub mod frame_sink;
pub mod liveness_tracker;
pub mod recent_face_cache;
pub mod stage;
