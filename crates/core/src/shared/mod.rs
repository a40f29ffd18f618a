pub mod constants;
pub mod embedding;
pub mod face_info;
pub mod frame;
