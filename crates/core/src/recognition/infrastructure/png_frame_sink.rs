use std::path::Path;

use crate::recognition::domain::frame_sink::FrameSink;
use crate::shared::frame::Frame;

/// Writes a frame to an image file using the `image` crate; the format
/// follows the path's extension.
pub struct PngFrameSink;

impl PngFrameSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PngFrameSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for PngFrameSink {
    fn write(
        &self,
        frame: &Frame,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }

        // Ensure parent directory exists (infrastructure concern)
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        img.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, r: u8, g: u8, b: u8) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.push(r);
            data.push(g);
            data.push(b);
        }
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = make_frame(100, 80, 50, 100, 200);
        let sink = PngFrameSink::new();
        sink.write(&frame, &path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = make_frame(50, 50, 50, 100, 200);
        let sink = PngFrameSink::new();
        sink.write(&frame, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.width(), 50);
        assert_eq!(img.height(), 50);
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_write_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.png");
        let frame = make_frame(10, 10, 0, 0, 0);
        let sink = PngFrameSink::new();
        sink.write(&frame, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_non_rgb_frame_is_rejected() {
        let frame = Frame::new(vec![0; 10 * 10], 10, 10, 1, 0);
        let sink = PngFrameSink::new();
        let dir = tempfile::tempdir().unwrap();
        assert!(sink.write(&frame, &dir.path().join("out.png")).is_err());
    }
}
