use std::path::Path;

use crate::shared::frame::Frame;

/// Write-or-fail contract for exporting a frame image to external storage.
pub trait FrameSink: Send + Sync {
    fn write(
        &self,
        frame: &Frame,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
