//! Ownership of the single current image.
//!
//! The source holds at most one buffer at a time, coming from either a
//! screen capture or a file load. Buffers are replace-only: readers take a
//! frozen `Arc` snapshot, so a `clear()` or reload on the interactive thread
//! cannot corrupt an in-flight OCR read.

use std::path::Path;
use std::sync::Arc;

use log::warn;

use crate::error::LoadError;
use crate::types::PixelBuffer;

/// Raster formats accepted by [`ImageSource::set_from_file`].
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif"];

/// Owner of the current image buffer.
#[derive(Debug, Default)]
pub struct ImageSource {
    current: Option<Arc<PixelBuffer>>,
}

impl ImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held buffer with a freshly captured one. The previous
    /// buffer is released (in-flight readers keep their own snapshot).
    pub fn set_from_capture(&mut self, buf: PixelBuffer) {
        self.current = Some(Arc::new(buf));
    }

    /// Replace the held buffer with a decoded image file.
    ///
    /// On any failure the previously held buffer stays untouched so the
    /// user can retry.
    pub fn set_from_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(LoadError::UnsupportedFormat(ext));
        }

        let img = image::open(path).map_err(|e| {
            warn!("failed to load {}: {e}", path.display());
            match e {
                image::ImageError::IoError(source) => LoadError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                },
                image::ImageError::Unsupported(err) => LoadError::UnsupportedFormat(err.to_string()),
                other => LoadError::Corrupt(other.to_string()),
            }
        })?;

        self.current = Some(Arc::new(PixelBuffer::from_dynamic(img)));
        Ok(())
    }

    /// Read-only snapshot of the current buffer, if any.
    pub fn current(&self) -> Option<Arc<PixelBuffer>> {
        self.current.clone()
    }

    /// Release the held buffer.
    pub fn clear(&mut self) {
        self.current = None;
    }
}
