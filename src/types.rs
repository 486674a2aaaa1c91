use std::io::Cursor;

use anyhow::Result;
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Minimum selection size (in device-independent units).
///
/// This is a core interaction rule shared by the selection reducer and the
/// capture precondition so the two cannot drift apart.
pub const MIN_SELECTION_SIZE: i32 = 10;

/// Canonical result text when recognition finds nothing usable.
pub const NO_TEXT_PLACEHOLDER: &str = "No text detected in the image.";

/// Platform-neutral integer rectangle in virtual-screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectI32 {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RectI32 {
    #[inline]
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Construct a normalized rectangle from two points.
    #[inline]
    pub fn from_points(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            left: x1.min(x2),
            top: y1.min(y2),
            right: x1.max(x2),
            bottom: y1.max(y2),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True if both width and height are at least `min_size`.
    #[inline]
    pub fn is_valid_min_size(&self, min_size: i32) -> bool {
        self.width() >= min_size && self.height() >= min_size
    }

    /// True if the two rectangles share any area.
    #[inline]
    pub fn intersects(&self, other: &RectI32) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Decoded bitmap: dimensions plus row-major RGBA8 pixel data.
///
/// A buffer is single-owner and replace-only; once handed to the extraction
/// pipeline it is read through a frozen `Arc` and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Build a buffer from raw RGBA8 data. Returns `None` when the data
    /// length does not match `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Build a buffer from any decoded image, converting to RGBA8.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Encode as PNG. Lossless, so the engine sees exactly the captured
    /// pixels.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let img = RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| anyhow::anyhow!("pixel data does not match dimensions"))?;
        let mut encoded = Vec::new();
        DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;
        Ok(encoded)
    }
}

/// One OCR extraction outcome. Immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    /// Mean confidence over all recognized text, 0-100.
    pub confidence: f32,
    /// Recognized text, or [`NO_TEXT_PLACEHOLDER`] when nothing was found.
    pub text: String,
}

impl OcrResult {
    /// Render the ready-to-display artifact: confidence first, then the
    /// trimmed text.
    pub fn render(&self) -> String {
        format!("Confidence: {:.2}%\n\n{}", self.confidence, self.text)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_normalizes_any_corner_order() {
        let expected = RectI32::new(10, 20, 110, 220);
        assert_eq!(RectI32::from_points(10, 20, 110, 220), expected);
        assert_eq!(RectI32::from_points(110, 220, 10, 20), expected);
        assert_eq!(RectI32::from_points(110, 20, 10, 220), expected);
    }

    #[test]
    fn min_size_check_uses_both_dimensions() {
        let wide = RectI32::new(0, 0, 300, 5);
        assert!(!wide.is_valid_min_size(MIN_SELECTION_SIZE));
        let ok = RectI32::new(0, 0, 10, 10);
        assert!(ok.is_valid_min_size(MIN_SELECTION_SIZE));
    }

    #[test]
    fn intersects_rejects_fully_disjoint_rects() {
        let screen = RectI32::new(0, 0, 1920, 1080);
        assert!(RectI32::new(100, 100, 400, 150).intersects(&screen));
        assert!(!RectI32::new(2000, 0, 2100, 100).intersects(&screen));
        // Edge-touching rectangles share no area.
        assert!(!RectI32::new(1920, 0, 2000, 100).intersects(&screen));
    }

    #[test]
    fn pixel_buffer_rejects_mismatched_data() {
        assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 16]).is_some());
        assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn png_encode_preserves_pixels() {
        let data: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
        let buf = PixelBuffer::from_rgba8(4, 4, data.clone()).unwrap();
        let encoded = buf.encode_png().unwrap();

        let decoded = image::load_from_memory(&encoded).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.into_raw(), data);
    }

    #[test]
    fn render_puts_confidence_before_trimmed_text() {
        let result = OcrResult {
            confidence: 91.5,
            text: "hello world".to_string(),
        };
        assert_eq!(result.render(), "Confidence: 91.50%\n\nhello world");
    }
}
