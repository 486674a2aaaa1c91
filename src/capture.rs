//! Screen capture behind a platform trait.
//!
//! The core validates selection geometry and stays platform-neutral; the
//! actual read of the display composition buffer lives behind
//! [`ScreenGrabber`], with a GDI implementation on Windows.

use log::debug;

use crate::error::CaptureError;
use crate::types::{MIN_SELECTION_SIZE, PixelBuffer, RectI32};

/// Platform seam for reading display pixels.
///
/// Implementations must perform a pure read of the composition buffer; the
/// host hides the selection overlay before calling so the overlay itself is
/// never captured.
pub trait ScreenGrabber {
    /// Bounds of the full virtual screen (union of all displays), with
    /// (0,0) at the virtual-screen origin used by the selection overlay.
    fn virtual_screen(&self) -> RectI32;

    /// Read `rect` from the display into a buffer of exactly
    /// `rect.width() x rect.height()` pixels.
    fn grab(&self, rect: RectI32) -> Result<PixelBuffer, CaptureError>;
}

/// Capture a validated region of the screen.
///
/// Rejects rectangles below the minimum selection size and rectangles lying
/// entirely outside the virtual screen before touching the platform.
pub fn capture_region(
    grabber: &dyn ScreenGrabber,
    rect: RectI32,
) -> Result<PixelBuffer, CaptureError> {
    if !rect.is_valid_min_size(MIN_SELECTION_SIZE) {
        return Err(CaptureError::InvalidSelection);
    }
    if !rect.intersects(&grabber.virtual_screen()) {
        return Err(CaptureError::OutOfBounds);
    }
    debug!(
        "capturing region {}x{} at ({}, {})",
        rect.width(),
        rect.height(),
        rect.left,
        rect.top
    );
    grabber.grab(rect)
}

#[cfg(windows)]
pub use gdi::GdiGrabber;

#[cfg(windows)]
mod gdi {
    use super::*;

    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC,
        DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, ReleaseDC, SRCCOPY, SelectObject,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
        SM_YVIRTUALSCREEN,
    };

    /// GDI-backed grabber reading 32-bit BGRA via BitBlt + GetDIBits.
    #[derive(Debug, Default)]
    pub struct GdiGrabber;

    impl ScreenGrabber for GdiGrabber {
        fn virtual_screen(&self) -> RectI32 {
            unsafe {
                let left = GetSystemMetrics(SM_XVIRTUALSCREEN);
                let top = GetSystemMetrics(SM_YVIRTUALSCREEN);
                let width = GetSystemMetrics(SM_CXVIRTUALSCREEN);
                let height = GetSystemMetrics(SM_CYVIRTUALSCREEN);
                RectI32::new(left, top, left + width, top + height)
            }
        }

        fn grab(&self, rect: RectI32) -> Result<PixelBuffer, CaptureError> {
            let width = rect.width();
            let height = rect.height();

            unsafe {
                let screen_dc = GetDC(Some(HWND(std::ptr::null_mut())));
                if screen_dc.is_invalid() {
                    return Err(CaptureError::AccessDenied(
                        "failed to get screen DC".to_string(),
                    ));
                }

                let mem_dc = CreateCompatibleDC(Some(screen_dc));
                if mem_dc.is_invalid() {
                    ReleaseDC(Some(HWND(std::ptr::null_mut())), screen_dc);
                    return Err(CaptureError::Platform(
                        "failed to create memory DC".to_string(),
                    ));
                }

                let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
                if bitmap.is_invalid() {
                    let _ = DeleteDC(mem_dc);
                    ReleaseDC(Some(HWND(std::ptr::null_mut())), screen_dc);
                    return Err(CaptureError::Platform("failed to create bitmap".to_string()));
                }

                let old_bitmap = SelectObject(mem_dc, bitmap.into());

                let blt = BitBlt(
                    mem_dc,
                    0,
                    0,
                    width,
                    height,
                    Some(screen_dc),
                    rect.left,
                    rect.top,
                    SRCCOPY,
                );

                SelectObject(mem_dc, old_bitmap);

                if blt.is_err() {
                    let _ = DeleteDC(mem_dc);
                    ReleaseDC(Some(HWND(std::ptr::null_mut())), screen_dc);
                    let _ = DeleteObject(bitmap.into());
                    return Err(CaptureError::Platform(
                        "failed to copy screen region".to_string(),
                    ));
                }

                let mut bmi = BITMAPINFO {
                    bmiHeader: BITMAPINFOHEADER {
                        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: width,
                        // Negative height requests a top-down bitmap.
                        biHeight: -height,
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        biSizeImage: 0,
                        biXPelsPerMeter: 0,
                        biYPelsPerMeter: 0,
                        biClrUsed: 0,
                        biClrImportant: 0,
                    },
                    bmiColors: [Default::default(); 1],
                };

                let data_size = (width as usize) * (height as usize) * 4;
                let mut bgra = vec![0u8; data_size];

                let lines_copied = GetDIBits(
                    screen_dc,
                    bitmap,
                    0,
                    height as u32,
                    Some(bgra.as_mut_ptr() as *mut std::ffi::c_void),
                    &mut bmi,
                    DIB_RGB_COLORS,
                );

                let _ = DeleteDC(mem_dc);
                ReleaseDC(Some(HWND(std::ptr::null_mut())), screen_dc);
                let _ = DeleteObject(bitmap.into());

                if lines_copied <= 0 {
                    return Err(CaptureError::Platform(
                        "failed to extract pixel data from bitmap".to_string(),
                    ));
                }

                // GDI delivers BGRA; the crate's buffer format is RGBA.
                for px in bgra.chunks_exact_mut(4) {
                    px.swap(0, 2);
                    px[3] = 0xFF;
                }

                PixelBuffer::from_rgba8(width as u32, height as u32, bgra).ok_or_else(|| {
                    CaptureError::Platform("bitmap size mismatch".to_string())
                })
            }
        }
    }
}
