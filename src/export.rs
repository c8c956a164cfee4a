//! The seam to the external image-file encoder.
//!
//! The crate never writes raster files itself; it hands a finished frame to
//! an injected [`ImageEncoder`]. The CLI ships a plain PPM implementation
//! and tests use collecting encoders.

/// Color interpretation of a frame's pixel bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Three distinct color channels
    Rgb,
    /// Channels carry identical gray values; encoders may collapse them
    Grayscale,
}

/// One finished image handed to an encoder: packed 24-bit RGB rows, top row
/// first.
#[derive(Debug)]
pub struct Frame<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bits per channel (always 8 for this crate's output).
    pub bit_depth: u8,
    /// Color interpretation.
    pub color: ColorMode,
    /// Packed RGB bytes, `width * height * 3` long.
    pub pixels: &'a [u8],
}

/// An external image-file encoder.
pub trait ImageEncoder {
    /// Encode one frame, returning the underlying I/O failure on error.
    fn encode(&mut self, frame: &Frame<'_>) -> std::io::Result<()>;
}

impl<T: ImageEncoder + ?Sized> ImageEncoder for &mut T {
    fn encode(&mut self, frame: &Frame<'_>) -> std::io::Result<()> {
        (**self).encode(frame)
    }
}
