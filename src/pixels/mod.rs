//! Pixel decoding and normalization.
//!
//! This is the rendering half of the crate: it turns a unit's raw payload
//! bytes into RGB pixel buffers. The pipeline per sample is
//!
//! 1. big-endian decode at the native width,
//! 2. affine rescale (`zero + scale * value`) with width-aware float
//!    promotion,
//! 3. optional linear remap into a transform's target interval, using either
//!    the global min/max or a percentile-stretched range,
//! 4. a fixed three-band color ramp (blue-dominant low, green-dominant mid,
//!    red-dominant high) into 8-bit RGB.
//!
//! Rows are processed bottom-up (payload row 0 is the bottom of the image)
//! and rows that would read past the valid end of a truncated payload are
//! left black instead of failing the decode.

mod codec;
mod ops;
pub(crate) mod sample;
mod stretch;

pub use codec::{DecodedImage, Transform};
pub use ops::{Channel, ChannelStats};
pub use sample::SampleKind;
pub use stretch::{Distribution, DISTRIBUTION_BUCKETS};

/// Errors raised while decoding pixel data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixelError {
    /// The signed sample width code is not one of {8, 16, 32, 64, -32, -64}
    #[error("unsupported sample width code {0}")]
    UnsupportedWidth(i64),

    /// Width, height and sample size do not describe an addressable buffer
    #[error("image geometry {width}x{height} at {sample_bytes} bytes per sample overflows")]
    Geometry {
        /// Requested width in samples
        width: usize,
        /// Requested height in samples
        height: usize,
        /// Size of one sample
        sample_bytes: usize,
    },
}
