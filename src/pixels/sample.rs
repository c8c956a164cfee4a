//! Numeric sample kinds and raw scalar decoding.
//!
//! Payload samples are serialized big-endian at one of six widths. The
//! [`Sample`] trait gives the conversion loop a single generic body: each
//! kind supplies its byte-level decode and its affine promotion rule, and
//! [`SampleKind`] dispatches to the right instantiation.

use byteorder::{BigEndian, ByteOrder};

use super::PixelError;

/// The closed set of numeric sample kinds a payload can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// 8-bit unsigned integer (width code 8)
    Int8,
    /// 16-bit signed integer (width code 16)
    Int16,
    /// 32-bit signed integer (width code 32)
    Int32,
    /// 64-bit signed integer (width code 64)
    Int64,
    /// 32-bit float (width code -32)
    Float32,
    /// 64-bit float (width code -64)
    Float64,
}

impl SampleKind {
    /// Decode a signed width code. Only {8, 16, 32, 64, -32, -64} are legal.
    pub fn from_width(code: i64) -> Result<Self, PixelError> {
        match code {
            8 => Ok(SampleKind::Int8),
            16 => Ok(SampleKind::Int16),
            32 => Ok(SampleKind::Int32),
            64 => Ok(SampleKind::Int64),
            -32 => Ok(SampleKind::Float32),
            -64 => Ok(SampleKind::Float64),
            other => Err(PixelError::UnsupportedWidth(other)),
        }
    }

    /// Size of one sample in bytes.
    pub fn byte_len(self) -> usize {
        match self {
            SampleKind::Int8 => 1,
            SampleKind::Int16 => 2,
            SampleKind::Int32 | SampleKind::Float32 => 4,
            SampleKind::Int64 | SampleKind::Float64 => 8,
        }
    }

    /// The signed width code this kind corresponds to.
    pub fn width_code(self) -> i64 {
        match self {
            SampleKind::Int8 => 8,
            SampleKind::Int16 => 16,
            SampleKind::Int32 => 32,
            SampleKind::Int64 => 64,
            SampleKind::Float32 => -32,
            SampleKind::Float64 => -64,
        }
    }
}

impl std::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SampleKind::Int8 => "int8",
            SampleKind::Int16 => "int16",
            SampleKind::Int32 => "int32",
            SampleKind::Int64 => "int64",
            SampleKind::Float32 => "float32",
            SampleKind::Float64 => "float64",
        };
        f.write_str(name)
    }
}

/// One native sample type: big-endian decode plus value-domain rules.
pub(crate) trait Sample: Copy {
    /// Size of one serialized sample.
    const BYTES: usize;

    /// Decode one sample from the start of `buf` (serialized order is fixed
    /// big-endian; decoding corrects byte order on little-endian hosts).
    fn read_be(buf: &[u8]) -> Self;

    /// Widen to the common float domain.
    fn to_f64(self) -> f64;

    /// Apply `zero + scale * value`, promoting integers to a float type wide
    /// enough to avoid precision loss: f32 for widths up to 32 bits, f64 for
    /// 64-bit values.
    fn affine(self, zero: f64, scale: f64) -> f64;
}

impl Sample for u8 {
    const BYTES: usize = 1;

    fn read_be(buf: &[u8]) -> Self {
        buf[0]
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn affine(self, zero: f64, scale: f64) -> f64 {
        f64::from(zero as f32 + scale as f32 * f32::from(self))
    }
}

impl Sample for i16 {
    const BYTES: usize = 2;

    fn read_be(buf: &[u8]) -> Self {
        BigEndian::read_i16(buf)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn affine(self, zero: f64, scale: f64) -> f64 {
        f64::from(zero as f32 + scale as f32 * f32::from(self))
    }
}

impl Sample for i32 {
    const BYTES: usize = 4;

    fn read_be(buf: &[u8]) -> Self {
        BigEndian::read_i32(buf)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn affine(self, zero: f64, scale: f64) -> f64 {
        f64::from(zero as f32 + scale as f32 * self as f32)
    }
}

impl Sample for i64 {
    const BYTES: usize = 8;

    fn read_be(buf: &[u8]) -> Self {
        BigEndian::read_i64(buf)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn affine(self, zero: f64, scale: f64) -> f64 {
        zero + scale * self as f64
    }
}

impl Sample for f32 {
    const BYTES: usize = 4;

    fn read_be(buf: &[u8]) -> Self {
        BigEndian::read_f32(buf)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn affine(self, zero: f64, scale: f64) -> f64 {
        f64::from(zero as f32 + scale as f32 * self)
    }
}

impl Sample for f64 {
    const BYTES: usize = 8;

    fn read_be(buf: &[u8]) -> Self {
        BigEndian::read_f64(buf)
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn affine(self, zero: f64, scale: f64) -> f64 {
        zero + scale * self
    }
}

/// Run `op` with the [`Sample`] instantiation matching `kind`.
macro_rules! dispatch_sample {
    ($kind:expr, $ty:ident, $body:expr) => {
        match $kind {
            $crate::pixels::sample::SampleKind::Int8 => {
                type $ty = u8;
                $body
            }
            $crate::pixels::sample::SampleKind::Int16 => {
                type $ty = i16;
                $body
            }
            $crate::pixels::sample::SampleKind::Int32 => {
                type $ty = i32;
                $body
            }
            $crate::pixels::sample::SampleKind::Int64 => {
                type $ty = i64;
                $body
            }
            $crate::pixels::sample::SampleKind::Float32 => {
                type $ty = f32;
                $body
            }
            $crate::pixels::sample::SampleKind::Float64 => {
                type $ty = f64;
                $body
            }
        }
    };
}

pub(crate) use dispatch_sample;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_six_width_codes_are_accepted() {
        for code in [8, 16, 32, 64, -32, -64] {
            assert!(SampleKind::from_width(code).is_ok(), "code {code}");
        }
        for code in [0, 1, -8, 24, 128, -16, 7] {
            assert!(
                matches!(
                    SampleKind::from_width(code),
                    Err(PixelError::UnsupportedWidth(c)) if c == code
                ),
                "code {code}"
            );
        }
    }

    #[test]
    fn big_endian_decode() {
        assert_eq!(u8::read_be(&[0x2a]), 42);
        assert_eq!(i16::read_be(&[0xff, 0xfe]), -2);
        assert_eq!(i32::read_be(&[0x00, 0x00, 0x01, 0x00]), 256);
        assert_eq!(i64::read_be(&[0, 0, 0, 0, 0, 0, 0, 9]), 9);
        assert_eq!(f32::read_be(&1.5f32.to_be_bytes()), 1.5);
        assert_eq!(f64::read_be(&(-2.25f64).to_be_bytes()), -2.25);
    }

    #[test]
    fn affine_promotes_per_width() {
        // 16-bit path runs in f32.
        let v = i16::affine(100, 0.5, 2.0);
        assert_eq!(v, f64::from(0.5f32 + 2.0f32 * 100.0f32));

        // 64-bit path must stay in f64 to keep precision.
        let big = 1_i64 << 53;
        assert_eq!(i64::affine(big, 1.0, 1.0), 1.0 + big as f64);
    }

    #[test]
    fn width_code_roundtrip() {
        for code in [8, 16, 32, 64, -32, -64] {
            let kind = SampleKind::from_width(code).unwrap();
            assert_eq!(kind.width_code(), code);
            assert_eq!(kind.byte_len() as i64, code.abs() / 8);
        }
    }
}
