//! The decoded image and its conversion loop.

use log::debug;

use super::sample::{dispatch_sample, Sample, SampleKind};
use super::stretch::Distribution;
use super::PixelError;

/// Requested linear remap of sample values before coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// Leave values in their source range
    #[default]
    None,
    /// Remap into [0, 1]
    LinearPositive,
    /// Remap into [-1, 1]
    LinearNegativePositive,
    /// Remap into [-1, 0]
    LinearNegative,
}

impl Transform {
    /// Target interval of the remap, or `None` for the identity.
    pub fn interval(self) -> Option<(f64, f64)> {
        match self {
            Transform::None => None,
            Transform::LinearPositive => Some((0.0, 1.0)),
            Transform::LinearNegativePositive => Some((-1.0, 1.0)),
            Transform::LinearNegative => Some((-1.0, 0.0)),
        }
    }
}

/// Number of output channels in the flat buffer (RGB plus filler byte).
const FLAT_CHANNELS: usize = 4;

/// One unit's payload decoded into an RGB pixel buffer.
///
/// A `DecodedImage` borrows the payload bytes from the mapped buffer that
/// owns them; it never copies payload data. Each selected unit gets its own
/// independent instance, so no decoding state is shared between units.
pub struct DecodedImage<'a> {
    payload: &'a [u8],
    width: usize,
    height: usize,
    kind: SampleKind,
    zero: f64,
    scale: f64,
    /// Highest payload offset that may be read. Rows past it stay black;
    /// this is the defense against declared sizes exceeding the mapped file.
    max_valid: usize,
    pub(super) minmax: Option<(f64, f64)>,
    pub(super) distribution: Option<Distribution>,
    pub(super) stretch_passes: usize,
    pub(super) pixels: Vec<u8>,
    pub(super) backup: Option<Vec<u8>>,
}

impl<'a> DecodedImage<'a> {
    /// Wrap a raw payload for decoding.
    ///
    /// `payload` must already be clipped to the bytes actually present in
    /// the mapped buffer; `width`/`height` come from the unit's declared
    /// axes and may describe more data than `payload` holds.
    pub fn new(
        payload: &'a [u8],
        width: usize,
        height: usize,
        kind: SampleKind,
        zero: f64,
        scale: f64,
    ) -> Result<Self, PixelError> {
        // The full geometry must be addressable even though reads are
        // clipped, otherwise row offset arithmetic could overflow.
        let geometry = PixelError::Geometry {
            width,
            height,
            sample_bytes: kind.byte_len(),
        };
        let samples = width.checked_mul(height).ok_or(geometry.clone())?;
        samples.checked_mul(kind.byte_len()).ok_or(geometry.clone())?;
        samples.checked_mul(FLAT_CHANNELS).ok_or(geometry)?;

        Ok(Self {
            payload,
            width,
            height,
            kind,
            zero,
            scale,
            max_valid: payload.len(),
            minmax: None,
            distribution: None,
            stretch_passes: 0,
            pixels: Vec::new(),
            backup: None,
        })
    }

    /// Image width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample kind of the payload.
    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Affine zero/scale pair in effect.
    pub fn affine(&self) -> (f64, f64) {
        (self.zero, self.scale)
    }

    /// The borrowed payload bytes.
    pub(super) fn payload(&self) -> &[u8] {
        self.payload
    }

    /// Highest readable payload offset.
    pub(super) fn max_valid(&self) -> usize {
        self.max_valid
    }

    /// Number of samples that can actually be read from the payload.
    pub(super) fn readable_samples(&self) -> usize {
        (self.width * self.height).min(self.max_valid / self.kind.byte_len())
    }

    /// Render the payload into the flat 32-bit pixel buffer.
    ///
    /// `stretch_threshold` selects the percentile auto-stretched range in
    /// place of the raw global min/max (0 reproduces the raw range exactly).
    /// `progress` is invoked with a 0–100 percentage at coarse checkpoints.
    pub fn render(
        &mut self,
        transform: Transform,
        stretch_threshold: Option<f64>,
        mut progress: Option<&mut dyn FnMut(u8)>,
    ) -> Result<(), PixelError> {
        let range = match stretch_threshold {
            Some(threshold) => self.stretch_range(threshold)?,
            None => self.min_max()?,
        };

        debug!(
            "rendering {}x{} {} samples over [{}, {}]",
            self.width, self.height, self.kind, range.0, range.1
        );

        self.pixels = vec![0u8; self.width * self.height * FLAT_CHANNELS];
        if let Some(cb) = progress.as_deref_mut() {
            cb(0);
        }

        dispatch_sample!(self.kind, T, self.render_rows::<T>(range, transform, progress));
        Ok(())
    }

    /// The generic conversion loop, instantiated once per sample kind.
    fn render_rows<T: Sample>(
        &mut self,
        (lo, hi): (f64, f64),
        transform: Transform,
        mut progress: Option<&mut dyn FnMut(u8)>,
    ) {
        let row_bytes = self.width * T::BYTES;
        let span = hi - lo;
        let affine = self.scale != 1.0 || self.zero != 0.0;
        let report_every = (self.height / 10).max(1);

        for out_y in 0..self.height {
            // Payload row 0 is the bottom of the image.
            let src_y = self.height - 1 - out_y;
            let row_start = src_y * row_bytes;
            if row_start + row_bytes > self.max_valid {
                // Truncated payload: the output row stays black.
                continue;
            }

            for x in 0..self.width {
                let raw = T::read_be(&self.payload[row_start + x * T::BYTES..]);
                let value = if affine {
                    raw.affine(self.zero, self.scale)
                } else {
                    raw.to_f64()
                };
                if !value.is_finite() {
                    continue;
                }

                let pos = if span > 0.0 {
                    ((value - lo) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                // Remap into the transform's target interval; the ramp runs
                // over the value's position within that interval.
                let pos = match transform.interval() {
                    Some((a, b)) => {
                        let remapped = a + pos * (b - a);
                        (remapped - a) / (b - a)
                    }
                    None => pos,
                };

                let [r, g, b] = color_ramp(pos);
                let out = (out_y * self.width + x) * FLAT_CHANNELS;
                self.pixels[out] = r;
                self.pixels[out + 1] = g;
                self.pixels[out + 2] = b;
                self.pixels[out + 3] = 0xff;
            }

            if out_y % report_every == 0 {
                if let Some(cb) = progress.as_deref_mut() {
                    cb((out_y * 100 / self.height) as u8);
                }
            }
        }

        if let Some(cb) = progress.as_deref_mut() {
            cb(100);
        }
    }

    /// Whether [`DecodedImage::render`] has produced pixels.
    pub fn is_rendered(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// The flat 32-bit buffer: 4 bytes per pixel (RGB plus filler), row
    /// major, contiguous. This is the active buffer edits operate on.
    pub fn pixels_flat32(&self) -> &[u8] {
        &self.pixels
    }

    /// One row of the flat buffer as a view.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height || !self.is_rendered() {
            return None;
        }
        let stride = self.width * FLAT_CHANNELS;
        Some(&self.pixels[y * stride..(y + 1) * stride])
    }

    /// Packed 24-bit rows: 3 bytes per pixel, row major, contiguous.
    pub fn packed_rows24(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * 3);
        for px in self.pixels.chunks_exact(FLAT_CHANNELS) {
            out.extend_from_slice(&px[..3]);
        }
        out
    }

    /// Packed 32-bit rows: 4 bytes per pixel including the filler byte.
    pub fn packed_rows32(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Drop the cached min/max and distribution, forcing recomputation.
    pub fn invalidate_caches(&mut self) {
        self.minmax = None;
        self.distribution = None;
    }
}

/// Fixed piecewise color ramp over the normalized position: the low third is
/// blue-dominant, the middle third green-dominant, the high third
/// red-dominant. All sample kinds funnel through this one float-domain ramp.
fn color_ramp(pos: f64) -> [u8; 3] {
    let pos = pos.clamp(0.0, 1.0);
    let channel = |t: f64| (t.clamp(0.0, 1.0) * 255.0).round() as u8;

    if pos < 1.0 / 3.0 {
        let t = pos * 3.0;
        [0, channel(t), 255]
    } else if pos < 2.0 / 3.0 {
        let t = pos * 3.0 - 1.0;
        [channel(t), 255, channel(1.0 - t)]
    } else {
        let t = pos * 3.0 - 2.0;
        [255, channel(1.0 - t), 0]
    }
}
