//! The top-level document: one mapped container file and its units.
//!
//! A [`Document`] owns the [`MappedBuffer`] and the ordered unit list
//! discovered in one scanning pass. Units borrow payload bytes from the
//! document; selecting a unit for viewing or export produces an independent
//! [`DecodedImage`] so no decoding state bleeds between units.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::export::{ColorMode, Frame, ImageEncoder};
use crate::header::Header;
use crate::mmap::{MapError, MappedBuffer};
use crate::pixels::{DecodedImage, PixelError, SampleKind, Transform};
use crate::scanner::{find_all_units, ScanError, BLOCK_LEN};
use crate::unit::{Unit, UnitKind, UnitSummary};

/// Errors raised by document-level operations
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The file could not be opened, sized or mapped
    #[error(transparent)]
    Map(#[from] MapError),

    /// The file is smaller than one block and cannot hold a unit
    #[error("{path} is {len} bytes, smaller than one {BLOCK_LEN}-byte block")]
    WrongSize {
        /// The offending path
        path: PathBuf,
        /// Its actual length
        len: u64,
    },

    /// Unit discovery failed outright
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A unit index was out of range
    #[error("unit index {index} out of range (document has {count} units)")]
    UnitIndex {
        /// The requested index
        index: usize,
        /// Number of units in the document
        count: usize,
    },

    /// The unit lacks the kind or axes required for image decoding
    #[error("unit {index} is not a decodable image: {reason}")]
    NotAnImage {
        /// The unit's index
        index: usize,
        /// What disqualified it
        reason: String,
    },

    /// Pixel decoding failed
    #[error(transparent)]
    Pixel(#[from] PixelError),

    /// The injected image encoder failed
    #[error("image encoder failed: {0}")]
    Export(#[from] std::io::Error),
}

/// Rendering choices for export.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Linear remap of sample values.
    pub transform: Transform,
    /// Convert the finished buffer to grayscale.
    pub grayscale: bool,
    /// Percentile auto-stretch threshold; `None` uses the raw global range.
    pub stretch_threshold: Option<f64>,
}

/// Borrowed view of one unit: metadata copies plus the payload bytes
/// actually present in the mapped buffer.
#[derive(Debug, Clone, Copy)]
pub struct UnitView<'a> {
    /// Position of the unit within the document.
    pub index: usize,
    /// Classified kind.
    pub kind: UnitKind,
    /// Absolute offset of the unit's first record.
    pub offset: u64,
    /// Absolute offset of the payload.
    pub payload_offset: u64,
    /// Payload length declared by the header.
    pub payload_len: u64,
    /// Total block-aligned unit size.
    pub total_len: u64,
    /// Signed sample width code.
    pub sample_width: i64,
    /// Declared axis extents.
    pub axes: &'a [u64],
    /// The unit's header records.
    pub header: &'a Header,
    /// Payload bytes, clipped to the mapped buffer. May be shorter than
    /// `payload_len` for truncated files.
    pub payload: &'a [u8],
}

/// Counts reported by [`Document::export_all_units`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Units exported successfully.
    pub exported: usize,
    /// Units skipped because they are not image-shaped.
    pub skipped: usize,
}

/// A failed [`Document::export_all_units`] run, preserving the progress made
/// before the first hard failure.
#[derive(Debug, thiserror::Error)]
#[error("export aborted after {exported} exported and {skipped} skipped unit(s): {source}")]
pub struct ExportAborted {
    /// Units exported before the failure.
    pub exported: usize,
    /// Units skipped before the failure.
    pub skipped: usize,
    /// The failure itself.
    #[source]
    pub source: DocumentError,
}

/// One open container file and its discovered units.
#[derive(Debug, Default)]
pub struct Document {
    buffer: Option<MappedBuffer>,
    units: Vec<Unit>,
}

impl Document {
    /// An empty document with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` and scan its units in one step.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let mut doc = Self::new();
        doc.load(path)?;
        Ok(doc)
    }

    /// Map `path` and discover all units, replacing any previously loaded
    /// file. Fails with [`DocumentError::WrongSize`] for files smaller than
    /// one block.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DocumentError> {
        // A document holds exactly one mapping; drop the old state first.
        self.close();

        let buffer = MappedBuffer::open(&path)?;
        if buffer.len() < BLOCK_LEN {
            return Err(DocumentError::WrongSize {
                path: path.as_ref().to_path_buf(),
                len: buffer.len(),
            });
        }

        let units = find_all_units(buffer.bytes())?;
        info!(
            "loaded {} with {} unit(s)",
            path.as_ref().display(),
            units.len()
        );

        self.buffer = Some(buffer);
        self.units = units;
        Ok(())
    }

    /// Unmap the file and clear every cached unit. Idempotent.
    pub fn close(&mut self) {
        if let Some(buffer) = &mut self.buffer {
            buffer.close();
        }
        self.buffer = None;
        self.units.clear();
    }

    /// Whether a file is currently loaded.
    pub fn is_open(&self) -> bool {
        self.buffer.is_some()
    }

    /// Number of discovered units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Structural summaries of every unit, in document order.
    pub fn summaries(&self) -> Vec<UnitSummary> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, u)| u.summary(i))
            .collect()
    }

    /// Bounds-checked view of one unit.
    pub fn unit(&self, index: usize) -> Result<UnitView<'_>, DocumentError> {
        let unit = self.units.get(index).ok_or(DocumentError::UnitIndex {
            index,
            count: self.units.len(),
        })?;

        Ok(UnitView {
            index,
            kind: unit.kind,
            offset: unit.offset,
            payload_offset: unit.payload_offset,
            payload_len: unit.payload_len,
            total_len: unit.total_len,
            sample_width: unit.sample_width,
            axes: &unit.axes,
            header: &unit.header,
            payload: self.payload_slice(unit),
        })
    }

    /// The payload bytes of `unit` that are actually mapped; shorter than
    /// the declared length when the file is truncated.
    fn payload_slice(&self, unit: &Unit) -> &[u8] {
        let bytes = self.buffer.as_ref().map(|b| b.bytes()).unwrap_or(&[]);
        let start = (unit.payload_offset as usize).min(bytes.len());
        let end = unit
            .payload_offset
            .saturating_add(unit.payload_len)
            .min(bytes.len() as u64) as usize;
        &bytes[start..end]
    }

    /// Build a [`DecodedImage`] over one unit's payload.
    ///
    /// The unit must be image-bearing (primary or image extension) with at
    /// least two axes; anything else fails with
    /// [`DocumentError::NotAnImage`]. An undecodable sample width is a
    /// pixel-level error, not a shape mismatch.
    pub fn decode_unit(&self, index: usize) -> Result<DecodedImage<'_>, DocumentError> {
        let unit = self.units.get(index).ok_or(DocumentError::UnitIndex {
            index,
            count: self.units.len(),
        })?;

        if !unit.kind.is_image() {
            return Err(DocumentError::NotAnImage {
                index,
                reason: format!("kind is {}", unit.kind),
            });
        }
        if unit.axes.len() < 2 {
            return Err(DocumentError::NotAnImage {
                index,
                reason: format!("{} axis(es), need at least 2", unit.axes.len()),
            });
        }

        let kind = SampleKind::from_width(unit.sample_width)?;
        let width = unit.axes[0] as usize;
        let height = unit.axes[1] as usize;
        debug!("decoding unit {index}: {width}x{height} {kind}");

        Ok(DecodedImage::new(
            self.payload_slice(unit),
            width,
            height,
            kind,
            unit.affine_zero(),
            unit.affine_scale(),
        )?)
    }

    /// Decode, render and hand one unit to the encoder.
    pub fn export_unit<E: ImageEncoder>(
        &self,
        index: usize,
        options: &RenderOptions,
        encoder: &mut E,
        progress: Option<&mut dyn FnMut(u8)>,
    ) -> Result<(), DocumentError> {
        let mut image = self.decode_unit(index)?;
        image.render(options.transform, options.stretch_threshold, progress)?;
        if options.grayscale {
            image.grayscale();
        }

        let pixels = image.packed_rows24();
        let frame = Frame {
            width: image.width() as u32,
            height: image.height() as u32,
            bit_depth: 8,
            color: if options.grayscale {
                ColorMode::Grayscale
            } else {
                ColorMode::Rgb
            },
            pixels: &pixels,
        };
        encoder.encode(&frame)?;
        Ok(())
    }

    /// Export every unit, skipping those that are not image-shaped.
    ///
    /// `open_encoder` is called once per exported unit with the unit index.
    /// The first hard failure aborts the run; the counts accumulated up to
    /// that point travel with the error.
    pub fn export_all_units<F, E>(
        &self,
        options: &RenderOptions,
        mut open_encoder: F,
        mut progress: Option<&mut dyn FnMut(u8)>,
    ) -> Result<ExportSummary, ExportAborted>
    where
        F: FnMut(usize) -> std::io::Result<E>,
        E: ImageEncoder,
    {
        let mut summary = ExportSummary::default();
        let count = self.units.len();

        for index in 0..count {
            let step = |summary: &ExportSummary, source| ExportAborted {
                exported: summary.exported,
                skipped: summary.skipped,
                source,
            };

            match self.decode_unit(index) {
                Err(DocumentError::NotAnImage { reason, .. }) => {
                    debug!("skipping unit {index}: {reason}");
                    summary.skipped += 1;
                }
                Err(source) => return Err(step(&summary, source)),
                Ok(mut image) => {
                    let render = image.render(options.transform, options.stretch_threshold, None);
                    if let Err(e) = render {
                        return Err(step(&summary, e.into()));
                    }
                    if options.grayscale {
                        image.grayscale();
                    }

                    let pixels = image.packed_rows24();
                    let frame = Frame {
                        width: image.width() as u32,
                        height: image.height() as u32,
                        bit_depth: 8,
                        color: if options.grayscale {
                            ColorMode::Grayscale
                        } else {
                            ColorMode::Rgb
                        },
                        pixels: &pixels,
                    };

                    let encoded = open_encoder(index)
                        .and_then(|mut enc| enc.encode(&frame))
                        .map_err(DocumentError::Export);
                    if let Err(e) = encoded {
                        warn!("export of unit {index} failed: {e}");
                        return Err(step(&summary, e));
                    }
                    summary.exported += 1;
                }
            }

            if let Some(cb) = progress.as_deref_mut() {
                cb(((index + 1) * 100 / count) as u8);
            }
        }

        info!(
            "exported {} unit(s), skipped {}",
            summary.exported, summary.skipped
        );
        Ok(summary)
    }
}
