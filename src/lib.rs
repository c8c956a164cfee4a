//! # fitspix - FITS Container Parsing and Image Rendering
//!
//! `fitspix` decodes FITS-style scientific binary containers (a sequence of
//! fixed 80-byte header records followed by raw numeric payloads, organized
//! into header/data units) and turns a chosen unit's payload into a
//! displayable RGB pixel buffer with contrast and range controls.
//!
//! ## Key Features
//!
//! - **Memory-Mapped Parsing**: The whole file is mapped read-only once;
//!   units borrow payload bytes from the mapping and never copy them.
//!
//! - **Tolerant of Damage**: Truncated or corrupt payload regions are
//!   clipped, not fatal - a partially available file still renders, with
//!   the missing rows left black.
//!
//! - **Six Sample Kinds**: 8/16/32/64-bit integers and 32/64-bit floats,
//!   decoded through one generic conversion loop with byte-order correction
//!   and width-aware affine promotion.
//!
//! - **Contrast Controls**: Cached global min/max, a 100-bucket percentile
//!   auto-stretch keyed by threshold, linear transforms, grayscale
//!   conversion and per-channel level adjustment.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fitspix::document::Document;
//! use fitspix::pixels::Transform;
//!
//! let doc = Document::open("observation.fits")?;
//! println!("{} unit(s)", doc.unit_count());
//!
//! // Inspect a unit's header through a borrowed view.
//! let view = doc.unit(0)?;
//! for record in view.header {
//!     println!("{:8} = {}", record.keyword, record.value);
//! }
//!
//! // Decode and render its payload with a 1% auto-stretch.
//! let mut image = doc.decode_unit(0)?;
//! image.render(Transform::LinearPositive, Some(0.01), None)?;
//! let rgb = image.packed_rows24();
//! # let _ = rgb;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`mmap`]: read-only memory mapping of the container file
//! - [`record`]: the 80-byte header record parser
//! - [`header`]: ordered record collections with typed value decoding
//! - [`scanner`]: unit discovery (state machine, payload sizing, block
//!   alignment)
//! - [`unit`]: unit metadata and kind classification
//! - [`document`]: the top-level query and export API
//! - [`pixels`]: the pixel decoding and normalization engine
//! - [`export`]: the seam to the external image-file encoder
//!
//! ## Binary Layout
//!
//! The container uses a fixed 2880-byte block granularity and fixed 80-byte
//! records. A record's keyword occupies bytes 0-7, with `=` at byte 8 and a
//! space at byte 9 for value-bearing records; a `/` outside quotes starts
//! the comment. `END` terminates a unit's header; the first record of a
//! unit must be `SIMPLE` or `XTENSION`. `NAXIS`/`NAXISn` plus the signed
//! `BITPIX` width code drive payload geometry, and the optional
//! `BZERO`/`BSCALE` pair drives value interpretation.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod document;
pub mod export;
pub mod header;
pub mod mmap;
pub mod pixels;
pub mod record;
pub mod scanner;
pub mod unit;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::document::{
        Document, DocumentError, ExportAborted, ExportSummary, RenderOptions, UnitView,
    };
    pub use crate::export::{ColorMode, Frame, ImageEncoder};
    pub use crate::header::{Header, HeaderError};
    pub use crate::mmap::{MapError, MappedBuffer};
    pub use crate::pixels::{
        Channel, ChannelStats, DecodedImage, Distribution, PixelError, SampleKind, Transform,
    };
    pub use crate::record::{parse_record, Record, RecordParseError};
    pub use crate::scanner::{align_block, find_all_units, ScanError, UnitScanner, BLOCK_LEN};
    pub use crate::unit::{Unit, UnitKind, UnitSummary};
}
