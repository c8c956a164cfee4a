//! Header/data units and their classification.

use serde::Serialize;

use crate::header::Header;

/// Keyword opening a primary unit.
pub const PRIMARY_KEYWORD: &str = "SIMPLE";

/// Keyword opening an extension unit.
pub const EXTENSION_KEYWORD: &str = "XTENSION";

/// The closed set of unit kinds.
///
/// Classification is strict equality on this enum; any multi-flag display
/// convenience belongs to presentation layers, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitKind {
    /// Primary unit opened by `SIMPLE`
    Primary,
    /// `XTENSION = 'IMAGE'`
    ImageExtension,
    /// `XTENSION = 'TABLE'`
    AsciiTableExtension,
    /// `XTENSION = 'BINTABLE'`
    BinaryTableExtension,
    /// Tile-compressed image (declared directly or as a binary table
    /// carrying `ZIMAGE = T`)
    CompressedImageExtension,
    /// Tile-compressed table
    CompressedTableExtension,
    /// Random-groups primary (`GROUPS = T` with a zero first axis)
    RandomGroup,
    /// Structurally valid extension with an unrecognized sub-type value
    Unknown,
}

impl UnitKind {
    /// Classify an extension from its `XTENSION` value (quotes already
    /// resolved by the record parser).
    pub fn from_extension_value(value: &str) -> Self {
        match value {
            "IMAGE" => UnitKind::ImageExtension,
            "TABLE" => UnitKind::AsciiTableExtension,
            "BINTABLE" => UnitKind::BinaryTableExtension,
            "COMPRESSED_IMAGE" => UnitKind::CompressedImageExtension,
            "COMPRESSED_TABLE" => UnitKind::CompressedTableExtension,
            _ => UnitKind::Unknown,
        }
    }

    /// Whether this kind carries a directly decodable image payload.
    pub fn is_image(self) -> bool {
        matches!(self, UnitKind::Primary | UnitKind::ImageExtension)
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            UnitKind::Primary => "primary",
            UnitKind::ImageExtension => "image extension",
            UnitKind::AsciiTableExtension => "ASCII table extension",
            UnitKind::BinaryTableExtension => "binary table extension",
            UnitKind::CompressedImageExtension => "compressed image extension",
            UnitKind::CompressedTableExtension => "compressed table extension",
            UnitKind::RandomGroup => "random groups",
            UnitKind::Unknown => "unknown extension",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One discovered header/data unit.
///
/// A `Unit` stores structural metadata only. Payload bytes stay inside the
/// owning document's mapped buffer and are borrowed on demand through
/// [`crate::document::Document::unit`], never copied.
#[derive(Debug, Clone)]
pub struct Unit {
    /// The unit's parsed header.
    pub header: Header,
    /// Classified kind.
    pub kind: UnitKind,
    /// Absolute byte offset of the unit's first record.
    pub offset: u64,
    /// Absolute byte offset of the payload (block-aligned).
    pub payload_offset: u64,
    /// Payload length declared by the header, in bytes.
    pub payload_len: u64,
    /// Total unit size, header plus payload, block-aligned.
    pub total_len: u64,
    /// Declared per-axis extents, in axis order.
    pub axes: Vec<u64>,
    /// Signed sample width code (0 when the header declares none).
    pub sample_width: i64,
}

impl Unit {
    /// Width of the first axis, if declared.
    pub fn width(&self) -> Option<u64> {
        self.axes.first().copied()
    }

    /// Height of the second axis, if declared.
    pub fn height(&self) -> Option<u64> {
        self.axes.get(1).copied()
    }

    /// Affine zero point (`BZERO`), identity default 0.
    pub fn affine_zero(&self) -> f64 {
        self.header.decode("BZERO").unwrap_or(0.0)
    }

    /// Affine scale (`BSCALE`), identity default 1.
    pub fn affine_scale(&self) -> f64 {
        self.header.decode("BSCALE").unwrap_or(1.0)
    }

    /// Structural summary for presentation and JSON output.
    pub fn summary(&self, index: usize) -> UnitSummary {
        UnitSummary {
            index,
            kind: self.kind,
            offset: self.offset,
            payload_offset: self.payload_offset,
            payload_len: self.payload_len,
            total_len: self.total_len,
            axes: self.axes.clone(),
            sample_width: self.sample_width,
            records: self.header.len(),
        }
    }
}

/// Serializable structural summary of one unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    /// Position of the unit within the document.
    pub index: usize,
    /// Classified kind.
    pub kind: UnitKind,
    /// Absolute offset of the unit's first record.
    pub offset: u64,
    /// Absolute offset of the payload.
    pub payload_offset: u64,
    /// Declared payload length in bytes.
    pub payload_len: u64,
    /// Total block-aligned size.
    pub total_len: u64,
    /// Declared axis extents.
    pub axes: Vec<u64>,
    /// Signed sample width code.
    pub sample_width: i64,
    /// Number of header records.
    pub records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_values_classify() {
        assert_eq!(
            UnitKind::from_extension_value("IMAGE"),
            UnitKind::ImageExtension
        );
        assert_eq!(
            UnitKind::from_extension_value("TABLE"),
            UnitKind::AsciiTableExtension
        );
        assert_eq!(
            UnitKind::from_extension_value("BINTABLE"),
            UnitKind::BinaryTableExtension
        );
        assert_eq!(
            UnitKind::from_extension_value("COMPRESSED_IMAGE"),
            UnitKind::CompressedImageExtension
        );
        assert_eq!(UnitKind::from_extension_value("WAVELET"), UnitKind::Unknown);
    }

    #[test]
    fn only_primary_and_image_extension_are_images() {
        assert!(UnitKind::Primary.is_image());
        assert!(UnitKind::ImageExtension.is_image());
        assert!(!UnitKind::BinaryTableExtension.is_image());
        assert!(!UnitKind::CompressedImageExtension.is_image());
        assert!(!UnitKind::RandomGroup.is_image());
    }
}
