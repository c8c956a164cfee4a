//! Sequential discovery of header/data units inside a mapped buffer.
//!
//! [`UnitScanner`] walks 80-byte records from a starting offset through a
//! small state machine: the first record must open a unit (`SIMPLE` or
//! `XTENSION`), records accumulate into a [`Header`] until `END`, and the
//! trailer computes payload geometry and block alignment. [`find_all_units`]
//! repeats the scan across the whole buffer.

use log::{debug, warn};

use crate::header::Header;
use crate::record::{parse_record, RecordParseError, END_KEYWORD, RECORD_LEN};
use crate::unit::{Unit, UnitKind, EXTENSION_KEYWORD, PRIMARY_KEYWORD};

/// Fixed block granularity to which headers and payloads are padded.
pub const BLOCK_LEN: u64 = 2880;

/// Highest axis index read from a header. Matches the format's `NAXIS999`
/// ceiling and bounds work on hostile axis counts.
const MAX_AXES: i64 = 999;

/// Errors raised while scanning for units
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Fewer than 80 bytes remained before end of buffer
    #[error("header record at offset {0} runs past end of buffer")]
    Offset(u64),

    /// The first record of a unit did not open with `SIMPLE` or `XTENSION`
    #[error("unit at offset {offset} does not start with {PRIMARY_KEYWORD} or {EXTENSION_KEYWORD} (found {keyword:?})")]
    UnitStart {
        /// Offset of the offending record
        offset: u64,
        /// The keyword actually found
        keyword: String,
    },

    /// A record inside the header failed to parse
    #[error("record at offset {offset}: {source}")]
    Record {
        /// Offset of the offending record
        offset: u64,
        /// The parser's error
        source: RecordParseError,
    },

    /// No valid unit was found anywhere in the buffer
    #[error("no valid unit found in buffer")]
    NoUnits(#[source] Box<ScanError>),
}

/// Align `offset` forward to the next block boundary. Offsets already on a
/// boundary are unchanged; alignment saturates at `u64::MAX` so hostile
/// declared sizes cannot wrap.
pub fn align_block(offset: u64) -> u64 {
    match offset % BLOCK_LEN {
        0 => offset,
        rem => offset.saturating_add(BLOCK_LEN - rem),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ExpectFirstRecord,
    AccumulatingRecords,
    Terminated,
}

/// Scanner producing one [`Unit`] per call over a borrowed byte buffer.
pub struct UnitScanner<'a> {
    buf: &'a [u8],
    offset: u64,
}

impl<'a> UnitScanner<'a> {
    /// Start scanning `buf` at absolute byte `offset`.
    pub fn new(buf: &'a [u8], offset: u64) -> Self {
        Self { buf, offset }
    }

    /// Current absolute offset; after a successful scan this is the start of
    /// the next unit.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Scan one complete unit starting at the current offset.
    pub fn scan_unit(&mut self) -> Result<Unit, ScanError> {
        let start = self.offset;
        let mut state = ScanState::ExpectFirstRecord;
        let mut header = Header::new();
        let mut kind = UnitKind::Unknown;

        while state != ScanState::Terminated {
            let record_offset = self.offset;
            let record = self.read_record()?;

            match state {
                ScanState::ExpectFirstRecord => {
                    kind = match record.keyword.as_str() {
                        PRIMARY_KEYWORD => UnitKind::Primary,
                        EXTENSION_KEYWORD => UnitKind::from_extension_value(&record.value),
                        _ => {
                            return Err(ScanError::UnitStart {
                                offset: record_offset,
                                keyword: record.keyword,
                            })
                        }
                    };
                    header.add(record);
                    state = ScanState::AccumulatingRecords;
                }
                ScanState::AccumulatingRecords => {
                    let terminated = record.keyword == END_KEYWORD;
                    header.add(record);
                    if terminated {
                        state = ScanState::Terminated;
                    }
                }
                ScanState::Terminated => unreachable!("loop exits on Terminated"),
            }
        }

        // Header done: pad to the block boundary, then size the payload from
        // the declared geometry.
        let payload_offset = align_block(self.offset);

        let axis_count = header.axis_count().unwrap_or(0).clamp(0, MAX_AXES);
        let axes: Vec<u64> = (1..=axis_count as usize)
            .map(|n| header.axis_len(n).unwrap_or(0).max(0) as u64)
            .collect();
        let sample_width = header.sample_width().unwrap_or(0);
        let bytes_per_sample = sample_width.unsigned_abs() / 8;

        let payload_len = if axes.is_empty() {
            0
        } else {
            axes.iter()
                .try_fold(bytes_per_sample, |acc, &n| acc.checked_mul(n))
                .unwrap_or(u64::MAX)
        };

        self.offset = align_block(payload_offset.saturating_add(payload_len));
        let kind = refine_kind(kind, &header, &axes);

        debug!(
            "unit at {start}: kind={kind}, {} records, payload {payload_len} bytes at {payload_offset}",
            header.len()
        );

        Ok(Unit {
            header,
            kind,
            offset: start,
            payload_offset,
            payload_len,
            total_len: self.offset - start,
            axes,
            sample_width,
        })
    }

    /// Read and parse the record at the current offset, then advance by one
    /// record length.
    fn read_record(&mut self) -> Result<crate::record::Record, ScanError> {
        let end = self.offset.saturating_add(RECORD_LEN as u64);
        if end > self.buf.len() as u64 {
            return Err(ScanError::Offset(self.offset));
        }
        let start = self.offset as usize;

        let record = parse_record(&self.buf[start..start + RECORD_LEN]).map_err(|source| ScanError::Record {
            offset: self.offset,
            source,
        })?;
        self.offset += RECORD_LEN as u64;
        Ok(record)
    }
}

/// Refine a first-record classification with whole-header evidence: random
/// groups hide behind a primary keyword and tile-compressed images behind a
/// binary table.
fn refine_kind(kind: UnitKind, header: &Header, axes: &[u64]) -> UnitKind {
    match kind {
        UnitKind::Primary
            if header.decode_logical("GROUPS") == Some(true) && axes.first() == Some(&0) =>
        {
            UnitKind::RandomGroup
        }
        UnitKind::BinaryTableExtension if header.decode_logical("ZIMAGE") == Some(true) => {
            UnitKind::CompressedImageExtension
        }
        other => other,
    }
}

/// Scan the whole buffer from offset 0, producing every discoverable unit.
///
/// Scanning stops at the first failure past the last complete unit; reaching
/// the exact end of the buffer is normal termination. Fails with
/// [`ScanError::NoUnits`] when not even one unit could be produced.
pub fn find_all_units(buf: &[u8]) -> Result<Vec<Unit>, ScanError> {
    let mut units = Vec::new();
    let mut scanner = UnitScanner::new(buf, 0);

    while scanner.offset() < buf.len() as u64 {
        match scanner.scan_unit() {
            Ok(unit) => units.push(unit),
            Err(err) if units.is_empty() => return Err(ScanError::NoUnits(Box::new(err))),
            Err(err) => {
                warn!(
                    "stopping unit discovery at offset {}: {err}",
                    scanner.offset()
                );
                break;
            }
        }
    }

    if units.is_empty() {
        return Err(ScanError::NoUnits(Box::new(ScanError::Offset(0))));
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RECORD_LEN;

    fn card(text: &str) -> [u8; RECORD_LEN] {
        let mut out = [b' '; RECORD_LEN];
        out[..text.len()].copy_from_slice(text.as_bytes());
        out
    }

    fn header_block(cards: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for c in cards {
            out.extend_from_slice(&card(c));
        }
        while out.len() as u64 % BLOCK_LEN != 0 {
            out.extend_from_slice(&card(""));
        }
        out
    }

    #[test]
    fn alignment_is_exact() {
        assert_eq!(align_block(0), 0);
        assert_eq!(align_block(1), 2880);
        assert_eq!(align_block(2880), 2880);
        assert_eq!(align_block(2881), 5760);
        assert_eq!(align_block(5760), 5760);
    }

    #[test]
    fn minimal_primary_unit_is_one_block() {
        let buf = header_block(&["SIMPLE  =                    T", "NAXIS   =                    0", "END"]);
        let units = find_all_units(&buf).unwrap();

        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.kind, UnitKind::Primary);
        assert_eq!(unit.offset, 0);
        assert_eq!(unit.payload_offset, BLOCK_LEN);
        assert_eq!(unit.payload_len, 0);
        assert_eq!(unit.total_len, BLOCK_LEN);
    }

    #[test]
    fn image_extension_payload_is_sized_and_aligned() {
        let mut buf = header_block(&["SIMPLE  =                    T", "NAXIS   =                    0", "END"]);
        buf.extend(header_block(&[
            "XTENSION= 'IMAGE   '",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                   10",
            "NAXIS2  =                    4",
            "END",
        ]));
        // 10 * 4 * 2 bytes = 80 payload bytes, padded to one block.
        buf.resize(buf.len() + BLOCK_LEN as usize, 0);

        let units = find_all_units(&buf).unwrap();
        assert_eq!(units.len(), 2);

        let image = &units[1];
        assert_eq!(image.kind, UnitKind::ImageExtension);
        assert_eq!(image.offset, BLOCK_LEN);
        assert_eq!(image.payload_offset, 2 * BLOCK_LEN);
        assert_eq!(image.payload_len, 80);
        assert_eq!(image.total_len, 2 * BLOCK_LEN);
        assert_eq!(image.axes, vec![10, 4]);
        assert_eq!(image.sample_width, 16);
    }

    #[test]
    fn first_record_must_open_a_unit() {
        let buf = header_block(&["BITPIX  =                   16", "END"]);
        let err = find_all_units(&buf).unwrap_err();
        assert!(matches!(err, ScanError::NoUnits(_)));

        let mut scanner = UnitScanner::new(&buf, 0);
        assert!(matches!(
            scanner.scan_unit(),
            Err(ScanError::UnitStart { offset: 0, .. })
        ));
    }

    #[test]
    fn truncated_header_is_an_offset_error() {
        let buf = card("SIMPLE  =                    T");
        let mut scanner = UnitScanner::new(&buf[..40], 0);
        assert!(matches!(scanner.scan_unit(), Err(ScanError::Offset(0))));
    }

    #[test]
    fn scan_stops_after_last_complete_unit() {
        let mut buf = header_block(&["SIMPLE  =                    T", "NAXIS   =                    0", "END"]);
        // Trailing garbage shorter than a record.
        buf.extend_from_slice(b"garbage");

        let units = find_all_units(&buf).unwrap();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn random_groups_and_compressed_images_are_refined() {
        let mut buf = header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                    0",
            "NAXIS2  =                    3",
            "GROUPS  =                    T",
            "END",
        ]);
        buf.extend(header_block(&[
            "XTENSION= 'BINTABLE'",
            "NAXIS   =                    0",
            "ZIMAGE  =                    T",
            "END",
        ]));

        let units = find_all_units(&buf).unwrap();
        assert_eq!(units[0].kind, UnitKind::RandomGroup);
        assert_eq!(units[1].kind, UnitKind::CompressedImageExtension);
    }

    #[test]
    fn unclassified_extension_is_still_scanned() {
        let buf = header_block(&["XTENSION= 'WAVELET '", "NAXIS   =                    0", "END"]);
        let units = find_all_units(&buf).unwrap();
        assert_eq!(units[0].kind, UnitKind::Unknown);
    }
}
