//! Ordered collections of parsed header records.
//!
//! A [`Header`] preserves insertion order, allows duplicate keywords and
//! resolves lookups to the first match, mirroring how the container format
//! itself treats repeated keywords.

use std::str::FromStr;

use crate::record::Record;

/// Keyword carrying the number of payload axes.
pub const AXIS_COUNT_KEYWORD: &str = "NAXIS";

/// Keyword carrying the signed per-sample width code.
pub const SAMPLE_WIDTH_KEYWORD: &str = "BITPIX";

/// Errors raised by indexed header access
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// A record index was out of range
    #[error("record index {index} out of range (header has {len} records)")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// Number of records in the header
        len: usize,
    },

    /// A keyword lookup found no record
    #[error("keyword {0:?} not found")]
    KeywordNotFound(String),
}

/// An insertion-ordered set of header records.
#[derive(Debug, Clone, Default)]
pub struct Header {
    records: Vec<Record>,
}

impl Header {
    /// Create an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records have been retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Append a record. A fully blank record (keyword, value and comment all
    /// empty) is dropped; returns whether the record was retained.
    pub fn add(&mut self, record: Record) -> bool {
        if record.is_blank() {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Fetch the record at `index`.
    pub fn get(&self, index: usize) -> Result<&Record, HeaderError> {
        self.records.get(index).ok_or(HeaderError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// Remove and return the record at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Record, HeaderError> {
        if index >= self.records.len() {
            return Err(HeaderError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }

    /// First record with the given keyword, with its index. Duplicates are
    /// legal; the first match in insertion order wins.
    pub fn find(&self, keyword: &str) -> Option<(usize, &Record)> {
        self.records
            .iter()
            .enumerate()
            .find(|(_, r)| r.keyword == keyword)
    }

    /// Like [`Header::find`] but failing with
    /// [`HeaderError::KeywordNotFound`].
    pub fn require(&self, keyword: &str) -> Result<&Record, HeaderError> {
        self.find(keyword)
            .map(|(_, r)| r)
            .ok_or_else(|| HeaderError::KeywordNotFound(keyword.to_string()))
    }

    /// Decode the first value stored under `keyword` as `T`.
    ///
    /// Returns `None` on lookup miss or when the stored text does not parse
    /// as `T`. The logical constants `T`/`F` decode as booleans.
    pub fn decode<T: FromStr>(&self, keyword: &str) -> Option<T> {
        let (_, record) = self.find(keyword)?;
        record.value.parse().ok()
    }

    /// Decode a logical `T`/`F` value.
    pub fn decode_logical(&self, keyword: &str) -> Option<bool> {
        let (_, record) = self.find(keyword)?;
        match record.value.as_str() {
            "T" => Some(true),
            "F" => Some(false),
            _ => None,
        }
    }

    /// Declared number of payload axes (`NAXIS`).
    pub fn axis_count(&self) -> Option<i64> {
        self.decode(AXIS_COUNT_KEYWORD)
    }

    /// Declared extent of axis `n` (1-based, `NAXISn`).
    pub fn axis_len(&self, n: usize) -> Option<i64> {
        self.decode(&format!("{AXIS_COUNT_KEYWORD}{n}"))
    }

    /// Declared signed sample width code (`BITPIX`).
    pub fn sample_width(&self) -> Option<i64> {
        self.decode(SAMPLE_WIDTH_KEYWORD)
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
