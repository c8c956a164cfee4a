//! Parsing of single 80-byte header records ("cards").
//!
//! Every FITS header is a run of fixed 80-character slots. A slot either
//! carries `KEYWORD = value / comment` (with `=` at byte 8 and a space at
//! byte 9), one of the keywords that take no `=` (`END`, `CONTINUE`,
//! `COMMENT`, `HISTORY`), or free text with no keyword at all.
//!
//! The parser is strict about the character set (printable ASCII only) and
//! lenient about everything the format itself is lenient about: duplicate
//! keywords, empty values, trailing padding.

/// Length of one header record slot in bytes.
pub const RECORD_LEN: usize = 80;

/// Length of the keyword field at the start of a slot.
pub const KEYWORD_LEN: usize = 8;

/// Keyword terminating a unit's header.
pub const END_KEYWORD: &str = "END";

/// Keyword continuing the previous record's string value.
pub const CONTINUE_KEYWORD: &str = "CONTINUE";

/// Free-text comment keyword.
pub const COMMENT_KEYWORD: &str = "COMMENT";

/// Free-text history keyword.
pub const HISTORY_KEYWORD: &str = "HISTORY";

/// Marker at the end of a string value announcing a CONTINUE record.
const CONTINUATION_MARK: char = '&';

/// One parsed header record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Trimmed keyword (may be empty for free-text slots).
    pub keyword: String,
    /// Value text with quoting resolved and padding trimmed.
    pub value: String,
    /// Trailing comment with surrounding whitespace trimmed.
    pub comment: String,
    /// True when the value ended in the continuation marker.
    pub continued: bool,
}

impl Record {
    /// A record with keyword, value and comment all empty carries no
    /// information and is never retained in a header.
    pub fn is_blank(&self) -> bool {
        self.keyword.is_empty() && self.value.is_empty() && self.comment.is_empty()
    }
}

/// Errors raised while parsing one record slot
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordParseError {
    /// The input slot was empty
    #[error("empty record slot")]
    EmptyString,

    /// The input slot was longer than the fixed 80-byte size
    #[error("record slot is {0} bytes, expected at most {RECORD_LEN}")]
    Size(usize),

    /// A byte outside the printable ASCII range appeared in the slot
    #[error("non-printable byte 0x{byte:02x} at slot offset {offset}")]
    Syntax {
        /// The offending byte
        byte: u8,
        /// Its offset within the slot
        offset: usize,
    },
}

/// Parse one 80-byte header slot into a [`Record`].
pub fn parse_record(slot: &[u8]) -> Result<Record, RecordParseError> {
    if slot.is_empty() {
        return Err(RecordParseError::EmptyString);
    }
    if slot.len() > RECORD_LEN {
        return Err(RecordParseError::Size(slot.len()));
    }
    if let Some(offset) = slot.iter().position(|b| !(0x20..=0x7e).contains(b)) {
        return Err(RecordParseError::Syntax {
            byte: slot[offset],
            offset,
        });
    }

    // Printable ASCII only from here on, so byte slicing is char slicing.
    let text: &str = std::str::from_utf8(slot).map_err(|_| RecordParseError::Syntax {
        byte: 0,
        offset: 0,
    })?;

    let (keyword, tail) = split_keyword(text);

    let (raw_value, raw_comment) = split_value_comment(tail);
    let (value, continued) = normalize_value(raw_value);
    let comment = raw_comment.trim().to_string();

    Ok(Record {
        keyword,
        value,
        comment,
        continued,
    })
}

/// Split a slot into its keyword and the remaining tail text.
fn split_keyword(text: &str) -> (String, &str) {
    // Standard form: keyword field, '=' at byte 8, space at byte 9.
    if text.len() > 9 && text.as_bytes()[8] == b'=' && text.as_bytes()[9] == b' ' {
        return (text[..KEYWORD_LEN].trim().to_string(), &text[10..]);
    }

    // Keywords that never take '='. The keyword field is still 8 bytes wide,
    // padded with spaces (CONTINUE fills it exactly).
    let field = &text[..text.len().min(KEYWORD_LEN)];
    let trimmed = field.trim();
    for special in [END_KEYWORD, CONTINUE_KEYWORD, COMMENT_KEYWORD, HISTORY_KEYWORD] {
        if trimmed == special {
            let tail = if text.len() > KEYWORD_LEN {
                &text[KEYWORD_LEN..]
            } else {
                ""
            };
            return (special.to_string(), tail);
        }
    }

    // No keyword; the whole slot is tail text.
    (String::new(), text)
}

/// Split a record tail into value and comment at the first `/` that sits
/// outside a quoted span. Quote parity is tracked left to right; doubled
/// quotes inside a string flip parity twice and so stay "inside".
fn split_value_comment(tail: &str) -> (&str, &str) {
    let mut in_quotes = false;
    for (i, ch) in tail.char_indices() {
        match ch {
            '\'' => in_quotes = !in_quotes,
            '/' if !in_quotes => {
                return (&tail[..i], &tail[i + 1..]);
            }
            _ => {}
        }
    }
    (tail, "")
}

/// Resolve quoting and padding in a raw value and detect the continuation
/// marker. Returns the cleaned value and the continuation flag.
fn normalize_value(raw: &str) -> (String, bool) {
    let mut value = raw.trim().to_string();

    // Outer quotes delimit string values: drop them first, then collapse
    // doubled quotes within the body. The order matters, or `''` (the empty
    // string) and `''''` (a literal quote) decode wrong.
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        value = value[1..value.len() - 1]
            .replace("''", "'")
            .trim_end()
            .to_string();
    }

    let mut continued = false;
    if value.ends_with(CONTINUATION_MARK) {
        continued = true;
        value.pop();
        value = value.trim_end().to_string();
    }

    (value, continued)
}
