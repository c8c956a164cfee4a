//! Read-only memory mapping of a whole container file.
//!
//! A [`MappedBuffer`] maps the entire file once and hands out `&[u8]` views;
//! nothing in this crate ever writes through the mapping. The map is released
//! exactly once, either by [`MappedBuffer::close`] or on drop.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

/// Errors raised while establishing or sizing a file mapping
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The file could not be opened for reading
    #[error("cannot open {path}: {source}")]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file length could not be queried
    #[error("cannot stat {path}: {source}")]
    Stat {
        /// Path that failed to stat
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The OS refused the mapping itself
    #[error("cannot map {path}: {source}")]
    Map {
        /// Path that failed to map
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// A read-only view of a file's bytes backed by an OS memory mapping.
pub struct MappedBuffer {
    map: Option<Mmap>,
    len: u64,
    path: PathBuf,
    open: bool,
}

impl MappedBuffer {
    /// Map `path` read-only in its entirety. An empty file opens with an
    /// empty view and no OS mapping (zero-length maps are refused on some
    /// platforms).
    ///
    /// Fails with [`MapError::Open`] when the file cannot be opened,
    /// [`MapError::Stat`] when its length cannot be queried and
    /// [`MapError::Map`] when the mapping itself is refused.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|source| MapError::Open {
            path: path.clone(),
            source,
        })?;

        let len = file
            .metadata()
            .map_err(|source| MapError::Stat {
                path: path.clone(),
                source,
            })?
            .len();

        let map = if len == 0 {
            None
        } else {
            // Safety: the map is read-only and this crate never truncates or
            // writes the file while a Document holds it open.
            Some(unsafe {
                Mmap::map(&file).map_err(|source| MapError::Map {
                    path: path.clone(),
                    source,
                })?
            })
        };

        Ok(Self {
            map,
            len,
            path,
            open: true,
        })
    }

    /// Mapped length in bytes (0 after close).
    pub fn len(&self) -> u64 {
        if self.open {
            self.len
        } else {
            0
        }
    }

    /// True when nothing is currently mapped or the file was empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The byte view. Empty slice once the buffer has been closed.
    pub fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    /// Whether the buffer is still open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Path the buffer was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the mapping. Safe to call more than once.
    pub fn close(&mut self) {
        self.map = None;
        self.open = false;
    }
}

impl std::fmt::Debug for MappedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedBuffer")
            .field("path", &self.path)
            .field("len", &self.len)
            .field("open", &self.open)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn map_and_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello fits")
            .unwrap();

        let mut buf = MappedBuffer::open(&path).unwrap();
        assert!(buf.is_open());
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.bytes(), b"hello fits");

        buf.close();
        assert!(!buf.is_open());
        assert_eq!(buf.len(), 0);
        assert!(buf.bytes().is_empty());

        // Closing twice must not panic or change anything.
        buf.close();
        assert!(!buf.is_open());
    }

    #[test]
    fn empty_file_opens_with_empty_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::File::create(&path).unwrap();

        let mut buf = MappedBuffer::open(&path).unwrap();
        assert!(buf.is_open());
        assert_eq!(buf.len(), 0);
        assert!(buf.bytes().is_empty());
        buf.close();
        assert!(!buf.is_open());
    }

    #[test]
    fn open_missing_file_is_open_error() {
        let err = MappedBuffer::open("/nonexistent/definitely/missing.fits").unwrap_err();
        assert!(matches!(err, MapError::Open { .. }));
    }
}
