//! A minimal binary PPM/PGM encoder, the CLI's stand-in for the external
//! image-file encoder the library is designed against.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use fitspix::export::{ColorMode, Frame, ImageEncoder};

/// Writes frames as binary PPM (P6), collapsing grayscale frames to PGM
/// (P5).
pub struct PpmEncoder {
    path: PathBuf,
}

impl PpmEncoder {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ImageEncoder for PpmEncoder {
    fn encode(&mut self, frame: &Frame<'_>) -> std::io::Result<()> {
        let max_value = (1u32 << frame.bit_depth) - 1;
        let mut out = BufWriter::new(File::create(&self.path)?);

        match frame.color {
            ColorMode::Rgb => {
                write!(out, "P6\n{} {}\n{}\n", frame.width, frame.height, max_value)?;
                out.write_all(frame.pixels)?;
            }
            ColorMode::Grayscale => {
                write!(out, "P5\n{} {}\n{}\n", frame.width, frame.height, max_value)?;
                for px in frame.pixels.chunks_exact(3) {
                    out.write_all(&px[..1])?;
                }
            }
        }
        out.flush()
    }
}
