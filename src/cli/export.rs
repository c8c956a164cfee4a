use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use fitspix::document::{Document, RenderOptions};

use super::ppm::PpmEncoder;
use super::TransformArg;

/// Export one image unit as a PPM file
pub fn run(
    file: PathBuf,
    unit: usize,
    output: Option<PathBuf>,
    transform: TransformArg,
    grayscale: bool,
    stretch: Option<f64>,
) -> Result<()> {
    let doc = Document::open(&file).with_context(|| format!("Failed to open {}", file.display()))?;

    let output = output.unwrap_or_else(|| default_output(&file, unit));
    let options = RenderOptions {
        transform: transform.into(),
        grayscale,
        stretch_threshold: stretch,
    };

    let mut encoder = PpmEncoder::new(output.clone());
    let mut report = |percent: u8| info!("unit {unit}: {percent}%");
    doc.export_unit(unit, &options, &mut encoder, Some(&mut report))
        .with_context(|| format!("Failed to export unit {unit}"))?;

    println!("Wrote {}", output.display());
    Ok(())
}

/// `<stem>_u<unit>.ppm` next to the input file.
pub(super) fn default_output(file: &std::path::Path, unit: usize) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unit".to_string());
    file.with_file_name(format!("{stem}_u{unit}.ppm"))
}
