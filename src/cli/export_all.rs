use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use fitspix::document::{Document, RenderOptions};

use super::export::default_output;
use super::ppm::PpmEncoder;
use super::TransformArg;

/// Export every image unit of a container
pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    transform: TransformArg,
    grayscale: bool,
    stretch: Option<f64>,
) -> Result<()> {
    let doc = Document::open(&file).with_context(|| format!("Failed to open {}", file.display()))?;
    let options = RenderOptions {
        transform: transform.into(),
        grayscale,
        stretch_threshold: stretch,
    };

    let out_dir = output;
    if let Some(dir) = &out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let open_encoder = |index: usize| {
        let mut path = default_output(&file, index);
        if let Some(dir) = &out_dir {
            if let Some(name) = path.file_name() {
                path = dir.join(name);
            }
        }
        info!("writing {}", path.display());
        Ok(PpmEncoder::new(path))
    };

    let mut report = |percent: u8| info!("export: {percent}%");
    match doc.export_all_units(&options, open_encoder, Some(&mut report)) {
        Ok(summary) => {
            println!(
                "Exported {} unit(s), skipped {} non-image unit(s)",
                summary.exported, summary.skipped
            );
            Ok(())
        }
        Err(aborted) => {
            eprintln!(
                "Export aborted after {} unit(s): {}",
                aborted.exported, aborted.source
            );
            Err(aborted.into())
        }
    }
}
