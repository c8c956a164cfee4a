use anyhow::{Context, Result};
use std::path::PathBuf;

use fitspix::document::Document;

/// Display structural information about a FITS container
pub fn run(file: PathBuf, json: bool) -> Result<()> {
    let doc = Document::open(&file).with_context(|| format!("Failed to open {}", file.display()))?;

    if json {
        let summaries = doc.summaries();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("fitspix Container Information");
    println!("=============================");
    println!("File: {}", file.display());
    println!("Units: {}", doc.unit_count());
    println!();

    for summary in doc.summaries() {
        let axes = if summary.axes.is_empty() {
            "-".to_string()
        } else {
            summary
                .axes
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join("x")
        };
        println!(
            "  {:3}. {:<26} axes {:<12} width {:>4}  {:>8} bytes at {}",
            summary.index,
            summary.kind.label(),
            axes,
            summary.sample_width,
            summary.total_len,
            summary.offset
        );
    }

    Ok(())
}
