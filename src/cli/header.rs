use anyhow::{Context, Result};
use std::path::PathBuf;

use fitspix::document::Document;

/// Dump one unit's header records
pub fn run(file: PathBuf, unit: usize) -> Result<()> {
    let doc = Document::open(&file).with_context(|| format!("Failed to open {}", file.display()))?;
    let view = doc
        .unit(unit)
        .with_context(|| format!("No unit {unit} in {}", file.display()))?;

    println!(
        "Unit {unit} ({}), {} record(s):",
        view.kind,
        view.header.len()
    );

    for record in view.header {
        let mut line = format!("{:8}", record.keyword);
        if !record.value.is_empty() {
            line.push_str(&format!(" = {}", record.value));
            if record.continued {
                line.push('&');
            }
        }
        if !record.comment.is_empty() {
            line.push_str(&format!(" / {}", record.comment));
        }
        println!("  {}", line.trim_end());
    }

    Ok(())
}
