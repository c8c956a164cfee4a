//! # fitspix CLI
//!
//! A command-line tool for inspecting FITS containers and exporting their
//! image units as raster files.
//!
//! ## Usage
//!
//! ```bash
//! # Structural overview of a container
//! fitspix info observation.fits
//!
//! # Dump one unit's header records
//! fitspix header observation.fits --unit 1
//!
//! # Export one unit as PPM with a 1% auto-stretch
//! fitspix export observation.fits --unit 1 --stretch 0.01 -o unit1.ppm
//!
//! # Export every image unit
//! fitspix export-all observation.fits -o out/
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::init_logging(args.verbosity());
    cli::dispatch(args)
}
