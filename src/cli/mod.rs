use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use fitspix::pixels::Transform;

mod export;
mod export_all;
mod header;
mod info;
mod ppm;

/// fitspix - FITS Container Inspector and Image Exporter
#[derive(Parser)]
#[command(name = "fitspix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Linear remap of sample values before coloring.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum TransformArg {
    /// Leave values in their source range
    #[default]
    None,
    /// Remap into [0, 1]
    Positive,
    /// Remap into [-1, 1]
    NegPos,
    /// Remap into [-1, 0]
    Negative,
}

impl From<TransformArg> for Transform {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::None => Transform::None,
            TransformArg::Positive => Transform::LinearPositive,
            TransformArg::NegPos => Transform::LinearNegativePositive,
            TransformArg::Negative => Transform::LinearNegative,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display structural information about a FITS container
    Info {
        /// Input FITS file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Emit the unit list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump one unit's header records
    Header {
        /// Input FITS file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Unit index (0-based)
        #[arg(short, long, default_value = "0")]
        unit: usize,
    },

    /// Export one image unit as a PPM file
    Export {
        /// Input FITS file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Unit index (0-based)
        #[arg(short, long, default_value = "0")]
        unit: usize,

        /// Output path (defaults to <stem>_u<unit>.ppm next to the input)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Linear transform applied before coloring
        #[arg(short, long, default_value = "none", value_enum)]
        transform: TransformArg,

        /// Convert the output to grayscale
        #[arg(short, long)]
        grayscale: bool,

        /// Percentile auto-stretch threshold (0 reproduces the raw range)
        #[arg(short, long, value_name = "SHARE")]
        stretch: Option<f64>,
    },

    /// Export every image unit of a container
    ExportAll {
        /// Input FITS file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory (defaults to the input's directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Linear transform applied before coloring
        #[arg(short, long, default_value = "none", value_enum)]
        transform: TransformArg,

        /// Convert the output to grayscale
        #[arg(short, long)]
        grayscale: bool,

        /// Percentile auto-stretch threshold (0 reproduces the raw range)
        #[arg(short, long, value_name = "SHARE")]
        stretch: Option<f64>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info { file, json } => info::run(file, json),
        Commands::Header { file, unit } => header::run(file, unit),
        Commands::Export {
            file,
            unit,
            output,
            transform,
            grayscale,
            stretch,
        } => export::run(file, unit, output, transform, grayscale, stretch),
        Commands::ExportAll {
            file,
            output,
            transform,
            grayscale,
            stretch,
        } => export_all::run(file, output, transform, grayscale, stretch),
    }
}
