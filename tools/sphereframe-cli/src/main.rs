//! SphereFrame CLI — run frame modules over raw planar video.
//!
//! Usage:
//!   sphereframe list                 List registered modules
//!   sphereframe describe <MODULE>    Show a module's metadata and options
//!   sphereframe packing <DESC|FILE>  Validate a face-packing descriptor
//!   sphereframe run <MODULE> ...     Process raw frame files through a module
//!   sphereframe loss ...             Measure ERP ↔ square reconstruction loss

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sphereframe_common::AppConfig;

mod commands;
mod raw;

#[derive(Parser)]
#[command(
    name = "sphereframe",
    about = "360° frame reshaping, face packing, and projection tools",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Geometry of the raw frames in an input file.
#[derive(Args, Debug, Clone)]
pub struct FrameArgs {
    /// Frame width in luma samples
    #[arg(long)]
    width: u32,

    /// Frame height in luma samples
    #[arg(long)]
    height: u32,

    /// Pixel format: 400, 420, 422, 444, rgb, rgba (default from config)
    #[arg(long)]
    format: Option<String>,

    /// Bits per sample, 1-16 (default from config)
    #[arg(long)]
    bit_depth: Option<u8>,

    /// Samples are signed
    #[arg(long)]
    signed: bool,

    /// Stop after this many input frames
    #[arg(long)]
    frames: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered modules
    List {
        /// Only show one category: projection360, face_packing, reshape
        #[arg(long)]
        category: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a module's metadata and options
    Describe {
        module: String,

        #[arg(long)]
        json: bool,
    },

    /// Validate a face-packing descriptor given inline or as a file
    Packing { descriptor: String },

    /// Run a module over raw frame files
    Run {
        module: String,

        /// Input file(s); modules taking K frames per call need K files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        #[command(flatten)]
        frame: FrameArgs,

        /// Module option as name=value (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Write a JSON run report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Fold ERP frames to squares and back, reporting the reconstruction error
    Loss {
        /// ERP input file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        frame: FrameArgs,

        /// Interpolation kernel (default from config)
        #[arg(long)]
        kernel: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    sphereframe_common::logging::init_logging(&logging);

    match cli.command {
        Commands::List { category, json } => commands::list::run(category, json),
        Commands::Describe { module, json } => commands::describe::run(&module, json),
        Commands::Packing { descriptor } => commands::packing::run(&descriptor),
        Commands::Run {
            module,
            input,
            frame,
            set,
            output,
            report,
        } => commands::run::run(&config, &module, &input, &frame, &set, &output, report),
        Commands::Loss {
            input,
            frame,
            kernel,
            json,
        } => commands::loss::run(&config, &input, &frame, kernel, json),
    }
}
