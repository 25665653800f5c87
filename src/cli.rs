use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipfit")]
#[command(author, version, about = "Shrink videos to fit a byte budget")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a batch of .mov/.mp4 files and print the results as JSON
    Convert {
        /// Files to convert, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory to write converted files to (overrides config)
        #[arg(short, long, conflicts_with = "inline")]
        output_dir: Option<PathBuf>,

        /// Embed converted files as base64 in the output instead of writing them
        #[arg(long)]
        inline: bool,
    },

    /// Probe a media file and display its duration, size, and bitrate
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the trim decision for a source of the given duration and size
    Plan {
        /// Source duration in seconds
        #[arg(long)]
        duration: f64,

        /// Source size in bytes
        #[arg(long)]
        size: u64,

        /// Output ceiling in bytes (defaults to the configured ceiling)
        #[arg(long)]
        ceiling: Option<u64>,
    },

    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config or the defaults if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Write a config file populated with the defaults
    InitConfig {
        /// Where to write the file
        #[arg(default_value = "clipfit.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
