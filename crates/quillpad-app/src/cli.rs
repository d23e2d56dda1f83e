//! Command-line interface.

use clap::{Parser, ValueEnum};
use quillpad_core::surface::ExportFormat;
use std::path::PathBuf;

/// Replay a recorded contact script and export the resulting sketch.
#[derive(Parser, Debug)]
#[command(name = "quillpad")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Contact script (JSON) to replay
    pub script: PathBuf,

    /// Sketch configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output image path (defaults to the script path with the format's extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output image format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    pub format: OutputFormat,

    /// JPEG quality (1-100)
    #[arg(long, default_value = "90")]
    pub quality: u8,

    /// Brush color override as #rrggbb or #rrggbbaa
    #[arg(long)]
    pub brush_color: Option<String>,

    /// Surface background as #rrggbb or #rrggbbaa (transparent if omitted)
    #[arg(long)]
    pub background: Option<String>,

    /// Directory for saved sketches (defaults to the platform data directory)
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Seed for auto-save decisions, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Image formats offered on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl Cli {
    /// Export format including quality settings.
    pub fn export_format(&self) -> ExportFormat {
        match self.format {
            OutputFormat::Png => ExportFormat::Png,
            OutputFormat::Jpeg => ExportFormat::Jpeg {
                quality: self.quality,
            },
        }
    }

    /// Where the exported image goes.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.script.with_extension(self.export_format().extension()))
    }
}
