use crate::constants::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};
use crate::dimensions::ClampStrategy;
use crate::error::Result;
use crate::processing::{parse_filter, CompressionOptions};
use clap::{Args as ClapArgs, Parser, Subcommand};
use image::imageops::FilterType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-shrink",
    about = "Downsize and re-encode images to fit a bounding box",
    long_about = "img-shrink scales an image down to fit a bounding box (800x800 by default), \
                  re-encodes it (PNG stays PNG, JPEG and WebP become JPEG) and reports the \
                  size before and after.",
    version,
    after_help = "EXAMPLES:\n  \
    img-shrink compress photo.jpg\n  \
    img-shrink compress photo.webp out.jpg -q 0.8 -w 1200 -H 1200\n  \
    img-shrink batch ./images ./compressed -r\n  \
    img-shrink info logo.png"
)]
pub struct Args {
    #[arg(short = 'Q', long, global = true, help = "Only print warnings and errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Print debug diagnostics")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Sizing and encoding flags shared by every subcommand.
#[derive(ClapArgs, Debug, Clone)]
pub struct ShrinkArgs {
    #[arg(
        short = 'q',
        long,
        default_value_t = DEFAULT_QUALITY,
        help = "JPEG quality as a fraction [0-1]",
        long_help = "Quality factor passed to the JPEG encoder, as a fraction between 0 \
                     and 1 (0 selects the lowest encoder setting). Has no effect on PNG \
                     output, which is lossless."
    )]
    pub quality: f32,

    #[arg(
        short = 'w',
        long = "max-width",
        default_value_t = DEFAULT_MAX_WIDTH,
        help = "Maximum output width in pixels"
    )]
    pub max_width: u32,

    #[arg(
        short = 'H',
        long = "max-height",
        default_value_t = DEFAULT_MAX_HEIGHT,
        help = "Maximum output height in pixels"
    )]
    pub max_height: u32,

    #[arg(
        long,
        default_value_t = ClampStrategy::Fit,
        help = "How to fit the bounding box (fit, sequential)",
        long_help = "'fit' applies one scale factor so both bounds hold. 'sequential' clamps \
                     width first and then height, rounding after each step."
    )]
    pub clamp: ClampStrategy,

    #[arg(
        long,
        default_value = "lanczos3",
        value_parser = parse_filter,
        help = "Resampling filter (nearest, triangle, catmullrom, gaussian, lanczos3)"
    )]
    pub filter: FilterType,

    #[arg(long, help = "Skip the lossless oxipng pass on PNG output")]
    pub no_png_optimize: bool,
}

impl ShrinkArgs {
    pub fn to_options(&self) -> Result<CompressionOptions> {
        Ok(
            CompressionOptions::new(Some(self.quality), Some(self.max_width), Some(self.max_height))?
                .with_clamp(self.clamp)
                .with_filter(self.filter)
                .with_png_optimization(!self.no_png_optimize),
        )
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress a single image file",
        long_about = "Downsize and re-encode one image. Without an output path the result is \
                      written next to the input as compressed-<name>."
    )]
    Compress {
        #[arg(help = "Input image file path (JPEG, PNG or WebP, at most 10 MiB)")]
        input: PathBuf,

        #[arg(help = "Output image file path")]
        output: Option<PathBuf>,

        #[command(flatten)]
        shrink: ShrinkArgs,
    },

    #[command(
        about = "Compress multiple images in parallel",
        long_about = "Process a directory, a single file or a glob pattern. Each file is \
                      compressed independently; failures are reported and counted."
    )]
    Batch {
        #[arg(help = "Input directory, file, or glob pattern")]
        input: String,

        #[arg(help = "Output directory path")]
        output: PathBuf,

        #[arg(short = 'r', long, help = "Process subdirectories recursively")]
        recursive: bool,

        #[arg(short = 'j', long, help = "Number of parallel threads (default: auto)")]
        threads: Option<usize>,

        #[command(flatten)]
        shrink: ShrinkArgs,
    },

    #[command(
        about = "Show image properties and the planned output",
        long_about = "Print dimensions, type and size of an image, and the dimensions and \
                      format compression would produce with the given options."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,

        #[command(flatten)]
        shrink: ShrinkArgs,
    },
}
