use anyhow::{Context, Result};
use clap::Parser;
use img_shrink::batch::{batch_compress_images, print_batch_summary};
use img_shrink::cli::{Args, Commands};
use img_shrink::constants::PROGRESS_SPINNER_TEMPLATE;
use img_shrink::info::{get_image_info, print_image_info};
use img_shrink::logger::{self, Verbosity};
use img_shrink::processing::CompressionOptions;
use img_shrink::session::CompressorSession;
use img_shrink::stats::print_compression_report;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(Verbosity::from_flags(args.quiet, args.verbose));

    match args.command {
        Commands::Compress {
            input,
            output,
            shrink,
        } => {
            let options = shrink.to_options()?;
            compress_one(&input, output, &options)?;
        }
        Commands::Batch {
            input,
            output,
            recursive,
            threads,
            shrink,
        } => {
            let options = shrink.to_options()?;
            let summary = batch_compress_images(&input, &output, &options, recursive, threads)
                .with_context(|| format!("batch compression of {} failed", input))?;
            print_batch_summary(&summary);
        }
        Commands::Info { input, shrink } => {
            let options = shrink.to_options()?;
            println!("📋 Getting info for: {:?}", input);
            let info = get_image_info(&input, &options)
                .with_context(|| format!("cannot read {}", input.display()))?;
            print_image_info(&info, &options);
        }
    }

    Ok(())
}

fn compress_one(input: &Path, output: Option<PathBuf>, options: &CompressionOptions) -> Result<()> {
    println!("🗜️  Compressing image: {:?}", input);

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(PROGRESS_SPINNER_TEMPLATE) {
        pb.set_style(style);
    }
    pb.set_message("Loading image...");

    let mut session = CompressorSession::new();
    session
        .open(input)
        .with_context(|| format!("cannot use {}", input.display()))?;

    pb.set_message("Compressing...");
    let result = session.compress(options);
    pb.finish_and_clear();
    let stats = result
        .with_context(|| format!("compression of {} failed", input.display()))?
        .stats;

    let destination = match output {
        Some(path) => path,
        None => {
            let dir = input.parent().unwrap_or_else(|| Path::new(""));
            session.default_output_path(dir)?
        }
    };
    session
        .save_result(&destination)
        .with_context(|| format!("cannot write {}", destination.display()))?;

    println!("📁 Output: {:?}", destination);
    print_compression_report(&stats);

    session.reset();
    Ok(())
}
