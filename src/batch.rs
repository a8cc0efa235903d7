use crate::artifact::default_output_name;
use crate::constants::{
    DECODE_MEMORY_MULTIPLIER, MAX_BATCH_FILES, MIN_AVAILABLE_MEMORY_MIB, OUTPUT_FILE_PREFIX,
    PROGRESS_BAR_TEMPLATE,
};
use crate::error::{CompressionError, Result};
use crate::formats::{OutputFormat, SourceFormat};
use crate::processing::CompressionOptions;
use crate::session::CompressorSession;
use crate::stats::{format_file_size, reduction_percent};
use crate::validation::is_supported_image_file;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
    pub total_before: u64,
    pub total_after: u64,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn reduction_percent(&self) -> u64 {
        reduction_percent(self.total_before, self.total_after)
    }
}

/// Estimates decoded memory for an image file from its encoded size, in MiB.
fn estimate_image_memory_usage(file_path: &Path) -> Result<f64> {
    let metadata = fs::metadata(file_path)?;
    let file_size_mib = metadata.len() as f64 / (1024.0 * 1024.0);
    Ok(file_size_mib * DECODE_MEMORY_MULTIPLIER)
}

fn available_memory_mib() -> u64 {
    let mut sys =
        System::new_with_specifics(RefreshKind::new().with_memory(MemoryRefreshKind::new()));
    sys.refresh_memory();
    sys.available_memory() / (1024 * 1024)
}

/// Rejects batches that are too large to run safely. Returns the estimated
/// peak memory in MiB if every file were decoded at once.
fn validate_batch_limits(image_files: &[PathBuf]) -> Result<f64> {
    if image_files.len() > MAX_BATCH_FILES {
        return Err(CompressionError::BatchFileLimitExceeded(
            image_files.len(),
            MAX_BATCH_FILES,
        ));
    }

    let estimates = image_files
        .iter()
        .map(|p| estimate_image_memory_usage(p))
        .collect::<Result<Vec<f64>>>()?;

    let total_memory_mib: f64 = estimates.iter().sum();
    let largest_single = estimates.iter().copied().fold(0.0_f64, f64::max).ceil() as u64;

    let available = available_memory_mib();
    if largest_single + MIN_AVAILABLE_MEMORY_MIB > available {
        return Err(CompressionError::InsufficientMemory(largest_single, available));
    }

    Ok(total_memory_mib)
}

/// Picks a thread count that keeps concurrent decodes within available memory.
fn choose_parallelism(requested: Option<usize>, file_count: usize, estimated_mib: f64) -> usize {
    let baseline = requested.unwrap_or_else(num_cpus::get).max(1).min(file_count.max(1));
    let avg_per_file_mib = ((estimated_mib / file_count.max(1) as f64).ceil() as u64).max(1);
    let mem_cap = (available_memory_mib().saturating_sub(MIN_AVAILABLE_MEMORY_MIB)
        / avg_per_file_mib)
        .clamp(1, baseline as u64) as usize;
    baseline.min(mem_cap)
}

pub fn batch_compress_images(
    input: &str,
    output: &Path,
    options: &CompressionOptions,
    recursive: bool,
    threads: Option<usize>,
) -> Result<BatchSummary> {
    tracing::info!("Starting batch compression of {} into {:?}", input, output);
    let start_time = Instant::now();

    let image_files = collect_image_files(input, recursive)?;
    let total_files = image_files.len();

    if total_files == 0 {
        tracing::warn!("No image files found in the input path");
        return Ok(BatchSummary::default());
    }

    let estimated_memory_mib = validate_batch_limits(&image_files)?;
    let parallelism = choose_parallelism(threads, total_files, estimated_memory_mib);
    tracing::info!(
        "Found {} image files, estimated {:.1} MiB decoded, using {} threads",
        total_files,
        estimated_memory_mib,
        parallelism
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .build()
        .map_err(|e| CompressionError::TaskJoin(e.to_string()))?;

    fs::create_dir_all(output)
        .map_err(|_| CompressionError::DirectoryCreationFailed(output.to_path_buf()))?;
    let output_dir = output.canonicalize()?;
    let plan = plan_output_paths(&image_files, &output_dir);

    let progress = ProgressBar::new(total_files as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
        progress.set_style(style.progress_chars("#>-"));
    }

    let processed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let total_before = AtomicU64::new(0);
    let total_after = AtomicU64::new(0);

    pool.install(|| {
        plan.par_iter().for_each(|(input_path, destination)| {
            let outcome = destination
                .as_ref()
                .map_err(|e| e.to_string())
                .and_then(|output_path| {
                    process_single_image(input_path, output_path, options)
                        .map_err(|e| e.to_string())
                });
            match outcome {
                Ok((before, after)) => {
                    total_before.fetch_add(before, Ordering::Relaxed);
                    total_after.fetch_add(after, Ordering::Relaxed);
                    processed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::error!("Failed to process {:?}: {}", input_path, e);
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            progress.inc(1);
        });
    });

    progress.finish_with_message("done");

    let summary = BatchSummary {
        processed: processed.into_inner(),
        failed: failed.into_inner(),
        total_before: total_before.into_inner(),
        total_after: total_after.into_inner(),
        elapsed: start_time.elapsed(),
    };

    tracing::info!(
        "Batch finished: {} ok, {} failed in {:?}",
        summary.processed,
        summary.failed,
        summary.elapsed
    );

    Ok(summary)
}

pub fn print_batch_summary(summary: &BatchSummary) {
    println!("\n📊 Batch Compression Summary:");
    println!("  📁 Total files processed: {}", summary.processed);
    println!(
        "  📊 Total original size: {}",
        format_file_size(summary.total_before)
    );
    println!(
        "  📊 Total compressed size: {}",
        format_file_size(summary.total_after)
    );
    println!("  🎯 Overall reduction: {}%", summary.reduction_percent());
    println!("  ⏱️  Total time: {:?}", summary.elapsed);
    if summary.failed > 0 {
        println!("  ⚠️  Failed files: {}", summary.failed);
    }
}

pub fn collect_image_files(input: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();
    let input_path = Path::new(input);

    if input_path.is_file() {
        image_files.push(input_path.canonicalize()?);
    } else if input_path.is_dir() {
        let walker = if recursive {
            WalkDir::new(input_path).into_iter()
        } else {
            WalkDir::new(input_path).max_depth(1).into_iter()
        };

        for entry in walker.filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name())) {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && is_supported_image_file(path) {
                if let Ok(canonical_path) = path.canonicalize() {
                    image_files.push(canonical_path);
                }
            }
        }
    } else if let Ok(glob_pattern) = glob(input) {
        for entry in glob_pattern.flatten() {
            if entry.is_file() && is_supported_image_file(&entry) {
                if let Ok(canonical_path) = entry.canonicalize() {
                    image_files.push(canonical_path);
                }
            }
        }
    } else {
        return Err(CompressionError::NoImageFilesFound(input.to_string()));
    }

    image_files.sort();
    Ok(image_files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn process_single_image(
    input_path: &Path,
    output_path: &Path,
    options: &CompressionOptions,
) -> Result<(u64, u64)> {
    let mut session = CompressorSession::new();
    session.open(input_path)?;
    let stats = session.compress(options)?.stats;
    session.save_result(output_path)?;

    Ok((stats.original_size, stats.compressed_size))
}

/// Output location for a batch member: `compressed-<stem>.<ext>`, with the
/// extension of the format it will be re-encoded to.
pub fn generate_output_path(input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let file_name = input_path
        .file_name()
        .ok_or_else(|| CompressionError::UnsupportedType("Invalid file name".to_string()))?;

    let format = OutputFormat::for_source(SourceFormat::from_path(input_path)?);
    Ok(output_dir.join(default_output_name(&file_name.to_string_lossy(), format)))
}

/// Output location that also carries the source extension, for members whose
/// stems clash: `a.webp` becomes `compressed-a-webp.jpg`.
fn disambiguated_output_path(input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let file_stem = input_path
        .file_stem()
        .ok_or_else(|| CompressionError::UnsupportedType("Invalid file name".to_string()))?;
    let source_ext = input_path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let format = OutputFormat::for_source(SourceFormat::from_path(input_path)?);
    Ok(output_dir.join(format!(
        "{}{}-{}.{}",
        OUTPUT_FILE_PREFIX,
        file_stem.to_string_lossy(),
        source_ext,
        format.extension()
    )))
}

/// Assigns every batch member a destination inside `output_dir`.
///
/// Members whose default names clash keep their source extension in the name.
/// A destination still shared after that, or one that is itself a member of
/// the batch, is refused with `OutputCollision`. The first member in sorted
/// order keeps a shared destination.
pub fn plan_output_paths(
    image_files: &[PathBuf],
    output_dir: &Path,
) -> Vec<(PathBuf, Result<PathBuf>)> {
    let primary: Vec<Result<PathBuf>> = image_files
        .iter()
        .map(|p| generate_output_path(p, output_dir))
        .collect();

    let mut counts: HashMap<PathBuf, usize> = HashMap::new();
    for path in primary.iter().flatten() {
        *counts.entry(path.clone()).or_insert(0) += 1;
    }

    let inputs: HashSet<&Path> = image_files.iter().map(PathBuf::as_path).collect();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    image_files
        .iter()
        .zip(primary)
        .map(|(input_path, destination)| {
            let destination = match destination {
                Ok(path) if counts.get(&path).copied().unwrap_or(0) > 1 => {
                    disambiguated_output_path(input_path, output_dir)
                }
                other => other,
            }
            .and_then(|path| {
                if inputs.contains(path.as_path()) || !claimed.insert(path.clone()) {
                    Err(CompressionError::OutputCollision(path))
                } else {
                    Ok(path)
                }
            });

            if let Err(e) = &destination {
                tracing::warn!("Skipping {:?}: {}", input_path, e);
            }
            (input_path.clone(), destination)
        })
        .collect()
}
