//! Size statistics shown after a compression run.
use crate::processing::EncodedOutput;
use crate::source::SourceImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    pub source_dimensions: (u32, u32),
    pub output_dimensions: (u32, u32),
}

impl CompressionStats {
    pub fn new(source: &SourceImage, source_dimensions: (u32, u32), output: &EncodedOutput) -> Self {
        Self {
            original_size: source.byte_len(),
            compressed_size: output.size(),
            source_dimensions,
            output_dimensions: (output.width, output.height),
        }
    }

    pub fn reduction_percent(&self) -> u64 {
        reduction_percent(self.original_size, self.compressed_size)
    }

    pub fn compression_ratio(&self) -> f64 {
        calculate_compression_ratio(self.original_size, self.compressed_size)
    }
}

/// Format a byte count as kibibytes with one decimal, e.g. `"12.3 KB"`.
pub fn format_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.2 MB", "512 B")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Whole-percent size reduction, floored at zero: a result larger than the
/// original reports 0%.
pub fn reduction_percent(original_size: u64, compressed_size: u64) -> u64 {
    if original_size == 0 {
        return 0;
    }
    let kept = (compressed_size as f64 / original_size as f64 * 100.0).round();
    (100.0 - kept).max(0.0) as u64
}

/// Signed compression ratio as a percentage (negative means the output grew).
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - compressed_size as f64) / original_size as f64) * 100.0
}

pub fn print_compression_report(stats: &CompressionStats) {
    let (src_w, src_h) = stats.source_dimensions;
    let (out_w, out_h) = stats.output_dimensions;

    println!("📊 Size before compression: {}", format_kb(stats.original_size));
    println!("📈 Size after compression:  {}", format_kb(stats.compressed_size));
    println!("🎯 Reduction: {}%", stats.reduction_percent());
    println!("📏 Dimensions: {}x{} -> {}x{}", src_w, src_h, out_w, out_h);

    let ratio = stats.compression_ratio();
    if ratio < 0.0 {
        println!("⚠️  File size increased by {:.1}%", ratio.abs());
    }
}
