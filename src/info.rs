use crate::error::Result;
use crate::formats::OutputFormat;
use crate::processing::CompressionOptions;
use crate::source::SourceImage;
use crate::stats::format_file_size;
use image::{ColorType, GenericImageView};
use std::path::Path;

/// What a source looks like and what compressing it would produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub name: String,
    pub mime_type: &'static str,
    pub byte_len: u64,
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
    pub target_width: u32,
    pub target_height: u32,
    pub output_format: OutputFormat,
}

impl ImageInfo {
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn needs_resize(&self) -> bool {
        (self.width, self.height) != (self.target_width, self.target_height)
    }
}

pub fn get_image_info(input_path: &Path, options: &CompressionOptions) -> Result<ImageInfo> {
    let source = SourceImage::open(input_path)?;
    describe(&source, options)
}

pub fn describe(source: &SourceImage, options: &CompressionOptions) -> Result<ImageInfo> {
    let img = source.decode()?;
    let (width, height) = img.dimensions();
    let (target_width, target_height) = options.target_for(width, height);

    Ok(ImageInfo {
        name: source.name().to_string(),
        mime_type: source.mime_type(),
        byte_len: source.byte_len(),
        width,
        height,
        color: img.color(),
        target_width,
        target_height,
        output_format: OutputFormat::for_source(source.format()),
    })
}

pub fn print_image_info(info: &ImageInfo, options: &CompressionOptions) {
    println!("📋 Basic Information:");
    println!("  📁 File: {}", info.name);
    println!("  🎭 Type: {}", info.mime_type);
    println!(
        "  📦 File size: {} bytes ({})",
        info.byte_len,
        format_file_size(info.byte_len)
    );
    println!("  📏 Dimensions: {}x{} pixels", info.width, info.height);
    println!("  🎨 Color type: {:?}", info.color);
    println!("  📐 Aspect ratio: {:.2}:1", info.aspect_ratio());

    println!("\n💡 Planned Output:");
    println!(
        "  📦 Bounding box: {}x{} ({})",
        options.bounds.max_width, options.bounds.max_height, options.clamp
    );
    if info.needs_resize() {
        println!(
            "  📏 Resize to: {}x{} pixels",
            info.target_width, info.target_height
        );
    } else {
        println!("  📏 Already within bounds, no resize");
    }
    println!("  🎭 Output format: {}", info.output_format);
    if info.output_format.supports_quality() {
        println!("  🎯 Quality: {:.2}", options.quality.fraction());
    } else {
        println!("  🎯 Quality: n/a (lossless)");
    }
}
