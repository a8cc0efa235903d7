use crate::constants::{DEFAULT_QUALITY, MAX_ENCODER_QUALITY, MIN_ENCODER_QUALITY, OXIPNG_PRESET};
use crate::dimensions::{target_dimensions, Bounds, ClampStrategy};
use crate::error::{CompressionError, Result};
use crate::formats::OutputFormat;
use crate::source::SourceImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use oxipng::Options;
use std::borrow::Cow;
use std::io::Cursor;

/// Lossy encoder quality as a fraction in `[0, 1]`. Zero maps to the
/// encoder's lowest setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    pub fn new(fraction: f32) -> Result<Self> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(CompressionError::InvalidQuality(fraction));
        }
        Ok(Self(fraction))
    }

    pub fn fraction(&self) -> f32 {
        self.0
    }

    /// The value handed to the JPEG encoder, on its 1-100 scale.
    pub fn encoder_value(&self) -> u8 {
        let scaled = (self.0 * 100.0).round() as u8;
        scaled.clamp(MIN_ENCODER_QUALITY, MAX_ENCODER_QUALITY)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

#[derive(Debug, Clone)]
pub struct CompressionOptions {
    pub quality: Quality,
    pub bounds: Bounds,
    pub clamp: ClampStrategy,
    pub filter: FilterType,
    pub optimize_png: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            bounds: Bounds::default(),
            clamp: ClampStrategy::default(),
            filter: FilterType::Lanczos3,
            optimize_png: true,
        }
    }
}

impl CompressionOptions {
    pub fn new(
        quality: Option<f32>,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> Result<Self> {
        let defaults = Bounds::default();
        let quality = match quality {
            Some(q) => Quality::new(q)?,
            None => Quality::default(),
        };
        let bounds = Bounds::new(
            max_width.unwrap_or(defaults.max_width),
            max_height.unwrap_or(defaults.max_height),
        )?;

        Ok(Self {
            quality,
            bounds,
            ..Self::default()
        })
    }

    pub fn with_clamp(mut self, clamp: ClampStrategy) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_png_optimization(mut self, enabled: bool) -> Self {
        self.optimize_png = enabled;
        self
    }

    pub fn target_for(&self, width: u32, height: u32) -> (u32, u32) {
        target_dimensions(width, height, self.bounds, self.clamp)
    }
}

/// Parses a resampling filter name as accepted on the command line.
pub fn parse_filter(name: &str) -> std::result::Result<FilterType, String> {
    match name.to_lowercase().as_str() {
        "nearest" => Ok(FilterType::Nearest),
        "triangle" | "bilinear" => Ok(FilterType::Triangle),
        "catmullrom" | "bicubic" => Ok(FilterType::CatmullRom),
        "gaussian" => Ok(FilterType::Gaussian),
        "lanczos3" | "lanczos" => Ok(FilterType::Lanczos3),
        other => Err(format!("unknown resize filter '{}'", other)),
    }
}

/// A finished encode: the bytes plus what they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedOutput {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedOutput {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Decode, downsize and re-encode a source image.
///
/// The output format follows the source: PNG stays PNG, anything else becomes
/// JPEG. Decoding failures surface as `CompressionError::Decode`; an encoder
/// that yields no bytes surfaces as `CompressionError::EncodeFailed`.
pub fn compress(source: &SourceImage, options: &CompressionOptions) -> Result<EncodedOutput> {
    let img = source.decode()?;
    let format = OutputFormat::for_source(source.format());
    tracing::debug!(
        "Decoded {} as {}x{} {:?}",
        source.name(),
        img.width(),
        img.height(),
        img.color()
    );
    compress_decoded(&img, format, options)
}

/// Runs [`compress`] on the blocking pool so async callers yield while the
/// image is decoded and encoded.
pub async fn compress_async(
    source: SourceImage,
    options: CompressionOptions,
) -> Result<EncodedOutput> {
    tokio::task::spawn_blocking(move || compress(&source, &options))
        .await
        .map_err(|e| CompressionError::TaskJoin(e.to_string()))?
}

/// Resize and encode an already decoded image.
pub fn compress_decoded(
    img: &DynamicImage,
    format: OutputFormat,
    options: &CompressionOptions,
) -> Result<EncodedOutput> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(CompressionError::EncodeFailed(
            "decoded image has no pixels".to_string(),
        ));
    }

    let (target_w, target_h) = options.target_for(width, height);
    let surface = resize_image(img, target_w, target_h, options.filter);

    let bytes = encode_image(&surface, format, options)?;
    if bytes.is_empty() {
        return Err(CompressionError::EncodeFailed(format!(
            "{} encoder produced no data",
            format
        )));
    }

    Ok(EncodedOutput {
        bytes,
        format,
        width: surface.width(),
        height: surface.height(),
    })
}

/// Rasterize `img` at the given size. Returns the source untouched when no
/// resize is needed.
pub fn resize_image(
    img: &DynamicImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Cow<'_, DynamicImage> {
    if img.dimensions() == (width, height) {
        return Cow::Borrowed(img);
    }

    tracing::info!(
        "Resizing {}x{} -> {}x{}",
        img.width(),
        img.height(),
        width,
        height
    );
    Cow::Owned(img.resize_exact(width, height, filter))
}

pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    options: &CompressionOptions,
) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());

    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, options.quality.encoder_value());
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| CompressionError::EncodeFailed(format!("JPEG encode failed: {e}")))?;
        }
        OutputFormat::Png => {
            if options.quality != Quality::default() {
                tracing::debug!("PNG output is lossless, quality setting ignored");
            }
            let encoder = PngEncoder::new(&mut buf);
            img.write_with_encoder(encoder)
                .map_err(|e| CompressionError::EncodeFailed(format!("PNG encode failed: {e}")))?;
        }
    }

    let bytes = buf.into_inner();

    if format == OutputFormat::Png && options.optimize_png && !bytes.is_empty() {
        return optimize_png(bytes);
    }

    Ok(bytes)
}

/// Lossless recompression with oxipng. Keeps the original bytes when oxipng
/// cannot do better.
fn optimize_png(bytes: Vec<u8>) -> Result<Vec<u8>> {
    let mut oxipng_options = Options::from_preset(OXIPNG_PRESET);
    oxipng_options.force = false;

    let optimized = oxipng::optimize_from_memory(&bytes, &oxipng_options)
        .map_err(|e| CompressionError::PngOptimization(e.to_string()))?;

    if !optimized.is_empty() && optimized.len() < bytes.len() {
        tracing::debug!("oxipng: {} -> {} bytes", bytes.len(), optimized.len());
        Ok(optimized)
    } else {
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    fn source_from(img: &DynamicImage, format: ImageFormat, name: &str, mime: &str) -> SourceImage {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        SourceImage::from_bytes(name, mime, buf.into_inner()).unwrap()
    }

    #[test]
    fn test_quality_validation() {
        assert!(Quality::new(0.6).is_ok());
        assert!(Quality::new(1.0).is_ok());
        assert!(Quality::new(0.0).is_ok());
        assert!(matches!(Quality::new(-0.1), Err(CompressionError::InvalidQuality(_))));
        assert!(Quality::new(1.01).is_err());
        assert!(Quality::new(f32::NAN).is_err());
    }

    #[test]
    fn test_quality_encoder_value() {
        assert_eq!(Quality::default().encoder_value(), 60);
        assert_eq!(Quality::new(1.0).unwrap().encoder_value(), 100);
        assert_eq!(Quality::new(0.001).unwrap().encoder_value(), 1);
        assert_eq!(Quality::new(0.0).unwrap().encoder_value(), 1);
    }

    #[test]
    fn test_compression_options_default() {
        let options = CompressionOptions::new(None, None, None).unwrap();
        assert_eq!(options.quality.fraction(), 0.6);
        assert_eq!(options.bounds, Bounds::new(800, 800).unwrap());
        assert_eq!(options.clamp, ClampStrategy::Fit);
        assert!(options.optimize_png);
    }

    #[test]
    fn test_compression_options_invalid() {
        assert!(matches!(
            CompressionOptions::new(Some(1.5), None, None),
            Err(CompressionError::InvalidQuality(_))
        ));
        assert!(matches!(
            CompressionOptions::new(None, Some(0), None),
            Err(CompressionError::InvalidBounds(0, 800))
        ));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("lanczos3").unwrap(), FilterType::Lanczos3);
        assert_eq!(parse_filter("Nearest").unwrap(), FilterType::Nearest);
        assert!(parse_filter("sharp").is_err());
    }

    #[test]
    fn test_resize_image_borrows_when_unchanged() {
        let img = gradient(50, 40);
        let out = resize_image(&img, 50, 40, FilterType::Nearest);
        assert!(matches!(out, Cow::Borrowed(_)));

        let out = resize_image(&img, 25, 20, FilterType::Nearest);
        assert_eq!(out.dimensions(), (25, 20));
    }

    #[test]
    fn test_compress_jpeg_landscape() {
        let source = source_from(&gradient(1600, 1200), ImageFormat::Jpeg, "a.jpg", "image/jpeg");
        let options = CompressionOptions::default();

        let output = compress(&source, &options).unwrap();
        assert_eq!(output.format, OutputFormat::Jpeg);
        assert_eq!((output.width, output.height), (800, 600));
        assert_eq!(&output.bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(output.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_compress_png_portrait_stays_png() {
        let source = source_from(&gradient(1000, 2000), ImageFormat::Png, "b.png", "image/png");
        let options = CompressionOptions::default().with_filter(FilterType::Triangle);

        let output = compress(&source, &options).unwrap();
        assert_eq!(output.format, OutputFormat::Png);
        assert_eq!((output.width, output.height), (400, 800));
        assert_eq!(
            &output.bytes[0..8],
            &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
        );

        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (400, 800));
    }

    #[test]
    fn test_compress_webp_becomes_jpeg() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 20, Rgba([10, 20, 30, 128])));
        let source = source_from(&rgba, ImageFormat::WebP, "c.webp", "image/webp");

        let output = compress(&source, &CompressionOptions::default()).unwrap();
        assert_eq!(output.format, OutputFormat::Jpeg);
        assert_eq!((output.width, output.height), (30, 20));
    }

    #[test]
    fn test_compress_small_image_not_upscaled() {
        let source = source_from(&gradient(320, 200), ImageFormat::Png, "s.png", "image/png");
        let output = compress(&source, &CompressionOptions::default()).unwrap();
        assert_eq!((output.width, output.height), (320, 200));
    }

    #[test]
    fn test_compress_malformed_input_fails() {
        let source =
            SourceImage::from_bytes("bad.jpg", "image/jpeg", b"fake image data".to_vec()).unwrap();
        let result = compress(&source, &CompressionOptions::default());
        assert!(matches!(result, Err(CompressionError::Decode(_))));
    }

    #[test]
    fn test_compress_decoded_empty_surface_fails() {
        let img = DynamicImage::new_rgb8(0, 0);
        let result = compress_decoded(&img, OutputFormat::Jpeg, &CompressionOptions::default());
        assert!(matches!(result, Err(CompressionError::EncodeFailed(_))));
    }

    #[test]
    fn test_lower_quality_gives_smaller_jpeg() {
        let img = gradient(400, 300);
        let high = CompressionOptions::new(Some(0.95), None, None).unwrap();
        let low = CompressionOptions::new(Some(0.2), None, None).unwrap();

        let high_out = compress_decoded(&img, OutputFormat::Jpeg, &high).unwrap();
        let low_out = compress_decoded(&img, OutputFormat::Jpeg, &low).unwrap();
        assert!(low_out.size() < high_out.size());
    }

    #[test]
    fn test_png_ignores_quality() {
        let img = gradient(64, 64);
        let a = CompressionOptions::new(Some(0.1), None, None)
            .unwrap()
            .with_png_optimization(false);
        let b = CompressionOptions::new(Some(1.0), None, None)
            .unwrap()
            .with_png_optimization(false);

        let out_a = compress_decoded(&img, OutputFormat::Png, &a).unwrap();
        let out_b = compress_decoded(&img, OutputFormat::Png, &b).unwrap();
        assert_eq!(out_a.bytes, out_b.bytes);
    }

    #[tokio::test]
    async fn test_compress_async() {
        let source = source_from(&gradient(1600, 1200), ImageFormat::Png, "d.png", "image/png");
        let output = compress_async(source, CompressionOptions::default())
            .await
            .unwrap();
        assert_eq!((output.width, output.height), (800, 600));
        assert_eq!(output.format, OutputFormat::Png);
    }
}
