pub const DEFAULT_MAX_WIDTH: u32 = 800;
pub const DEFAULT_MAX_HEIGHT: u32 = 800;

/// Default quality factor as a fraction of the encoder's full range.
pub const DEFAULT_QUALITY: f32 = 0.6;
pub const MIN_ENCODER_QUALITY: u8 = 1;
pub const MAX_ENCODER_QUALITY: u8 = 100;

/// Largest input accepted before any transform work (10 MiB).
pub const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub const OUTPUT_FILE_PREFIX: &str = "compressed-";

pub const OXIPNG_PRESET: u8 = 2;

pub const MAX_BATCH_FILES: usize = 1000;
pub const MIN_AVAILABLE_MEMORY_MIB: u64 = 256;
/// Decoded pixel buffers are typically several times the encoded size.
pub const DECODE_MEMORY_MULTIPLIER: f64 = 4.0;

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
