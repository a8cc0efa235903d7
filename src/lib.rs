pub mod artifact;
pub mod batch;
pub mod cli;
pub mod constants;
pub mod dimensions;
pub mod error;
pub mod formats;
pub mod info;
pub mod logger;
pub mod processing;
pub mod session;
pub mod source;
pub mod stats;
pub mod validation;

pub use artifact::{default_output_name, Artifact};
pub use batch::{
    batch_compress_images, collect_image_files, generate_output_path, plan_output_paths,
    BatchSummary,
};
pub use dimensions::{target_dimensions, Bounds, ClampStrategy};
pub use error::{CompressionError, Result};
pub use formats::{OutputFormat, SourceFormat};
pub use info::{get_image_info, ImageInfo};
pub use processing::{
    compress, compress_async, compress_decoded, CompressionOptions, EncodedOutput, Quality,
};
pub use session::{CompressionResult, CompressorSession};
pub use source::SourceImage;
pub use stats::{format_kb, reduction_percent, CompressionStats};
