use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Input is empty: {0}")]
    EmptyInput(String),

    #[error("Unsupported file type: {0}. Please use JPG, PNG, or WebP images")]
    UnsupportedType(String),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Invalid quality value: {0}. Must be a fraction between 0 and 1")]
    InvalidQuality(f32),

    #[error("Invalid bounding box: {0}x{1}. Both bounds must be positive")]
    InvalidBounds(u32, u32),

    #[error("Unable to compress this image: {0}")]
    EncodeFailed(String),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("No image selected")]
    NoSourceLoaded,

    #[error("No compression result available")]
    NoResult,

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("No image files found in input path: {0}")]
    NoImageFilesFound(String),

    #[error("Batch file count limit exceeded: {0} files, maximum allowed {1}")]
    BatchFileLimitExceeded(usize, usize),

    #[error(
        "Insufficient available memory: estimated batch requires {0}MB, but only {1}MB available"
    )]
    InsufficientMemory(u64, u64),

    #[error("Output {0} would overwrite another file of the batch")]
    OutputCollision(PathBuf),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

impl CompressionError {
    /// True for failures raised before any transform work began.
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            CompressionError::FileNotFound(_)
                | CompressionError::EmptyInput(_)
                | CompressionError::UnsupportedType(_)
                | CompressionError::FileTooLarge(_, _)
                | CompressionError::NoSourceLoaded
        )
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_rejection_classification() {
        assert!(CompressionError::FileTooLarge(11, 10).is_input_rejection());
        assert!(CompressionError::UnsupportedType("image/gif".into()).is_input_rejection());
        assert!(CompressionError::EmptyInput("a.png".into()).is_input_rejection());
        assert!(!CompressionError::EncodeFailed("empty".into()).is_input_rejection());
        assert!(!CompressionError::NoResult.is_input_rejection());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            CompressionError::FileTooLarge(20, 10).to_string(),
            "File too large: 20 bytes. Maximum allowed: 10 bytes"
        );
        assert!(CompressionError::InvalidQuality(1.5)
            .to_string()
            .contains("1.5"));
    }
}
