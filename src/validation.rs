use crate::constants::{MAX_INPUT_BYTES, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::{CompressionError, Result};
use crate::formats::SourceFormat;
use std::fs;
use std::path::{Path, PathBuf};

/// Validate an input path before reading it: it must exist, be a regular
/// file, and fit under the input size cap.
pub fn validate_input_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CompressionError::FileNotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(CompressionError::UnsupportedType(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let metadata =
        fs::metadata(path).map_err(|_| CompressionError::FileNotFound(path.to_path_buf()))?;

    if metadata.len() > MAX_INPUT_BYTES {
        return Err(CompressionError::FileTooLarge(metadata.len(), MAX_INPUT_BYTES));
    }

    Ok(())
}

/// Check a declared input against the allow-list and the size cap.
///
/// The declared type decides the output format. When the content sniffs as a
/// different allowed type the mismatch is logged but the declared type wins.
pub fn validate_declared_input(name: &str, mime: &str, bytes: &[u8]) -> Result<SourceFormat> {
    if bytes.is_empty() {
        return Err(CompressionError::EmptyInput(name.to_string()));
    }

    let declared = SourceFormat::from_mime(mime)?;

    let len = bytes.len() as u64;
    if len > MAX_INPUT_BYTES {
        return Err(CompressionError::FileTooLarge(len, MAX_INPUT_BYTES));
    }

    if let Some(sniffed) = SourceFormat::sniff(bytes) {
        if sniffed != declared {
            tracing::warn!(
                "{} is declared as {} but its content looks like {}",
                name,
                declared,
                sniffed
            );
        }
    }

    Ok(declared)
}

/// Validate an output path and create its parent directory if needed.
pub fn validate_output_path(path: &Path) -> Result<PathBuf> {
    if path.file_name().is_none() {
        return Err(CompressionError::UnsupportedType(format!(
            "invalid output file name: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|_| CompressionError::DirectoryCreationFailed(parent.to_path_buf()))?;
    }

    Ok(path.to_path_buf())
}

/// Check if the file extension is on the input allow-list.
pub fn is_supported_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
