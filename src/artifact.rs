use crate::error::{CompressionError, Result};
use crate::formats::OutputFormat;
use crate::validation::validate_output_path;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// A staged, downloadable copy of an encoded result.
///
/// The backing temp file lives until the artifact is released, either
/// explicitly or by being dropped when a newer result supersedes it.
#[derive(Debug)]
pub struct Artifact {
    file: Option<NamedTempFile>,
    path: PathBuf,
    format: OutputFormat,
}

impl Artifact {
    pub fn stage(bytes: &[u8], format: OutputFormat) -> Result<Self> {
        let suffix = format!(".{}", format.extension());
        let mut file = Builder::new()
            .prefix("img-shrink-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        tracing::debug!("Staged {} bytes at {:?}", bytes.len(), path);

        Ok(Self {
            file: Some(file),
            path,
            format,
        })
    }

    /// Location of the staged bytes. Only meaningful while not released.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_released(&self) -> bool {
        self.file.is_none()
    }

    /// Copy the staged bytes to `destination`, creating parent directories.
    pub fn persist_to(&self, destination: &Path) -> Result<u64> {
        let file = self.file.as_ref().ok_or(CompressionError::NoResult)?;
        let destination = validate_output_path(destination)?;
        let written = fs::copy(file.path(), &destination)?;
        tracing::debug!("Wrote {} bytes to {:?}", written, destination);
        Ok(written)
    }

    /// Delete the staged file now rather than on drop.
    pub fn release(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            tracing::debug!("Releasing staged artifact {:?}", self.path);
            file.close()?;
        }
        Ok(())
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Failed to release staged artifact {:?}: {}", self.path, e);
        }
    }
}

/// Default download name for a result: `compressed-<stem>.<ext>`.
pub fn default_output_name(source_name: &str, format: OutputFormat) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!(
        "{}{}.{}",
        crate::constants::OUTPUT_FILE_PREFIX,
        stem,
        format.extension()
    )
}
