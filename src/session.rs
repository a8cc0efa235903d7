use crate::artifact::{default_output_name, Artifact};
use crate::error::{CompressionError, Result};
use crate::formats::OutputFormat;
use crate::processing::{compress_decoded, CompressionOptions, EncodedOutput};
use crate::source::SourceImage;
use crate::stats::CompressionStats;
use image::GenericImageView;
use std::path::{Path, PathBuf};

/// Output of one successful compression, together with its staged file.
#[derive(Debug)]
pub struct CompressionResult {
    pub output: EncodedOutput,
    pub stats: CompressionStats,
    artifact: Artifact,
}

impl CompressionResult {
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    fn release(&mut self) {
        if let Err(e) = self.artifact.release() {
            tracing::warn!("Failed to release previous result: {}", e);
        }
    }
}

/// Holds the currently selected source and at most one result.
///
/// Installing a new source or a new result releases the previous result's
/// staged file. A failed compression leaves the previous result in place.
#[derive(Debug, Default)]
pub struct CompressorSession {
    source: Option<SourceImage>,
    result: Option<CompressionResult>,
}

impl CompressorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn result(&self) -> Option<&CompressionResult> {
        self.result.as_ref()
    }

    /// Select a new source image. Any result from the previous source is
    /// released.
    pub fn load(&mut self, source: SourceImage) {
        tracing::debug!("Selected {} ({})", source.name(), source.mime_type());
        self.release_result();
        self.source = Some(source);
    }

    pub fn open(&mut self, path: &Path) -> Result<&SourceImage> {
        let source = SourceImage::open(path)?;
        self.load(source);
        self.source.as_ref().ok_or(CompressionError::NoSourceLoaded)
    }

    /// Compress the selected source and install the result.
    pub fn compress(&mut self, options: &CompressionOptions) -> Result<&CompressionResult> {
        let source = self.source.as_ref().ok_or(CompressionError::NoSourceLoaded)?;

        let img = source.decode()?;
        let format = OutputFormat::for_source(source.format());
        let output = compress_decoded(&img, format, options)?;
        let stats = CompressionStats::new(source, img.dimensions(), &output);
        let artifact = Artifact::stage(&output.bytes, output.format)?;

        tracing::info!(
            "Compressed {}: {} -> {} bytes ({})",
            source.name(),
            stats.original_size,
            stats.compressed_size,
            output.mime_type()
        );

        self.release_result();
        Ok(&*self.result.insert(CompressionResult {
            output,
            stats,
            artifact,
        }))
    }

    /// Suggested download location for the current result inside `dir`.
    pub fn default_output_path(&self, dir: &Path) -> Result<PathBuf> {
        let source = self.source.as_ref().ok_or(CompressionError::NoSourceLoaded)?;
        let result = self.result.as_ref().ok_or(CompressionError::NoResult)?;
        Ok(dir.join(default_output_name(source.name(), result.output.format)))
    }

    /// Write the current result to `destination`.
    pub fn save_result(&self, destination: &Path) -> Result<u64> {
        let result = self.result.as_ref().ok_or(CompressionError::NoResult)?;
        result.artifact.persist_to(destination)
    }

    /// Drop the source and release the current result.
    pub fn reset(&mut self) {
        self.release_result();
        self.source = None;
    }

    fn release_result(&mut self) {
        if let Some(mut previous) = self.result.take() {
            previous.release();
        }
    }
}
