use crate::error::{CompressionError, Result};
use crate::formats::SourceFormat;
use crate::validation::{validate_declared_input, validate_input_path};
use image::{DynamicImage, ImageReader};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// An input file as selected by the user: its raw bytes, declared type and
/// name. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    name: String,
    bytes: Vec<u8>,
    format: SourceFormat,
}

impl SourceImage {
    /// Builds a source from in-memory bytes and a declared MIME type,
    /// applying the allow-list and size checks.
    pub fn from_bytes(name: impl Into<String>, mime: &str, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let format = validate_declared_input(&name, mime, &bytes)?;
        Ok(Self {
            name,
            bytes,
            format,
        })
    }

    /// Reads and validates a file from disk. The declared type comes from
    /// the file extension.
    pub fn open(path: &Path) -> Result<Self> {
        validate_input_path(path)?;
        let declared = SourceFormat::from_path(path)?;
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CompressionError::FileNotFound(path.to_path_buf()))?;

        tracing::debug!(
            "Loaded {} ({} bytes, declared {})",
            name,
            bytes.len(),
            declared
        );

        Self::from_bytes(name, declared.mime_type(), bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Decodes the pixel data. The decoder picks the format from the content,
    /// so a mislabelled but valid file still decodes.
    pub fn decode(&self) -> Result<DynamicImage> {
        let reader = ImageReader::new(Cursor::new(self.bytes.as_slice())).with_guessed_format()?;
        let img = reader.decode()?;
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Write;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_from_bytes_and_decode() {
        let source = SourceImage::from_bytes("pic.png", "image/png", png_bytes(12, 7)).unwrap();
        assert_eq!(source.format(), SourceFormat::Png);
        assert_eq!(source.name(), "pic.png");
        assert!(source.byte_len() > 0);

        let img = source.decode().unwrap();
        assert_eq!((img.width(), img.height()), (12, 7));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let source =
            SourceImage::from_bytes("bad.jpg", "image/jpeg", b"fake image data".to_vec()).unwrap();
        assert!(source.decode().is_err());
    }

    #[test]
    fn test_open_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("disk.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&png_bytes(4, 4))
            .unwrap();

        let source = SourceImage::open(&path).unwrap();
        assert_eq!(source.name(), "disk.png");
        assert_eq!(source.mime_type(), "image/png");
    }

    #[test]
    fn test_open_missing_file() {
        let result = SourceImage::open(Path::new("/nonexistent/missing.png"));
        assert!(matches!(result, Err(CompressionError::FileNotFound(_))));
    }
}
