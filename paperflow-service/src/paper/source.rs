//! Source image lifecycle: spooled upload file, decode-once raster, and
//! scoped release of the spool file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::DecodeError;

/// The uploaded worksheet image for one session.
///
/// Owns the spool file on disk for the duration of the session; the file is
/// removed exactly once when this value is dropped (image replaced, session
/// reset, or service teardown). The raster is decoded once at spool time and
/// shared with crop batches behind an `Arc`.
#[derive(Debug)]
pub struct SourceImage {
    spool: NamedTempFile,
    image: Arc<DynamicImage>,
    content_type: &'static str,
    hash: String,
}

impl SourceImage {
    /// Validate, decode, and spool an uploaded image.
    ///
    /// Decoding runs on the blocking pool; the returned error is the typed
    /// decode result the rest of the pipeline consumes. `declared_type`
    /// is the client-declared content type, rejected up front when it is
    /// present and not an image type.
    pub async fn spool(
        uploads_dir: PathBuf,
        bytes: Vec<u8>,
        declared_type: Option<String>,
        max_bytes: u64,
    ) -> Result<Self, DecodeError> {
        if bytes.len() as u64 > max_bytes {
            return Err(DecodeError::TooLarge {
                size: bytes.len() as u64,
                max: max_bytes,
            });
        }

        if let Some(declared) = &declared_type {
            let is_image = declared
                .parse::<mime::Mime>()
                .map(|m| m.type_() == mime::IMAGE)
                .unwrap_or(false);
            if !is_image {
                return Err(DecodeError::UnsupportedType {
                    content_type: declared.clone(),
                });
            }
        }

        tokio::task::spawn_blocking(move || Self::spool_blocking(&uploads_dir, &bytes))
            .await
            .map_err(|e| DecodeError::Io(std::io::Error::other(e)))?
    }

    fn spool_blocking(uploads_dir: &Path, bytes: &[u8]) -> Result<Self, DecodeError> {
        let image = image::load_from_memory(bytes).map_err(DecodeError::Malformed)?;

        let content_type = image::guess_format(bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("{:x}", hasher.finalize());

        let mut spool = tempfile::Builder::new()
            .prefix("worksheet-")
            .tempfile_in(uploads_dir)
            .map_err(DecodeError::Io)?;
        spool.write_all(bytes).map_err(DecodeError::Io)?;
        spool.flush().map_err(DecodeError::Io)?;

        debug!(
            path = %spool.path().display(),
            width = image.width(),
            height = image.height(),
            "Spooled source image"
        );

        Ok(Self {
            spool,
            image: Arc::new(image),
            content_type,
            hash,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Shared handle to the decoded raster for crop batches.
    pub fn raster(&self) -> Arc<DynamicImage> {
        self.image.clone()
    }

    /// SHA-256 of the upload bytes, used to detect identical re-uploads.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Path of the spool file, for serving the preview.
    pub fn path(&self) -> &Path {
        self.spool.path()
    }
}

impl Drop for SourceImage {
    fn drop(&mut self) {
        // NamedTempFile removes the spool file right after this.
        debug!(path = %self.spool.path().display(), "Releasing source image");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_spool_decodes_and_releases_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceImage::spool(
            dir.path().to_path_buf(),
            png_bytes(40, 30),
            Some("image/png".to_string()),
            1024 * 1024,
        )
        .await
        .unwrap();

        assert_eq!((source.width(), source.height()), (40, 30));
        assert_eq!(source.content_type(), "image/png");
        assert_eq!(source.hash().len(), 64);

        let path = source.path().to_path_buf();
        assert!(path.exists());
        drop(source);
        assert!(!path.exists(), "spool file must be released exactly once");
    }

    #[tokio::test]
    async fn test_spool_rejects_oversized_upload() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceImage::spool(dir.path().to_path_buf(), png_bytes(10, 10), None, 8)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_spool_rejects_non_image_type() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceImage::spool(
            dir.path().to_path_buf(),
            png_bytes(10, 10),
            Some("application/pdf".to_string()),
            1024 * 1024,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedType { .. }));
    }

    #[tokio::test]
    async fn test_spool_rejects_corrupt_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceImage::spool(
            dir.path().to_path_buf(),
            vec![0xde, 0xad, 0xbe, 0xef],
            Some("image/png".to_string()),
            1024 * 1024,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_identical_bytes_hash_identically() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = png_bytes(20, 20);
        let a = SourceImage::spool(dir.path().to_path_buf(), bytes.clone(), None, 1024 * 1024)
            .await
            .unwrap();
        let b = SourceImage::spool(dir.path().to_path_buf(), bytes, None, 1024 * 1024)
            .await
            .unwrap();
        assert_eq!(a.hash(), b.hash());
    }
}
