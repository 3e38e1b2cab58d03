//! Logo upload ingestion.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

/// Errors raised while storing an uploaded logo.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("The uploaded file is empty")]
    Empty,

    #[error("Logo is too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Unsupported image format (use PNG, JPEG, GIF or WebP)")]
    UnsupportedFormat,

    #[error("Failed to save logo: {0}")]
    Io(#[from] std::io::Error),
}

/// Image formats accepted as logos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Identifies the format from the file's magic bytes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// Stores uploaded logos under `<uploads_dir>` and hands out public URLs.
#[derive(Debug, Clone)]
pub struct LogoStore {
    uploads_dir: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl LogoStore {
    #[must_use]
    pub fn new(uploads_dir: impl Into<PathBuf>, base_url: &str, max_bytes: usize) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_bytes,
        }
    }

    /// Validates and writes a logo, returning the URL it is served under.
    ///
    /// The file name is derived from the content, so re-uploading the same
    /// image overwrites the earlier copy.
    pub async fn ingest(&self, user: i64, bytes: &[u8]) -> Result<String, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(AssetError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        let format = ImageFormat::sniff(bytes).ok_or(AssetError::UnsupportedFormat)?;

        let digest = hex::encode(Sha256::digest(bytes));
        let file_name = format!("{user}_{}.{}", &digest[..12], format.extension());

        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::write(self.uploads_dir.join(&file_name), bytes).await?;
        info!("Stored logo for user {} as {}", user, file_name);

        Ok(format!("{}/uploads/{file_name}", self.base_url))
    }
}
