//! Input resolution: read a local image or download one from a URL.
//!
//! The bytes are sniffed rather than trusted by extension. Anything that is
//! not a PNG, JPEG, GIF or WebP image is rejected before it reaches the
//! model.

use crate::error::VisionError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Formats accepted as input.
pub const SUPPORTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// An image held in memory, with its sniffed format.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// File name or URL the image came from, for messages and logs.
    pub source_name: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl LoadedImage {
    /// Validate `bytes` as a supported image.
    pub fn from_bytes(source_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, VisionError> {
        let source_name = source_name.into();
        let format = sniff(&source_name, &bytes)?;
        debug!(
            "Loaded {} ({}, {} bytes)",
            source_name,
            format.to_mime_type(),
            bytes.len()
        );
        Ok(Self {
            source_name,
            bytes,
            format,
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

fn sniff(source_name: &str, bytes: &[u8]) -> Result<ImageFormat, VisionError> {
    match image::guess_format(bytes) {
        Ok(format) if SUPPORTED_FORMATS.contains(&format) => Ok(format),
        _ => Err(VisionError::NotAnImage {
            source_name: source_name.to_string(),
            magic: bytes.iter().take(8).copied().collect(),
        }),
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load an image from a local path or an `http(s)` URL.
pub async fn load_image(input: &str, timeout_secs: u64) -> Result<LoadedImage, VisionError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<LoadedImage, VisionError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(VisionError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(VisionError::FileNotFound {
                path: PathBuf::from(path),
            });
        }
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    LoadedImage::from_bytes(name, bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<LoadedImage, VisionError> {
    info!("Downloading image from: {}", url);

    let failed = |reason: String| VisionError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            VisionError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    info!("Downloaded {} bytes", bytes.len());
    LoadedImage::from_bytes(file_name_from_url(url), bytes.to_vec())
}

/// Last path segment of `url`, or the URL itself when it has none.
fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/cat.png"));
        assert!(is_url("http://example.com/cat.png"));
        assert!(!is_url("/tmp/cat.png"));
        assert!(!is_url("cat.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn sniffs_png() {
        let img = LoadedImage::from_bytes("cat.png", PNG_MAGIC.to_vec()).unwrap();
        assert_eq!(img.format, ImageFormat::Png);
        assert_eq!(img.mime_type(), "image/png");
    }

    #[test]
    fn rejects_text() {
        let err = LoadedImage::from_bytes("notes.txt", b"hello world".to_vec()).unwrap_err();
        match err {
            VisionError::NotAnImage { source_name, magic } => {
                assert_eq!(source_name, "notes.txt");
                assert_eq!(magic, b"hello wo".to_vec());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn url_file_names() {
        assert_eq!(file_name_from_url("https://example.com/a/cat.jpg"), "cat.jpg");
        assert_eq!(file_name_from_url("https://example.com/"), "https://example.com/");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = load_image("/definitely/not/here.png", 5).await.unwrap_err();
        assert!(matches!(err, VisionError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, PNG_MAGIC).unwrap();
        let img = load_image(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(img.source_name, "tiny.png");
    }
}
