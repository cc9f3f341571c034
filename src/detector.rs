//! Content-type detection by sniffing leading bytes.
//!
//! Detection looks at content only. The file name is consulted solely when
//! [`DetectorConfig::name_fallback`] is on and the bytes gave nothing better
//! than `application/octet-stream`.

use std::path::Path;

use async_trait::async_trait;
use mime_guess::MimeGuess;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::cancellable::{self, Cancellable};
use crate::config::DetectorConfig;
use crate::error::{MimedropError, MimedropResult};

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain";
pub const EMPTY: &str = "application/x-empty";
pub const DIRECTORY: &str = "inode/directory";

/// Anything that can name the MIME type of a buffer or a file on disk.
#[async_trait]
pub trait ContentDetector: Send + Sync {
    /// Sniffs an in-memory buffer without touching disk.
    fn detect_bytes(&self, bytes: &[u8]) -> String;

    /// Sniffs a file. Only a bounded prefix is read.
    async fn detect_path(
        &self,
        path: &Path,
        cancellable: Option<&Cancellable>,
    ) -> MimedropResult<String>;
}

/// Magic-number detector backed by `infer`.
#[derive(Debug, Clone, Default)]
pub struct SniffingDetector {
    config: DetectorConfig,
}

impl SniffingDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Extension-based guess for `path`, if the name has a known extension.
    pub fn guess_from_name(path: &Path) -> Option<String> {
        MimeGuess::from_path(path).first().map(|m| m.essence_str().to_string())
    }
}

#[async_trait]
impl ContentDetector for SniffingDetector {
    fn detect_bytes(&self, bytes: &[u8]) -> String {
        classify(bytes).to_string()
    }

    async fn detect_path(
        &self,
        path: &Path,
        cancellable: Option<&Cancellable>,
    ) -> MimedropResult<String> {
        cancellable::check(cancellable)?;

        let metadata = fs::metadata(path)
            .await
            .map_err(|e| MimedropError::unreadable(e, path.display()))?;
        if metadata.is_dir() {
            return Ok(DIRECTORY.to_string());
        }

        let file = fs::File::open(path)
            .await
            .map_err(|e| MimedropError::unreadable(e, path.display()))?;
        let mut sample = Vec::with_capacity(self.config.sniff_len.min(metadata.len() as usize));
        file.take(self.config.sniff_len as u64)
            .read_to_end(&mut sample)
            .await
            .map_err(|e| MimedropError::unreadable(e, path.display()))?;

        let mime = classify(&sample);
        if mime == OCTET_STREAM && self.config.name_fallback {
            if let Some(guess) = Self::guess_from_name(path) {
                debug!(path = %path.display(), %guess, "content unrecognised, using name");
                return Ok(guess);
            }
        }
        Ok(mime.to_string())
    }
}

fn classify(sample: &[u8]) -> &'static str {
    if sample.is_empty() {
        return EMPTY;
    }
    if let Some(kind) = infer::get(sample) {
        return kind.mime_type();
    }
    if looks_like_text(sample) {
        TEXT_PLAIN
    } else {
        OCTET_STREAM
    }
}

// A truncated sample may end in the middle of a multi-byte sequence.
fn looks_like_text(sample: &[u8]) -> bool {
    if sample.contains(&0) {
        return false;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn sniffs_magic_numbers() {
        let detector = SniffingDetector::new();
        assert_eq!(detector.detect_bytes(PNG_HEADER), "image/png");
        assert_eq!(detector.detect_bytes(b"PK\x03\x04\x14\0\0\0"), "application/zip");
        assert_eq!(detector.detect_bytes(b"%PDF-1.7\n"), "application/pdf");
    }

    #[test]
    fn falls_back_to_text_or_binary() {
        let detector = SniffingDetector::new();
        assert_eq!(detector.detect_bytes(b"plain words\n"), TEXT_PLAIN);
        assert_eq!(detector.detect_bytes(&[0x01, 0x00, 0xfe, 0x7f]), OCTET_STREAM);
        assert_eq!(detector.detect_bytes(b""), EMPTY);
    }

    #[test]
    fn split_utf8_tail_is_still_text() {
        // "é" is 0xC3 0xA9; cut after the first byte.
        assert!(looks_like_text(b"caf\xc3"));
        assert!(!looks_like_text(b"caf\xc3(x"));
    }

    #[test]
    fn name_guess_uses_extension() {
        assert_eq!(
            SniffingDetector::guess_from_name(Path::new("a/b/report.csv")).as_deref(),
            Some("text/csv")
        );
        assert_eq!(SniffingDetector::guess_from_name(Path::new("noext")), None);
    }
}
