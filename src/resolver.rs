//! Filename extension correction.
//!
//! A name only ever gains an extension; an existing one is never stripped or
//! replaced. `report.txt` holding PNG bytes becomes `report.txt.png`, because a
//! trailing `.something` may be an intentional part of the name.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::detector::ContentDetector;
use crate::registry::MimeExtensionRegistry;

/// Case-sensitive suffix test. An empty suffix always matches.
pub fn has_suffix(s: &str, suffix: &str) -> bool {
    s.ends_with(suffix)
}

/// Case-sensitive prefix test. An empty prefix always matches.
pub fn has_prefix(s: &str, prefix: &str) -> bool {
    s.starts_with(prefix)
}

/// Appends the canonical extension of `detected_mime` unless `name` already
/// ends with it. Unknown MIME types leave `name` untouched.
pub fn fix_extension(name: &str, detected_mime: &str) -> String {
    fix_extension_with(MimeExtensionRegistry::global(), name, detected_mime)
}

pub fn fix_extension_with(
    registry: &MimeExtensionRegistry,
    name: &str,
    detected_mime: &str,
) -> String {
    match registry.extension_for(detected_mime) {
        Some(ext) if !has_suffix(name, ext) => format!("{}{}", name, ext),
        Some(_) => name.to_string(),
        None => {
            debug!(name, mime = detected_mime, "no extension correction");
            name.to_string()
        }
    }
}

/// Sniffs an in-memory buffer and corrects `name` to match it.
pub fn fix_stream_ext<D>(name: &str, bytes: &[u8], detector: &D) -> String
where
    D: ContentDetector + ?Sized,
{
    let mime = detector.detect_bytes(bytes);
    fix_extension(name, &mime)
}

/// Sniffs the file at `path` and corrects its final component. Directory
/// components are kept as given. Detection failures return `path` unchanged.
pub async fn fix_file_ext<D>(path: &Path, detector: &D) -> PathBuf
where
    D: ContentDetector + ?Sized,
{
    let mime = match detector.detect_path(path, None).await {
        Ok(mime) => mime,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "cannot sniff file, keeping name");
            return path.to_path_buf();
        }
    };

    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };
    let fixed = fix_extension(file_name, &mime);
    if fixed == file_name {
        path.to_path_buf()
    } else {
        path.with_file_name(fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_predicates() {
        assert!(has_suffix("archive.zip", ".zip"));
        assert!(has_suffix("anything", ""));
        assert!(!has_suffix("archive.ZIP", ".zip"));
        assert!(!has_suffix("zip", ".zip"));
        assert!(has_prefix("image/png", "image/"));
        assert!(has_prefix("", ""));
    }

    #[test]
    fn appends_missing_extension() {
        assert_eq!(fix_extension("archive", "application/zip"), "archive.zip");
        assert_eq!(fix_extension("archive.zip", "application/zip"), "archive.zip");
    }

    #[test]
    fn never_replaces_existing_extension() {
        assert_eq!(fix_extension("notes.txt", "image/png"), "notes.txt.png");
    }

    #[test]
    fn suffix_match_is_case_sensitive() {
        assert_eq!(fix_extension("PHOTO.PNG", "image/png"), "PHOTO.PNG.png");
    }

    #[test]
    fn unknown_mime_keeps_name() {
        assert_eq!(fix_extension("blob", "unknown/type"), "blob");
        assert_eq!(fix_extension("blob", "application/octet-stream"), "blob");
        assert_eq!(fix_extension("blob", ""), "blob");
    }

    #[test]
    fn extension_like_mime_is_not_reverse_resolved() {
        assert_eq!(fix_extension("archive", "zip"), "archive");
        assert_eq!(fix_extension("x", ".zip"), "x");
    }

    #[test]
    fn idempotent_for_every_registered_mime() {
        for (mime, _) in MimeExtensionRegistry::global().forward() {
            let once = fix_extension("file", mime);
            assert_eq!(fix_extension(&once, mime), once);
        }
    }
}
