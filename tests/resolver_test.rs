use std::path::PathBuf;

use mimedrop::{fix_file_ext, fix_stream_ext, resolve_extension, SniffingDetector};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mimedrop_{}_{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_resolve_boundaries() {
    assert_eq!(resolve_extension("archive", "application/zip"), "archive.zip");
    assert_eq!(resolve_extension("archive.zip", "application/zip"), "archive.zip");
    assert_eq!(resolve_extension("notes.txt", "image/png"), "notes.txt.png");
}

#[test]
fn test_resolve_ignores_extension_shaped_mime() {
    // Only MIME types resolve; an extension or bare token never gets appended
    assert_eq!(resolve_extension("archive", "zip"), "archive");
    assert_eq!(resolve_extension("x", ".zip"), "x");
    assert_eq!(resolve_extension("x", "png"), "x");
}

#[test]
fn test_resolve_is_idempotent() {
    for (name, mime) in [
        ("archive", "application/zip"),
        ("notes.txt", "image/png"),
        ("song", "audio/x-wav"),
        ("x", "unknown/type"),
    ] {
        let once = resolve_extension(name, mime);
        assert_eq!(resolve_extension(&once, mime), once);
    }
}

#[test]
fn test_fix_stream_ext_sniffs_buffer() {
    let detector = SniffingDetector::new();
    assert_eq!(fix_stream_ext("pixel", PNG_BYTES, &detector), "pixel.png");
    assert_eq!(fix_stream_ext("readme.txt", b"just text\n", &detector), "readme.txt");
    assert_eq!(fix_stream_ext("blob", &[0u8, 1, 2, 255], &detector), "blob");
}

#[tokio::test]
async fn test_fix_file_ext_only_touches_file_name() {
    // 1. Write PNG bytes under a misleading name
    let dir = test_dir("fix_file_ext");
    let path = dir.join("upload.data");
    tokio::fs::write(&path, PNG_BYTES).await.expect("Failed to write");

    // 2. Correct the name
    let detector = SniffingDetector::new();
    let fixed = fix_file_ext(&path, &detector).await;
    assert_eq!(fixed, dir.join("upload.data.png"));

    // 3. Already correct names are returned as given
    assert_eq!(fix_file_ext(&fixed, &detector).await, fixed);

    tokio::fs::remove_dir_all(&dir).await.ok();
}

#[tokio::test]
async fn test_fix_file_ext_missing_file_is_silent() {
    let path = std::env::temp_dir().join("mimedrop_definitely_missing_file");
    let fixed = fix_file_ext(&path, &SniffingDetector::new()).await;
    assert_eq!(fixed, path);
}
