use crate::error::Error;
use crate::extraction::*;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a valid ZIP archive containing multiple files
fn create_zip_archive_multi(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[test]
fn test_zip_extract_preserves_relative_paths() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("Viewer.zip");
    let dest = temp_dir.path().join("out");

    create_zip_archive_multi(
        &archive,
        &[
            ("Viewer.exe", b"binary"),
            ("resources/app/main.js", b"console.log(1)"),
            ("resources/app/assets/icon.ico", b"ico"),
        ],
    );

    let files = ZipExtractor::try_extract(&archive, &dest).unwrap();

    assert_eq!(files.len(), 3);
    assert_eq!(std::fs::read(dest.join("Viewer.exe")).unwrap(), b"binary");
    assert_eq!(
        std::fs::read(dest.join("resources/app/main.js")).unwrap(),
        b"console.log(1)"
    );
    assert!(dest.join("resources/app/assets/icon.ico").is_file());
}

#[test]
fn test_zip_extract_creates_explicit_directories() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("dirs.zip");
    let dest = temp_dir.path().join("out");

    let file = std::fs::File::create(&archive).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options = ::zip::write::FileOptions::default();
    writer.add_directory("cache/", options).unwrap();
    writer.add_directory("logs/old/", options).unwrap();
    writer.finish().unwrap();

    let files = ZipExtractor::try_extract(&archive, &dest).unwrap();

    // Directories are created but not reported as extracted files
    assert!(files.is_empty());
    assert!(dest.join("cache").is_dir());
    assert!(dest.join("logs/old").is_dir());
}

#[test]
fn test_zip_extract_overwrites_existing_files() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("a.zip");
    let dest = temp_dir.path().join("out");
    std::fs::create_dir_all(&dest).unwrap();
    std::fs::write(dest.join("config.json"), b"old old old old").unwrap();

    create_zip_archive_multi(&archive, &[("config.json", b"{}")]);

    ZipExtractor::try_extract(&archive, &dest).unwrap();
    assert_eq!(std::fs::read(dest.join("config.json")).unwrap(), b"{}");
}

#[test]
fn test_zip_extract_skips_entries_escaping_destination() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("evil.zip");
    let dest = temp_dir.path().join("out");

    create_zip_archive_multi(
        &archive,
        &[("../escaped.txt", b"nope"), ("safe.txt", b"ok")],
    );

    let files = ZipExtractor::try_extract(&archive, &dest).unwrap();

    assert_eq!(files, vec![dest.join("safe.txt")]);
    assert!(!temp_dir.path().join("escaped.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_zip_extract_applies_unix_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("perm.zip");
    let dest = temp_dir.path().join("out");

    let file = std::fs::File::create(&archive).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options = ::zip::write::FileOptions::default().unix_permissions(0o755);
    writer.start_file("run.sh", options).unwrap();
    std::io::Write::write_all(&mut writer, b"#!/bin/sh\n").unwrap();
    writer.finish().unwrap();

    ZipExtractor::try_extract(&archive, &dest).unwrap();

    let mode = std::fs::metadata(dest.join("run.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[cfg(unix)]
#[test]
fn test_zip_extract_read_only_entry_stays_overwritable() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("ro.zip");
    let dest = temp_dir.path().join("out");

    let file = std::fs::File::create(&archive).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options = ::zip::write::FileOptions::default().unix_permissions(0o444);
    writer.start_file("LICENSE", options).unwrap();
    std::io::Write::write_all(&mut writer, b"MIT").unwrap();
    writer.finish().unwrap();

    ZipExtractor::try_extract(&archive, &dest).unwrap();
    let mode = std::fs::metadata(dest.join("LICENSE"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o7777, 0o644);

    // Second extraction over the same tree
    ZipExtractor::try_extract(&archive, &dest).unwrap();
    assert_eq!(std::fs::read(dest.join("LICENSE")).unwrap(), b"MIT");
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn test_zip_extract_rejects_non_zip_file() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("Viewer.zip");
    std::fs::write(&archive, b"<html>quota exceeded</html>").unwrap();

    let result = ZipExtractor::try_extract(&archive, temp_dir.path());

    match result {
        Err(Error::ArchiveFormat { archive: path, .. }) => assert_eq!(path, archive),
        other => panic!("expected ArchiveFormat error, got {other:?}"),
    }
}

#[test]
fn test_zip_extract_detects_corrupt_entry_data() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("corrupt.zip");
    let dest = temp_dir.path().join("out");
    create_zip_archive_multi(&archive, &[("payload.bin", b"PAYLOAD_CONTENT_0123456789")]);

    // Flip one byte of the stored payload so the CRC no longer matches
    let mut bytes = std::fs::read(&archive).unwrap();
    let needle = b"PAYLOAD_CONTENT";
    let pos = bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap();
    bytes[pos] = b'X';
    std::fs::write(&archive, &bytes).unwrap();

    let result = ZipExtractor::try_extract(&archive, &dest);
    assert!(
        matches!(result, Err(Error::ArchiveFormat { .. })),
        "got {result:?}"
    );
}

#[test]
fn test_zip_extract_missing_archive_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ZipExtractor::try_extract(&temp_dir.path().join("absent.zip"), temp_dir.path());
    assert!(matches!(result, Err(Error::Io(_))));
}

#[tokio::test]
async fn test_zip_extract_async_runs_on_blocking_pool() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("a.zip");
    let dest = temp_dir.path().join("out");
    create_zip_archive_multi(&archive, &[("a.txt", b"a"), ("b/c.txt", b"c")]);

    let files = ZipExtractor::extract(&archive, &dest).await.unwrap();
    assert_eq!(files.len(), 2);
    assert!(dest.join("b/c.txt").exists());
}

#[tokio::test]
async fn test_zip_extract_releases_archive_handle() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("a.zip");
    create_zip_archive_multi(&archive, &[("a.txt", b"a")]);

    ZipExtractor::extract(&archive, temp_dir.path()).await.unwrap();

    // Deleting right away must work (would fail on Windows with an open handle)
    std::fs::remove_file(&archive).unwrap();
    assert!(!archive.exists());
}
