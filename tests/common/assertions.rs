//! Assertion helpers for staged directories and event streams

use fetch_stage::Event;
use std::path::Path;
use tokio::sync::broadcast;
use walkdir::WalkDir;

/// Every event still buffered in `rx`, in send order
pub fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Sorted relative paths of all files below `dir`, with `/` separators
pub fn file_tree(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(dir)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    files.sort();
    files
}

/// Assert that `dir` contains exactly the given files
pub fn assert_tree(dir: &Path, expected: &[&str]) {
    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(file_tree(dir), expected, "unexpected files in {}", dir.display());
}

/// Assert that no archive or partial download is left in `dir`
pub fn assert_no_archive(dir: &Path, archive_filename: &str) {
    assert!(
        !dir.join(archive_filename).exists(),
        "archive {} left behind",
        archive_filename
    );
    assert!(
        !dir.join(format!("{}.part", archive_filename)).exists(),
        "partial download left behind"
    );
}
