//! Archive extraction
//!
//! The staged payload is always a ZIP container. Extraction preserves the
//! archive's relative paths under the destination directory and refuses to
//! write outside of it.

mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use zip::ZipExtractor;
