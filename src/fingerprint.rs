#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use itertools::Itertools;

use crate::{constants::FINGERPRINT_PREFIX, error::IntegrityError};

/// Splits text into lines the way existing fingerprints are computed:
/// `\r\n`, `\n` and a lone `\r` each end a line, and a trailing terminator
/// yields a final empty line.
fn lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split("\r\n")
        .flat_map(|chunk| chunk.split(['\n', '\r']))
}

/// Computes the fingerprint of a test file.
///
/// Lines starting with `// md5: ` are removed before hashing, wherever they
/// appear, so a file can carry its own fingerprint.
pub fn fingerprint(content: &str) -> String {
    let filtered = lines(content)
        .filter(|line| !line.starts_with(FINGERPRINT_PREFIX))
        .join("\n");

    format!("{:x}", md5::compute(filtered.as_bytes()))
}

/// Returns the fingerprint stored in the file, if any.
///
/// Only the first fingerprint line counts; its first whitespace-delimited
/// token is the stored hash.
pub fn stored_fingerprint(content: &str) -> Option<String> {
    lines(content)
        .find_map(|line| line.strip_prefix(FINGERPRINT_PREFIX))
        .map(|rest| rest.split_whitespace().next().unwrap_or_default().to_string())
}

/// Checks that a test file still matches its embedded fingerprint.
///
/// * `path`: used for error messages only
/// * `content`: the file's contents
pub fn verify(path: &Path, content: &str) -> Result<(), IntegrityError> {
    let stored = stored_fingerprint(content).ok_or_else(|| IntegrityError::MissingFingerprint {
        path: path.to_path_buf(),
    })?;
    let computed = fingerprint(content);

    if stored != computed {
        return Err(IntegrityError::FingerprintMismatch {
            path: path.to_path_buf(),
            stored,
            computed,
        });
    }
    Ok(())
}

/// Renders the line a content author pastes into a test file.
pub fn generate(path: &Path, content: &str) -> String {
    format!("{} -> {FINGERPRINT_PREFIX}{}", path.display(), fingerprint(content))
}

/// Finds test suite sources under `root` matching any of `patterns`.
///
/// Results are sorted and de-duplicated so overlapping patterns are fine.
pub fn find_test_sources(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for pattern in patterns {
        let full = root.join(pattern);
        let full = full
            .to_str()
            .context("Could not convert test root to string")?;
        found.extend(
            glob(full)
                .with_context(|| format!("Could not create glob for {full}"))?
                .filter_map(Result::ok)
                .filter(|p| p.is_file()),
        );
    }

    found.sort();
    found.dedup();
    Ok(found)
}

/// Shortens `path` for display, relative to `base` when possible.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}

/// Verifies every test suite under `root`, stopping at the first failure.
///
/// Returns the number of files checked.
pub fn verify_tree(
    base: &Path,
    root: &Path,
    patterns: &[String],
) -> Result<usize, crate::error::GradeError> {
    let files = find_test_sources(root, patterns)?;

    for file in &files {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Could not read test file {}", file.display()))?;
        verify(&relative_to(file, base), &content)?;
        tracing::debug!("Fingerprint ok: {}", file.display());
    }

    tracing::info!("Verified fingerprints of {} test file(s)", files.len());
    Ok(files.len())
}

/// Produces a `path -> // md5: <hash>` line for every test suite under
/// `root`.
pub fn generate_tree(base: &Path, root: &Path, patterns: &[String]) -> Result<Vec<String>> {
    find_test_sources(root, patterns)?
        .iter()
        .map(|file| {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Could not read test file {}", file.display()))?;
            Ok(generate(&relative_to(file, base), &content))
        })
        .collect()
}
