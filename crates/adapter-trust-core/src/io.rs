// crates/adapter-trust-core/src/io.rs
// ============================================================================
// Module: Bounded File I/O
// Description: Size-limited reads and atomic writes for trust artifacts.
// Purpose: Keep untrusted inputs bounded and durable outputs all-or-nothing.
// Dependencies: tempfile, thiserror
// ============================================================================

//! ## Overview
//! Manifests, key files, and trust documents are read through
//! [`read_bytes_with_limit`], which refuses oversized inputs before buffering
//! them. Reports, signature artifacts, and the trust store are written through
//! [`write_file_atomic`]: a temporary sibling is filled, synced, and renamed
//! over the destination so readers never observe a partial file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by [`read_bytes_with_limit`].
#[derive(Debug, Error)]
pub enum ReadLimitError {
    /// File I/O failure.
    #[error("{0}")]
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    #[error("file is {size} bytes (limit {limit})")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Reads
// ============================================================================

/// Reads a file, failing when it exceeds `max_bytes`.
///
/// # Errors
///
/// Returns [`ReadLimitError`] on I/O failure or when the file is too large.
pub fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    // The file may grow between stat and read.
    let read_limit = limit.saturating_add(1);
    let mut limited = file.take(read_limit);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Writes `bytes` to `path` via a synced temporary sibling and a rename.
///
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the temporary file cannot be created,
/// written, synced, or renamed into place.
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn bounded_read_rejects_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.json");
        fs::write(&path, vec![b'a'; 32]).unwrap();
        let err = read_bytes_with_limit(&path, 16).unwrap_err();
        assert!(matches!(
            err,
            ReadLimitError::TooLarge {
                size: 32,
                limit: 16
            }
        ));
        assert_eq!(read_bytes_with_limit(&path, 32).unwrap().len(), 32);
    }

    #[test]
    fn atomic_write_replaces_existing_content_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        write_file_atomic(&path, b"first").unwrap();
        write_file_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary files must not linger");
    }
}
