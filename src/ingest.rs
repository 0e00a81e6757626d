//! File ingestion: validate a selected file and read it off the UI path.
//!
//! Checks run cheapest-first so a bad selection never costs a read:
//!
//! 1. file name against the mode's extension rule
//! 2. size (from metadata) against the PDF limit
//! 3. the bytes themselves: non-empty, and `%PDF` magic for PDF modes
//!
//! The controller dispatches [`read_file`] through its request gate, so a
//! read that is overtaken by a mode switch or a newer selection is dropped
//! exactly like a stale conversion.

use crate::document::SelectedFile;
use crate::error::WorkflowError;
use crate::mode::Mode;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Reject names whose extension the mode does not accept.
pub fn check_file_name(mode: Mode, name: &str) -> Result<(), WorkflowError> {
    if mode.accepts_file_name(name) {
        Ok(())
    } else {
        Err(WorkflowError::UnsupportedExtension {
            name: name.to_string(),
            mode,
        })
    }
}

/// Reject PDFs over `limit` bytes before anything is read.
pub fn check_size(mode: Mode, name: &str, size: u64, limit: u64) -> Result<(), WorkflowError> {
    if mode.takes_pdf() && size > limit {
        return Err(WorkflowError::FileTooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Full validation of an in-memory selection for `mode`.
pub fn validate(mode: Mode, file: &SelectedFile, limit: u64) -> Result<(), WorkflowError> {
    check_file_name(mode, &file.name)?;
    check_size(mode, &file.name, file.size, limit)?;
    if !mode.takes_pdf() {
        return Ok(());
    }
    if file.bytes.is_empty() {
        return Err(WorkflowError::EmptyFile {
            name: file.name.clone(),
        });
    }
    if file.bytes.len() < PDF_MAGIC.len() || &file.bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        let n = file.bytes.len().min(4);
        magic[..n].copy_from_slice(&file.bytes[..n]);
        return Err(WorkflowError::NotAPdf {
            name: file.name.clone(),
            magic,
        });
    }
    Ok(())
}

/// Decode markdown file contents; invalid UTF-8 becomes U+FFFD.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Display name for a path: its final component.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read `path` for `mode`, checking name and size before touching contents.
pub async fn read_file(path: PathBuf, mode: Mode, limit: u64) -> Result<SelectedFile, WorkflowError> {
    let name = file_name_of(&path);
    check_file_name(mode, &name)?;

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|source| read_failed(&path, source))?;
    if !metadata.is_file() {
        return Err(read_failed(
            &path,
            std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    check_size(mode, &name, metadata.len(), limit)?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| read_failed(&path, source))?;
    debug!("Read {} ({} bytes)", path.display(), bytes.len());

    Ok(SelectedFile {
        name,
        size: bytes.len() as u64,
        bytes,
    })
}

fn read_failed(path: &Path, source: std::io::Error) -> WorkflowError {
    WorkflowError::ReadFailed {
        path: path.to_path_buf(),
        source,
    }
}
