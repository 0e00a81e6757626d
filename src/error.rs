//! Error types for the docflow library.
//!
//! Every failure the workflow can hit is a [`WorkflowError`]. Variants are
//! grouped by [`ErrorClass`] because the controller treats each class the same
//! way no matter which variant fired:
//!
//! * **Validation**: detected locally, before any backend call.
//! * **Conversion**: the backend rejected the document; the message is shown
//!   to the user verbatim.
//! * **Transport**: the backend could not be reached or answered garbage.
//! * **Read**: the local file could not be read.
//!
//! All of them are terminal for the request that triggered them. None is
//! retried automatically.

use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docflow library.
#[derive(Debug, Error)]
pub enum WorkflowError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The selected file's extension does not match the active mode.
    #[error("{}", .mode.extension_hint())]
    UnsupportedExtension { name: String, mode: Mode },

    /// PDF upload exceeds the configured size limit.
    #[error("File size exceeds {}MB limit", .limit / (1024 * 1024))]
    FileTooLarge { name: String, size: u64, limit: u64 },

    /// A zero-byte file was selected.
    #[error("File '{name}' is empty")]
    EmptyFile { name: String },

    /// The file has a `.pdf` name but does not start with `%PDF`.
    #[error("File must be a PDF")]
    NotAPdf { name: String, magic: [u8; 4] },

    /// Operation is only valid in another mode (e.g. text edits in PDF mode).
    #[error("'{operation}' is not available in {mode} mode")]
    WrongMode { operation: &'static str, mode: Mode },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The backend processed the request and refused it.
    #[error("{message}")]
    Conversion { message: String },

    /// The backend could not be reached.
    #[error("{reason}. Make sure the backend API is running at {url}")]
    BackendUnavailable { url: String, reason: String },

    /// The backend answered with something we cannot interpret.
    #[error("Unexpected response from {url}: {detail}")]
    UnexpectedResponse { url: String, detail: String },

    /// No response within the configured request timeout.
    #[error("Conversion timed out after {secs}s. The backend may be unavailable")]
    Timeout { secs: u64 },

    // ── Read errors ───────────────────────────────────────────────────────
    /// Local file read failed.
    #[error("Failed to read file")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Download errors ───────────────────────────────────────────────────
    /// `download` called while the current result is not a DOCX document.
    #[error("No DOCX document is available to download")]
    NoDocxAvailable,

    /// Could not write the downloaded DOCX.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse error taxonomy used for notifications and [`LastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    Conversion,
    Transport,
    Read,
    Download,
    Config,
}

impl WorkflowError {
    /// Which class of failure this is.
    pub fn class(&self) -> ErrorClass {
        match self {
            WorkflowError::UnsupportedExtension { .. }
            | WorkflowError::FileTooLarge { .. }
            | WorkflowError::EmptyFile { .. }
            | WorkflowError::NotAPdf { .. }
            | WorkflowError::WrongMode { .. } => ErrorClass::Validation,
            WorkflowError::Conversion { .. } => ErrorClass::Conversion,
            WorkflowError::BackendUnavailable { .. }
            | WorkflowError::UnexpectedResponse { .. }
            | WorkflowError::Timeout { .. } => ErrorClass::Transport,
            WorkflowError::ReadFailed { .. } => ErrorClass::Read,
            WorkflowError::NoDocxAvailable | WorkflowError::OutputWriteFailed { .. } => {
                ErrorClass::Download
            }
            WorkflowError::InvalidConfig(_) => ErrorClass::Config,
        }
    }
}

/// The controller's record of the most recent failure.
///
/// `WorkflowError` holds `io::Error`s and is not `Clone`; the controller keeps
/// this flattened copy instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub class: ErrorClass,
    pub message: String,
}

impl From<&WorkflowError> for LastError {
    fn from(err: &WorkflowError) -> Self {
        Self {
            class: err.class(),
            message: err.to_string(),
        }
    }
}
