//! Input and output document types owned by the workflow controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A PDF buffer plus the metadata the service boundary needs.
///
/// Bytes live behind an `Arc` so the controller can hand the same upload to a
/// request task (and later re-dispatch it) without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfUpload {
    pub file_name: String,
    pub bytes: Arc<[u8]>,
}

impl PdfUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for PdfUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// The document the user is currently working on.
///
/// Replaced wholesale on every edit or upload; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputDocument {
    /// No input yet (PDF modes before a file is chosen).
    #[default]
    None,
    /// Markdown text. `source` is set when the text came from a file.
    Text {
        text: String,
        source: Option<SourceFile>,
    },
    /// An uploaded PDF.
    Pdf(PdfUpload),
}

impl InputDocument {
    pub fn text(text: impl Into<String>) -> Self {
        InputDocument::Text {
            text: text.into(),
            source: None,
        }
    }

    /// The markdown text, when this is a text document.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            InputDocument::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Name and size of the file this document was loaded from, if any.
    pub fn source(&self) -> Option<SourceFile> {
        match self {
            InputDocument::None => None,
            InputDocument::Text { source, .. } => source.clone(),
            InputDocument::Pdf(upload) => Some(SourceFile {
                name: upload.file_name.clone(),
                size: upload.size(),
            }),
        }
    }
}

/// Name and byte size of a selected file, as shown next to the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
}

impl SourceFile {
    /// Human-readable size: `512 B`, `1.50 KB`, `2.00 MB`.
    pub fn display_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// Format a byte count the way the file picker label does.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// A file handed to [`crate::WorkflowController::select_file`] whose bytes
/// are already in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Size as reported by the picker; validated before `bytes` is looked at.
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// The single authoritative conversion output the view renders from.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum ConversionResult {
    #[default]
    Empty,
    Html(String),
    Docx { bytes: Arc<[u8]>, file_name: String },
    Failed(String),
}

impl ConversionResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            ConversionResult::Empty => ResultKind::Empty,
            ConversionResult::Html(_) => ResultKind::Html,
            ConversionResult::Docx { .. } => ResultKind::Docx,
            ConversionResult::Failed(_) => ResultKind::Failed,
        }
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            ConversionResult::Html(html) => Some(html),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ConversionResult::Empty)
    }
}

impl fmt::Debug for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionResult::Empty => f.write_str("Empty"),
            ConversionResult::Html(html) => f.debug_tuple("Html").field(html).finish(),
            ConversionResult::Docx { bytes, file_name } => f
                .debug_struct("Docx")
                .field("file_name", file_name)
                .field("bytes", &format_args!("<{} bytes>", bytes.len()))
                .finish(),
            ConversionResult::Failed(msg) => f.debug_tuple("Failed").field(msg).finish(),
        }
    }
}

/// Discriminant of [`ConversionResult`], for snapshots and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Empty,
    Html,
    Docx,
    Failed,
}

/// A DOCX ready to be saved by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct DocxDownload {
    pub file_name: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for DocxDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocxDownload")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}
