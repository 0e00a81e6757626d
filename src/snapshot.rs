//! Serialisable view of the workflow state.
//!
//! A [`WorkflowSnapshot`] is everything a view needs to render one frame.
//! It is also what the CLI prints with `--json`.

use crate::document::{ConversionResult, InputDocument, ResultKind, SourceFile};
use crate::error::LastError;
use crate::mode::Mode;
use serde::{Deserialize, Serialize};

/// Observable state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub mode: Mode,
    pub input: InputSummary,
    pub result: ResultKind,
    /// Present when `result` is `html`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Present when `result` is `docx`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docx: Option<DocxSummary>,
    /// Present when `result` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub pending: bool,
    pub last_error: Option<LastError>,
    /// Changes every time the file picker must be reset.
    pub file_input_key: u64,
}

/// What is loaded as input, without the payload for PDFs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSummary {
    None,
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<SourceFile>,
    },
    Pdf {
        source: SourceFile,
    },
}

impl From<&InputDocument> for InputSummary {
    fn from(doc: &InputDocument) -> Self {
        match doc {
            InputDocument::None => InputSummary::None,
            InputDocument::Text { text, source } => InputSummary::Text {
                text: text.clone(),
                source: source.clone(),
            },
            InputDocument::Pdf(upload) => InputSummary::Pdf {
                source: SourceFile {
                    name: upload.file_name.clone(),
                    size: upload.size(),
                },
            },
        }
    }
}

/// Name and size of a converted DOCX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocxSummary {
    pub file_name: String,
    pub size: u64,
}

pub(crate) fn result_fields(
    result: &ConversionResult,
) -> (Option<String>, Option<DocxSummary>, Option<String>) {
    match result {
        ConversionResult::Empty => (None, None, None),
        ConversionResult::Html(html) => (Some(html.clone()), None, None),
        ConversionResult::Docx { bytes, file_name } => (
            None,
            Some(DocxSummary {
                file_name: file_name.clone(),
                size: bytes.len() as u64,
            }),
            None,
        ),
        ConversionResult::Failed(msg) => (None, None, Some(msg.clone())),
    }
}
