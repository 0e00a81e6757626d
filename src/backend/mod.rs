//! The conversion service boundary.
//!
//! The byte-level transforms (markdown rendering, PDF text extraction, DOCX
//! assembly) live behind [`ConversionBackend`]. The workflow only relies on
//! its contract: one request in, one document or one [`WorkflowError`] out.
//!
//! - [`http`]: the production client for the existing HTTP service
//!
//! Tests and embedders can implement the trait directly.

pub mod http;

use crate::document::{ConversionResult, PdfUpload};
use crate::error::WorkflowError;
use async_trait::async_trait;
use std::sync::Arc;

pub use http::{HealthStatus, HttpBackend};

/// A DOCX produced by the backend, with the name it suggests for saving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Stateless request/response conversions.
///
/// Every method is independent; implementations must not assume calls arrive
/// in order or that earlier calls have finished.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Render markdown text as HTML.
    async fn markdown_to_html(&self, markdown: &str) -> Result<String, WorkflowError>;

    /// Extract a PDF's text as HTML paragraphs.
    async fn pdf_to_html(&self, upload: &PdfUpload) -> Result<String, WorkflowError>;

    /// Rebuild a PDF's text as a DOCX document.
    async fn pdf_to_docx(&self, upload: &PdfUpload) -> Result<DocxDocument, WorkflowError>;
}

/// Convenience alias for the type the controller stores.
pub type SharedBackend = Arc<dyn ConversionBackend>;

/// One conversion request, captured at dispatch time.
///
/// Owning its input means a debounced job always converts the content it
/// was created with, however much the controller's state moved on since.
#[derive(Debug, Clone)]
pub enum ConversionJob {
    Markdown(String),
    PdfToHtml(PdfUpload),
    PdfToDocx(PdfUpload),
}

impl ConversionJob {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            ConversionJob::Markdown(_) => "markdown→html",
            ConversionJob::PdfToHtml(_) => "pdf→html",
            ConversionJob::PdfToDocx(_) => "pdf→docx",
        }
    }

    /// Run the job against `backend` and wrap the output as a result.
    pub async fn run(self, backend: SharedBackend) -> Result<ConversionResult, WorkflowError> {
        match self {
            ConversionJob::Markdown(text) => backend
                .markdown_to_html(&text)
                .await
                .map(ConversionResult::Html),
            ConversionJob::PdfToHtml(upload) => backend
                .pdf_to_html(&upload)
                .await
                .map(ConversionResult::Html),
            ConversionJob::PdfToDocx(upload) => {
                let doc = backend.pdf_to_docx(&upload).await?;
                Ok(ConversionResult::Docx {
                    bytes: doc.bytes.into(),
                    file_name: doc.file_name,
                })
            }
        }
    }
}
