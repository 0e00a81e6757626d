//! Conversion modes and the file-naming rules attached to each.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The active source → target pairing.
///
/// Determines which input the controller accepts and which output slot
/// a completed conversion fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Editable markdown text → HTML preview. (default)
    #[default]
    MarkdownToHtml,
    /// Uploaded PDF → HTML preview.
    PdfToHtml,
    /// Uploaded PDF → downloadable DOCX.
    PdfToDocx,
}

static RE_MARKDOWN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(md|markdown|txt)$").unwrap());

static RE_PDF_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::MarkdownToHtml, Mode::PdfToHtml, Mode::PdfToDocx];

    /// True for the two modes that take a PDF upload.
    pub fn takes_pdf(self) -> bool {
        !matches!(self, Mode::MarkdownToHtml)
    }

    /// Whether `file_name` carries an extension this mode accepts
    /// (`.md`/`.markdown`/`.txt` or `.pdf`, case-insensitive).
    pub fn accepts_file_name(self, file_name: &str) -> bool {
        if self.takes_pdf() {
            RE_PDF_NAME.is_match(file_name)
        } else {
            RE_MARKDOWN_NAME.is_match(file_name)
        }
    }

    /// The `accept=` list a file picker should use in this mode.
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        if self.takes_pdf() {
            &[".pdf"]
        } else {
            &[".md", ".markdown", ".txt"]
        }
    }

    /// User-facing message for a rejected extension.
    pub fn extension_hint(self) -> &'static str {
        if self.takes_pdf() {
            "Please upload a .pdf file"
        } else {
            "Please upload a .md, .markdown, or .txt file"
        }
    }

    /// Short stable identifier, also accepted by [`Mode::from_str`].
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::MarkdownToHtml => "markdown",
            Mode::PdfToHtml => "pdf",
            Mode::PdfToDocx => "pdf-to-docx",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" | "markdown-to-html" => Ok(Mode::MarkdownToHtml),
            "pdf" | "pdf-to-html" => Ok(Mode::PdfToHtml),
            "pdf-to-docx" | "docx" => Ok(Mode::PdfToDocx),
            other => Err(format!(
                "unknown mode '{other}' (expected markdown, pdf or pdf-to-docx)"
            )),
        }
    }
}

/// Suggested download name for a DOCX converted from `source_name`.
///
/// Replaces a trailing `.pdf` (any case) with `.docx`; names without one get
/// `.docx` appended.
pub fn docx_file_name(source_name: &str) -> String {
    if RE_PDF_NAME.is_match(source_name) {
        RE_PDF_NAME.replace(source_name, ".docx").into_owned()
    } else {
        format!("{source_name}.docx")
    }
}
