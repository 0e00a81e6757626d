//! HTTP client for the conversion service.
//!
//! Speaks the service's existing wire format:
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | markdown → HTML | `POST /api/markdown/convert`, JSON `{"markdown"}` | JSON `{"html"}` |
//! | PDF → HTML | `POST /api/pdf/convert`, multipart `file` | JSON `{"html"}` |
//! | PDF → DOCX | `POST /api/pdf/convert-to-docx`, multipart `file` | DOCX bytes + `Content-Disposition` |
//! | health | `GET /health` | JSON `{"status","timestamp","uptime"}` |
//!
//! Failed requests carry `{"statusCode","timestamp","path","message","error"}`;
//! `message` (a string or a list of strings) is passed to the user verbatim.

use super::{ConversionBackend, DocxDocument};
use crate::config::WorkflowConfig;
use crate::document::PdfUpload;
use crate::error::WorkflowError;
use crate::mode::docx_file_name;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const MARKDOWN_PATH: &str = "/api/markdown/convert";
const PDF_HTML_PATH: &str = "/api/pdf/convert";
const PDF_DOCX_PATH: &str = "/api/pdf/convert-to-docx";
const HEALTH_PATH: &str = "/health";

/// MIME type of the DOCX payload.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Serialize)]
struct MarkdownRequest<'a> {
    markdown: &'a str,
}

#[derive(Deserialize)]
struct HtmlResponse {
    html: String,
}

/// Error body produced by the service's exception filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        match self.message.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        }
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Seconds since the service started.
    #[serde(default)]
    pub uptime: Option<f64>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// [`ConversionBackend`] over HTTP, built on `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: WorkflowConfig,
}

impl HttpBackend {
    /// Build a client for `config.backend_base_url`.
    ///
    /// No request timeout is set on the client itself; the request gate
    /// enforces `config.request_timeout_secs` around the whole call.
    pub fn new(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("docflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WorkflowError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.backend_base_url
    }

    /// Ask the service whether it is up.
    pub async fn health(&self) -> Result<HealthStatus, WorkflowError> {
        let url = self.config.endpoint(HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;
        if !response.status().is_success() {
            return Err(WorkflowError::UnexpectedResponse {
                url,
                detail: format!("HTTP {}", response.status()),
            });
        }
        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| WorkflowError::UnexpectedResponse {
                url,
                detail: e.to_string(),
            })
    }

    fn unavailable(&self, err: reqwest::Error) -> WorkflowError {
        warn!("Backend request failed: {}", err);
        WorkflowError::BackendUnavailable {
            url: self.config.backend_base_url.clone(),
            reason: if err.is_connect() {
                "Backend unreachable".to_string()
            } else {
                format!("Request failed: {err}")
            },
        }
    }

    fn pdf_form(&self, upload: &PdfUpload, url: &str) -> Result<Form, WorkflowError> {
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str("application/pdf")
            .map_err(|e| WorkflowError::UnexpectedResponse {
                url: url.to_string(),
                detail: format!("building multipart body: {e}"),
            })?;
        Ok(Form::new().part("file", part))
    }

    async fn post_for_html(
        &self,
        request: reqwest::RequestBuilder,
        url: String,
        fallback: &str,
    ) -> Result<String, WorkflowError> {
        let response = request.send().await.map_err(|e| self.unavailable(e))?;
        let response = check_status(response, fallback).await?;
        let body = response
            .json::<HtmlResponse>()
            .await
            .map_err(|e| WorkflowError::UnexpectedResponse {
                url,
                detail: e.to_string(),
            })?;
        Ok(body.html)
    }
}

#[async_trait]
impl ConversionBackend for HttpBackend {
    async fn markdown_to_html(&self, markdown: &str) -> Result<String, WorkflowError> {
        let url = self.config.endpoint(MARKDOWN_PATH);
        debug!("POST {} ({} bytes of markdown)", url, markdown.len());
        let request = self.client.post(&url).json(&MarkdownRequest { markdown });
        self.post_for_html(request, url, "Failed to convert markdown")
            .await
    }

    async fn pdf_to_html(&self, upload: &PdfUpload) -> Result<String, WorkflowError> {
        let url = self.config.endpoint(PDF_HTML_PATH);
        info!(
            "Uploading {} ({} bytes) for HTML conversion",
            upload.file_name,
            upload.size()
        );
        let form = self.pdf_form(upload, &url)?;
        let request = self.client.post(&url).multipart(form);
        self.post_for_html(request, url, "Failed to convert PDF").await
    }

    async fn pdf_to_docx(&self, upload: &PdfUpload) -> Result<DocxDocument, WorkflowError> {
        let url = self.config.endpoint(PDF_DOCX_PATH);
        info!(
            "Uploading {} ({} bytes) for DOCX conversion",
            upload.file_name,
            upload.size()
        );
        let form = self.pdf_form(upload, &url)?;
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;
        let response = check_status(response, "Failed to convert PDF to DOCX").await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name)
            .unwrap_or_else(|| docx_file_name(&upload.file_name));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkflowError::UnexpectedResponse {
                url,
                detail: e.to_string(),
            })?;
        debug!("Received {} ({} bytes)", file_name, bytes.len());

        Ok(DocxDocument {
            bytes: bytes.to_vec(),
            file_name,
        })
    }
}

/// Turn a non-2xx response into a [`WorkflowError::Conversion`].
///
/// Uses the service's error `message` when the body carries one, else
/// `fallback`.
async fn check_status(
    response: reqwest::Response,
    fallback: &str,
) -> Result<reqwest::Response, WorkflowError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorBody>(&body).ok();
    let message = parsed
        .as_ref()
        .and_then(ErrorBody::message)
        .unwrap_or_else(|| fallback.to_string());
    warn!(
        "Backend returned HTTP {} ({:?}): {}",
        status.as_u16(),
        parsed.and_then(|b| b.status_code),
        message
    );
    Err(WorkflowError::Conversion { message })
}

static RE_DISPOSITION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*"?([^";]+)"?"#).unwrap());

/// RFC 5987 form: `filename*=<charset>'<lang>'<percent-encoded>`.
static RE_DISPOSITION_EXT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\*\s*=\s*"?[\w-]*'[^']*'([^";\s]+)"?"#).unwrap()
});

/// Pull the suggested file name out of a `Content-Disposition` header.
///
/// `filename*` wins over `filename` when both are present.
fn disposition_file_name(header: &str) -> Option<String> {
    let extended = RE_DISPOSITION_EXT_NAME
        .captures(header)
        .map(|caps| percent_decode_str(&caps[1]).decode_utf8_lossy().trim().to_string())
        .filter(|name| !name.is_empty());
    extended.or_else(|| {
        RE_DISPOSITION_NAME
            .captures(header)
            .map(|caps| caps[1].trim().to_string())
            .filter(|name| !name.is_empty())
    })
}
