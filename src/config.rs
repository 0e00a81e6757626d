//! Configuration for the conversion workflow.
//!
//! Every knob the controller needs is passed in explicitly through
//! [`WorkflowConfig`], built via [`WorkflowConfigBuilder`]. The backend base
//! URL in particular is a constructor argument, not a process-wide global.

use crate::error::WorkflowError;
use crate::sample::DEFAULT_SAMPLE_MARKDOWN;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default conversion service root.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Largest PDF the service accepts (10 MiB).
pub const DEFAULT_MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for a [`crate::WorkflowController`].
///
/// Built via [`WorkflowConfig::builder()`] or using
/// [`WorkflowConfig::default()`].
///
/// # Example
/// ```rust
/// use docflow::WorkflowConfig;
///
/// let config = WorkflowConfig::builder()
///     .backend_base_url("http://converter.internal:3001")
///     .debounce_ms(250)
///     .request_timeout_secs(Some(30))
///     .build()
///     .unwrap();
/// assert_eq!(config.debounce_ms, 250);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Root URL of the conversion service. Default: `http://localhost:3001`.
    pub backend_base_url: String,

    /// Quiet period before a text edit turns into a request. Default: 300.
    ///
    /// File uploads ignore this and dispatch immediately.
    pub debounce_ms: u64,

    /// Maximum accepted PDF size in bytes. Default: 10 MiB.
    pub max_pdf_bytes: u64,

    /// Auto-dismiss interval stamped on every notification. Default: 3000.
    pub notification_duration_ms: u64,

    /// Per-request timeout in seconds. Default: `Some(60)`.
    ///
    /// `None` waits forever; a hung backend then leaves the workflow pending
    /// until the user switches mode or submits new input.
    pub request_timeout_secs: Option<u64>,

    /// Markdown shown before the user types anything.
    pub sample_markdown: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BACKEND_URL.to_string(),
            debounce_ms: 300,
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
            notification_duration_ms: 3000,
            request_timeout_secs: Some(60),
            sample_markdown: DEFAULT_SAMPLE_MARKDOWN.to_string(),
        }
    }
}

impl WorkflowConfig {
    /// Create a new builder for `WorkflowConfig`.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overridden by `DOCFLOW_API_URL`, `DOCFLOW_DEBOUNCE_MS` and
    /// `DOCFLOW_TIMEOUT_SECS` (`0` disables the timeout).
    pub fn from_env() -> Result<Self, WorkflowError> {
        let mut builder = Self::builder();

        if let Ok(url) = std::env::var("DOCFLOW_API_URL") {
            if !url.is_empty() {
                builder = builder.backend_base_url(url);
            }
        }
        if let Ok(ms) = std::env::var("DOCFLOW_DEBOUNCE_MS") {
            let ms = ms.trim().parse::<u64>().map_err(|e| {
                WorkflowError::InvalidConfig(format!("DOCFLOW_DEBOUNCE_MS '{ms}': {e}"))
            })?;
            builder = builder.debounce_ms(ms);
        }
        if let Ok(secs) = std::env::var("DOCFLOW_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                WorkflowError::InvalidConfig(format!("DOCFLOW_TIMEOUT_SECS '{secs}': {e}"))
            })?;
            builder = builder.request_timeout_secs((secs > 0).then_some(secs));
        }

        builder.build()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    /// `backend_base_url` joined with `path`, without doubled slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn backend_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend_base_url = url.into().trim().to_string();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    pub fn max_pdf_bytes(mut self, bytes: u64) -> Self {
        self.config.max_pdf_bytes = bytes;
        self
    }

    pub fn notification_duration_ms(mut self, ms: u64) -> Self {
        self.config.notification_duration_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn sample_markdown(mut self, text: impl Into<String>) -> Self {
        self.config.sample_markdown = text.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WorkflowConfig, WorkflowError> {
        let c = &self.config;
        if c.backend_base_url.is_empty() {
            return Err(WorkflowError::InvalidConfig(
                "backend base URL must not be empty".into(),
            ));
        }
        if !(c.backend_base_url.starts_with("http://") || c.backend_base_url.starts_with("https://"))
        {
            return Err(WorkflowError::InvalidConfig(format!(
                "backend base URL must be http(s), got '{}'",
                c.backend_base_url
            )));
        }
        if c.max_pdf_bytes == 0 {
            return Err(WorkflowError::InvalidConfig(
                "PDF size limit must be at least 1 byte".into(),
            ));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(WorkflowError::InvalidConfig(
                "request timeout must be at least 1s (use None to disable)".into(),
            ));
        }
        Ok(self.config)
    }
}
