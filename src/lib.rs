//! # docflow
//!
//! Drive document conversions (Markdown → HTML, PDF → HTML, PDF → DOCX)
//! against a conversion service, keeping exactly one authoritative result
//! no matter how fast the user types, uploads or switches modes.
//!
//! ## Workflow Overview
//!
//! ```text
//! user events                        WorkflowController
//!  │                                  │
//!  ├─ set_mode ──────────────────────▶├─ reset state, invalidate gate
//!  ├─ edit_text ─────────────────────▶├─ RequestGate (300ms debounce)
//!  ├─ select_file / open_file ───────▶├─ ingest: extension, size, %PDF
//!  │                                  │      └─ RequestGate (immediate)
//!  │                                  ├─ ConversionBackend (HTTP)
//!  │                                  ├─ stale completions dropped
//!  └─ download / save_docx ◀──────────┴─ ConversionResult + notifications
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docflow::{HttpBackend, Mode, TracingSink, WorkflowConfig, WorkflowController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkflowConfig::from_env()?;
//!     let backend = Arc::new(HttpBackend::new(&config)?);
//!     let mut controller = WorkflowController::new(config, backend, Arc::new(TracingSink));
//!
//!     controller.edit_text("# Hello")?;
//!     controller.settle().await;
//!     println!("{}", controller.result().html().unwrap_or_default());
//!
//!     controller.set_mode(Mode::PdfToDocx);
//!     controller.open_file("report.pdf");
//!     controller.settle().await;
//!     controller.save_docx(".").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docflow` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docflow = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod gate;
pub mod ingest;
pub mod mode;
pub mod notify;
pub mod sample;
pub mod snapshot;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{ConversionBackend, ConversionJob, DocxDocument, HealthStatus, HttpBackend, SharedBackend};
pub use config::{WorkflowConfig, WorkflowConfigBuilder};
pub use controller::{PickerReset, WorkflowController, WorkflowState};
pub use document::{
    format_file_size, ConversionResult, DocxDownload, InputDocument, PdfUpload, ResultKind,
    SelectedFile, SourceFile,
};
pub use error::{ErrorClass, LastError, WorkflowError};
pub use gate::{GateEvent, RequestGate, RequestToken};
pub use mode::{docx_file_name, Mode};
pub use notify::{
    NoopSink, Notification, NotificationKind, NotificationSink, RecordingSink, SharedSink,
    TracingSink,
};
pub use snapshot::{DocxSummary, InputSummary, WorkflowSnapshot};
