//! The conversion workflow state machine.
//!
//! [`WorkflowController`] is the single owner of mode, input, result, pending
//! flag and last error. External events (mode switch, text edit, file
//! selection, clear) and request completions each map to one [`Transition`]
//! applied through [`WorkflowState::apply`], so related fields always change
//! together.
//!
//! ## Event flow
//!
//! ```text
//! edit_text ──▶ gate.dispatch(300ms) ──▶ Started ──▶ backend ──▶ Finished
//! select_file ─▶ gate.dispatch(0) ─────────────────▶ backend ──▶ Finished
//! open_file ──▶ gate.dispatch(0) ──▶ read ──▶ FileRead ──▶ select_file …
//! set_mode / clear ──▶ gate.invalidate()
//! ```
//!
//! Completions are consumed with [`WorkflowController::process_next`] or
//! [`WorkflowController::settle`]. Anything not carrying the gate's current
//! token is dropped without touching state.

use crate::backend::{ConversionJob, SharedBackend};
use crate::config::WorkflowConfig;
use crate::document::{
    ConversionResult, DocxDownload, InputDocument, PdfUpload, SelectedFile, SourceFile,
};
use crate::error::{ErrorClass, LastError, WorkflowError};
use crate::gate::{GateEvent, RequestGate, RequestToken};
use crate::ingest;
use crate::mode::Mode;
use crate::notify::{Notification, NotificationKind, SharedSink};
use crate::snapshot::{result_fields, InputSummary, WorkflowSnapshot};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the view renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    pub mode: Mode,
    pub input: InputDocument,
    pub result: ConversionResult,
    pub pending: bool,
    pub last_error: Option<LastError>,
    /// Bumped after every file selection so the picker can be re-created and
    /// the same file chosen again.
    pub file_input_key: u64,
}

impl WorkflowState {
    fn new(mode: Mode, sample: &str) -> Self {
        Self {
            mode,
            input: default_input(mode, sample),
            result: ConversionResult::Empty,
            pending: false,
            last_error: None,
            file_input_key: 0,
        }
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::ModeChanged(mode) => {
                self.mode = mode;
                self.input = match mode {
                    Mode::MarkdownToHtml => InputDocument::text(""),
                    _ => InputDocument::None,
                };
                self.result = ConversionResult::Empty;
                self.pending = false;
                self.last_error = None;
            }
            Transition::Cleared { input } => {
                self.input = input;
                self.result = ConversionResult::Empty;
                self.pending = false;
                self.last_error = None;
            }
            Transition::InputBlank { input } => {
                self.input = input;
                self.result = ConversionResult::Empty;
                self.pending = false;
                self.last_error = None;
            }
            Transition::Dispatched { input, started } => {
                if let Some(input) = input {
                    self.input = input;
                }
                self.pending = started;
                self.last_error = None;
            }
            Transition::Started => self.pending = true,
            Transition::Resolved(result) => {
                self.result = result;
                self.pending = false;
                self.last_error = None;
            }
            Transition::Failed(error) => {
                self.result = ConversionResult::Failed(error.message.clone());
                self.pending = false;
                self.last_error = Some(error);
            }
            Transition::Rejected { error, settle } => {
                self.last_error = Some(error);
                if settle {
                    self.pending = false;
                }
            }
            Transition::PickerReset => self.file_input_key += 1,
        }
    }
}

/// One atomic state change.
#[derive(Debug)]
enum Transition {
    ModeChanged(Mode),
    Cleared { input: InputDocument },
    /// Blank markdown: nothing to convert.
    InputBlank { input: InputDocument },
    /// A request was dispatched; `started` when it runs without debounce.
    Dispatched {
        input: Option<InputDocument>,
        started: bool,
    },
    /// A debounced request's timer fired.
    Started,
    Resolved(ConversionResult),
    /// Backend, transport or read failure: terminal for the request.
    Failed(LastError),
    /// Local validation failure: result untouched. `settle` clears pending
    /// when the rejected work was the current request.
    Rejected { error: LastError, settle: bool },
    PickerReset,
}

/// Completion payloads carried through the gate.
#[derive(Debug)]
enum Completion {
    Converted {
        label: &'static str,
        from_file: Option<String>,
        outcome: Result<ConversionResult, WorkflowError>,
    },
    FileRead(Result<SelectedFile, WorkflowError>),
}

/// Returned by file selection: the picker must be reset to `file_input_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerReset {
    pub file_input_key: u64,
    /// True when the selection was refused up front.
    pub rejected: bool,
}

/// Owns the workflow state and drives conversions.
///
/// Methods that dispatch work spawn Tokio tasks and must be called from
/// within a Tokio runtime.
pub struct WorkflowController {
    config: WorkflowConfig,
    backend: SharedBackend,
    sink: SharedSink,
    gate: RequestGate<Completion>,
    state: WorkflowState,
}

impl WorkflowController {
    /// Start in markdown mode with the configured sample text.
    ///
    /// Nothing is converted until the first event; call
    /// [`refresh`](Self::refresh) to render the sample right away.
    pub fn new(config: WorkflowConfig, backend: SharedBackend, sink: SharedSink) -> Self {
        let state = WorkflowState::new(Mode::default(), &config.sample_markdown);
        Self {
            config,
            backend,
            sink,
            gate: RequestGate::new(),
            state,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn input(&self) -> &InputDocument {
        &self.state.input
    }

    pub fn result(&self) -> &ConversionResult {
        &self.state.result
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    pub fn last_error(&self) -> Option<&LastError> {
        self.state.last_error.as_ref()
    }

    pub fn file_input_key(&self) -> u64 {
        self.state.file_input_key
    }

    /// Token of the most recent dispatch.
    pub fn current_token(&self) -> RequestToken {
        self.gate.current()
    }

    /// True while a timer, request or file read is outstanding.
    pub fn has_outstanding_work(&self) -> bool {
        self.gate.has_outstanding()
    }

    // ── External events ──────────────────────────────────────────────────

    /// Switch mode and reset every derived field.
    ///
    /// Outstanding requests are superseded; their completions will be dropped.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.state.mode {
            info!("Mode {} → {}", self.state.mode, mode);
        }
        self.gate.invalidate();
        self.state.apply(Transition::ModeChanged(mode));
    }

    /// Replace the markdown text and schedule a debounced conversion.
    ///
    /// Blank text clears the result immediately without a request. Outside
    /// markdown mode the edit is rejected like an invalid file selection.
    pub fn edit_text(&mut self, text: impl Into<String>) -> Result<(), WorkflowError> {
        if self.state.mode != Mode::MarkdownToHtml {
            let err = WorkflowError::WrongMode {
                operation: "edit_text",
                mode: self.state.mode,
            };
            self.reject(&err, false);
            return Err(err);
        }
        let input = InputDocument::text(text);
        self.convert_text(input, self.config.debounce(), None);
        Ok(())
    }

    /// Accept a file whose bytes are already in memory.
    ///
    /// Invalid selections set `last_error`, emit one error notification and
    /// otherwise leave state alone. The picker is reset either way.
    pub fn select_file(&mut self, file: SelectedFile) -> PickerReset {
        let rejected = match ingest::validate(self.state.mode, &file, self.config.max_pdf_bytes) {
            Ok(()) => {
                self.accept_file(file);
                false
            }
            Err(err) => {
                self.reject(&err, false);
                true
            }
        };
        self.reset_picker(rejected)
    }

    /// Read `path` asynchronously, then continue as [`select_file`](Self::select_file).
    ///
    /// The read takes part in request gating: a mode switch or newer
    /// selection before it completes discards it.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> PickerReset {
        let path = path.as_ref().to_path_buf();
        let name = ingest::file_name_of(&path);
        let mode = self.state.mode;

        if let Err(err) = ingest::check_file_name(mode, &name) {
            self.reject(&err, false);
            return self.reset_picker(true);
        }

        let limit = self.config.max_pdf_bytes;
        debug!("Reading {}", path.display());
        self.gate.dispatch(Duration::ZERO, async move {
            Completion::FileRead(ingest::read_file(path, mode, limit).await)
        });
        self.state.apply(Transition::Dispatched {
            input: None,
            started: true,
        });
        self.reset_picker(false)
    }

    /// Restore the mode's default input and drop the result.
    pub fn clear(&mut self) {
        self.gate.invalidate();
        let input = default_input(self.state.mode, &self.config.sample_markdown);
        self.state.apply(Transition::Cleared { input });
    }

    /// Convert the current input again, immediately.
    ///
    /// This is the retry path after a failure. Does nothing in PDF modes
    /// before a file has been chosen.
    pub fn refresh(&mut self) {
        match &self.state.input {
            InputDocument::Text { .. } => {
                let input = self.state.input.clone();
                self.convert_text(input, Duration::ZERO, None);
            }
            InputDocument::Pdf(upload) => {
                let upload = upload.clone();
                self.convert_pdf(upload);
            }
            InputDocument::None => debug!("Nothing to refresh in {} mode", self.state.mode),
        }
    }

    /// The current DOCX, ready to save.
    pub fn download_current_docx(&self) -> Result<DocxDownload, WorkflowError> {
        match &self.state.result {
            ConversionResult::Docx { bytes, file_name } => Ok(DocxDownload {
                file_name: file_name.clone(),
                bytes: Arc::clone(bytes),
            }),
            _ => Err(WorkflowError::NoDocxAvailable),
        }
    }

    /// Write the current DOCX into `dir` and return its path.
    ///
    /// The file appears atomically: bytes go to a temp file in `dir` that is
    /// then renamed over the final name.
    pub async fn save_docx(&mut self, dir: impl AsRef<Path>) -> Result<PathBuf, WorkflowError> {
        let download = self.download_current_docx()?;
        let dir = dir.as_ref().to_path_buf();
        // Never let a server-suggested name escape `dir`.
        let file_name = Path::new(&download.file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "document.docx".into());
        let target = dir.join(file_name);

        let write_target = target.clone();
        let written =
            tokio::task::spawn_blocking(move || write_atomic(&dir, &write_target, &download.bytes))
                .await
                .unwrap_or_else(|e| Err(std::io::Error::other(format!("write task failed: {e}"))));

        match written {
            Ok(()) => {
                info!("Saved {}", target.display());
                self.notify(NotificationKind::Info, format!("Saved {}", target.display()));
                Ok(target)
            }
            Err(source) => {
                let err = WorkflowError::OutputWriteFailed {
                    path: target,
                    source,
                };
                self.reject(&err, false);
                Err(err)
            }
        }
    }

    /// Serialisable copy of the observable state.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        let (html, docx, failure) = result_fields(&self.state.result);
        WorkflowSnapshot {
            mode: self.state.mode,
            input: InputSummary::from(&self.state.input),
            result: self.state.result.kind(),
            html,
            docx,
            failure,
            pending: self.state.pending,
            last_error: self.state.last_error.clone(),
            file_input_key: self.state.file_input_key,
        }
    }

    // ── Completions ──────────────────────────────────────────────────────

    /// Wait for and handle one completion.
    ///
    /// Returns `false` once nothing is outstanding.
    pub async fn process_next(&mut self) -> bool {
        match self.gate.next_event().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Handle completions until no timer, request or read is outstanding.
    pub async fn settle(&mut self) {
        while self.process_next().await {}
    }

    fn handle(&mut self, event: GateEvent<Completion>) {
        match event {
            GateEvent::Started(token) => {
                if self.gate.is_current(token) {
                    self.state.apply(Transition::Started);
                }
            }
            GateEvent::Finished { token, output } => {
                if !self.gate.is_current(token) {
                    debug!(
                        "Dropping stale completion {} (current {})",
                        token.get(),
                        self.gate.current().get()
                    );
                    return;
                }
                match output {
                    Completion::Converted {
                        label,
                        from_file,
                        outcome,
                    } => self.finish_conversion(label, from_file, outcome),
                    Completion::FileRead(Ok(file)) => self.accept_file(file),
                    Completion::FileRead(Err(err)) => {
                        if err.class() == ErrorClass::Validation {
                            self.reject(&err, true);
                        } else {
                            self.fail(&err);
                        }
                    }
                }
            }
        }
    }

    fn finish_conversion(
        &mut self,
        label: &'static str,
        from_file: Option<String>,
        outcome: Result<ConversionResult, WorkflowError>,
    ) {
        match outcome {
            Ok(result) => {
                debug!("Applied {} result ({:?})", label, result.kind());
                if let Some(name) = from_file {
                    let message = match &result {
                        ConversionResult::Docx { file_name, .. } => {
                            format!("Converted {name} to {file_name}")
                        }
                        _ => format!("Converted {name}"),
                    };
                    self.notify(NotificationKind::Success, message);
                }
                self.state.apply(Transition::Resolved(result));
            }
            Err(err) => {
                warn!("{} conversion failed: {}", label, err);
                self.fail(&err);
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn accept_file(&mut self, file: SelectedFile) {
        // A read can finish after its checks were last run on metadata only.
        if let Err(err) = ingest::validate(self.state.mode, &file, self.config.max_pdf_bytes) {
            self.reject(&err, true);
            return;
        }
        info!("Selected {} ({} bytes)", file.name, file.size);
        if self.state.mode.takes_pdf() {
            self.convert_pdf(PdfUpload::new(file.name, file.bytes));
        } else {
            let source = SourceFile {
                name: file.name.clone(),
                size: file.size,
            };
            let input = InputDocument::Text {
                text: ingest::decode_text(&file.bytes),
                source: Some(source),
            };
            self.convert_text(input, Duration::ZERO, Some(file.name));
        }
    }

    fn convert_text(&mut self, input: InputDocument, delay: Duration, from_file: Option<String>) {
        let text = input.as_text().unwrap_or_default();
        if text.trim().is_empty() {
            self.gate.invalidate();
            self.state.apply(Transition::InputBlank { input });
            return;
        }
        let job = ConversionJob::Markdown(text.to_string());
        self.dispatch(job, delay, from_file);
        self.state.apply(Transition::Dispatched {
            input: Some(input),
            started: delay.is_zero(),
        });
    }

    fn convert_pdf(&mut self, upload: PdfUpload) {
        let job = match self.state.mode {
            Mode::PdfToDocx => ConversionJob::PdfToDocx(upload.clone()),
            _ => ConversionJob::PdfToHtml(upload.clone()),
        };
        let name = upload.file_name.clone();
        self.dispatch(job, Duration::ZERO, Some(name));
        self.state.apply(Transition::Dispatched {
            input: Some(InputDocument::Pdf(upload)),
            started: true,
        });
    }

    fn dispatch(&mut self, job: ConversionJob, delay: Duration, from_file: Option<String>) {
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.request_timeout();
        let label = job.label();
        let token = self.gate.dispatch(delay, async move {
            let run = job.run(backend);
            let outcome = match timeout {
                Some(limit) => tokio::time::timeout(limit, run)
                    .await
                    .unwrap_or(Err(WorkflowError::Timeout {
                        secs: limit.as_secs(),
                    })),
                None => run.await,
            };
            Completion::Converted {
                label,
                from_file,
                outcome,
            }
        });
        debug!("Request {} ({}) dispatched", token.get(), label);
    }

    /// Terminal request failure: `Failed` result plus one notification.
    fn fail(&mut self, err: &WorkflowError) {
        let error = LastError::from(err);
        self.notify(NotificationKind::Error, error.message.clone());
        self.state.apply(Transition::Failed(error));
    }

    /// Local refusal: `last_error` plus one notification, result untouched.
    fn reject(&mut self, err: &WorkflowError, settle: bool) {
        warn!("Rejected: {}", err);
        let error = LastError::from(err);
        self.notify(NotificationKind::Error, error.message.clone());
        self.state.apply(Transition::Rejected { error, settle });
    }

    fn reset_picker(&mut self, rejected: bool) -> PickerReset {
        self.state.apply(Transition::PickerReset);
        PickerReset {
            file_input_key: self.state.file_input_key,
            rejected,
        }
    }

    fn notify(&self, kind: NotificationKind, message: String) {
        self.sink.notify(Notification {
            message,
            kind,
            duration: self.config.notification_duration(),
        });
    }
}

fn default_input(mode: Mode, sample: &str) -> InputDocument {
    match mode {
        Mode::MarkdownToHtml => InputDocument::text(sample),
        _ => InputDocument::None,
    }
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
