//! Workflow scenarios against a scripted in-memory backend.
//!
//! Every test runs on a paused Tokio clock, so debounce windows and backend
//! latencies are exact and the suite finishes instantly.

use async_trait::async_trait;
use docflow::{
    docx_file_name, ConversionBackend, ConversionResult, DocxDocument, ErrorClass, InputDocument,
    Mode, NotificationKind, PdfUpload, RecordingSink, ResultKind, SelectedFile, SourceFile,
    WorkflowConfig, WorkflowController, WorkflowError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

const MIB: usize = 1024 * 1024;
const DOCX_BYTES: &[u8] = b"PK\x03\x04fake-docx";

/// Records every call and answers after a per-input delay.
///
/// Calls are keyed by the markdown text, or `pdf:<name>` / `docx:<name>`.
#[derive(Default)]
struct ScriptedBackend {
    calls: Mutex<Vec<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    failure: Mutex<Option<String>>,
}

impl ScriptedBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn delay(&self, key: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(key.to_string(), delay);
    }

    fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, key: String) -> Result<(), WorkflowError> {
        let delay = {
            self.calls.lock().unwrap().push(key.clone());
            self.delays.lock().unwrap().get(&key).copied()
        };
        tokio::time::sleep(delay.unwrap_or(Duration::from_millis(20))).await;
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(message) => Err(WorkflowError::Conversion { message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConversionBackend for ScriptedBackend {
    async fn markdown_to_html(&self, markdown: &str) -> Result<String, WorkflowError> {
        self.answer(markdown.to_string()).await?;
        Ok(match markdown.strip_prefix("# ") {
            Some(heading) => format!("<h1>{}</h1>", heading.trim()),
            None => format!("<p>{markdown}</p>"),
        })
    }

    async fn pdf_to_html(&self, upload: &PdfUpload) -> Result<String, WorkflowError> {
        self.answer(format!("pdf:{}", upload.file_name)).await?;
        Ok(format!("<p>{}</p>", upload.file_name))
    }

    async fn pdf_to_docx(&self, upload: &PdfUpload) -> Result<DocxDocument, WorkflowError> {
        self.answer(format!("docx:{}", upload.file_name)).await?;
        Ok(DocxDocument {
            bytes: DOCX_BYTES.to_vec(),
            file_name: docx_file_name(&upload.file_name),
        })
    }
}

struct Harness {
    controller: WorkflowController,
    backend: Arc<ScriptedBackend>,
    sink: Arc<RecordingSink>,
}

/// Route the crate's tracing output through the test writer.
///
/// Set `RUST_LOG=docflow=debug` to see gate and controller events for a
/// failing test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness_with(config: WorkflowConfig) -> Harness {
    init_tracing();
    let backend = ScriptedBackend::new();
    let sink = RecordingSink::new();
    let controller = WorkflowController::new(config, backend.clone(), sink.clone());
    Harness {
        controller,
        backend,
        sink,
    }
}

fn harness() -> Harness {
    harness_with(
        WorkflowConfig::builder()
            .sample_markdown("# Sample")
            .build()
            .unwrap(),
    )
}

fn pdf_file(name: &str, size: usize) -> SelectedFile {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(size.max(bytes.len()), b' ');
    SelectedFile::new(name, bytes)
}

// ── Markdown editing ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_starts_with_sample_and_converts_on_refresh() {
    let mut h = harness();
    assert_eq!(h.controller.mode(), Mode::MarkdownToHtml);
    assert_eq!(h.controller.input().as_text(), Some("# Sample"));
    assert!(h.controller.result().is_empty());

    h.controller.refresh();
    assert!(h.controller.is_pending());
    h.controller.settle().await;

    assert_eq!(h.controller.result().html(), Some("<h1>Sample</h1>"));
    assert!(!h.controller.is_pending());
    assert_eq!(h.backend.calls(), vec!["# Sample"]);
}

#[tokio::test(start_paused = true)]
async fn test_heading_converts_to_html() {
    let mut h = harness();
    h.controller.edit_text("# Hi").unwrap();
    h.controller.settle().await;

    assert_eq!(
        *h.controller.result(),
        ConversionResult::Html("<h1>Hi</h1>".to_string())
    );
    assert!(h.controller.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_debounce_coalesces_burst_into_one_request() {
    let mut h = harness();
    for text in ["a", "ab", "abc"] {
        h.controller.edit_text(text).unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    h.controller.settle().await;

    assert_eq!(h.backend.calls(), vec!["abc"]);
    assert_eq!(h.controller.result().html(), Some("<p>abc</p>"));
}

#[tokio::test(start_paused = true)]
async fn test_pending_rises_when_debounce_fires() {
    let mut h = harness();
    h.controller.edit_text("hello").unwrap();
    assert!(!h.controller.is_pending(), "still inside the quiet period");
    assert!(h.controller.has_outstanding_work());

    // First event is the timer firing.
    assert!(h.controller.process_next().await);
    assert!(h.controller.is_pending());
    assert!(h.controller.result().is_empty());

    // Second is the response.
    assert!(h.controller.process_next().await);
    assert!(!h.controller.is_pending());
    assert_eq!(h.controller.result().html(), Some("<p>hello</p>"));

    assert!(!h.controller.process_next().await);
}

#[tokio::test(start_paused = true)]
async fn test_edits_separated_by_quiet_period_both_convert() {
    let mut h = harness();
    h.controller.edit_text("one").unwrap();
    h.controller.settle().await;
    h.controller.edit_text("two").unwrap();
    h.controller.settle().await;

    assert_eq!(h.backend.calls(), vec!["one", "two"]);
    assert_eq!(h.controller.result().html(), Some("<p>two</p>"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_is_dropped() {
    let mut h = harness();
    h.backend.delay("slow", Duration::from_millis(1000));
    h.backend.delay("fast", Duration::from_millis(10));

    h.controller.edit_text("slow").unwrap();
    // Let the timer fire so "slow" is in flight.
    assert!(h.controller.process_next().await);
    assert!(h.controller.is_pending());

    h.controller.edit_text("fast").unwrap();
    h.controller.settle().await;

    // Both requests ran; only the newer one is visible.
    assert_eq!(h.backend.calls(), vec!["slow", "fast"]);
    assert_eq!(h.controller.result().html(), Some("<p>fast</p>"));
    assert!(!h.controller.is_pending());
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_clears_result_without_request() {
    let mut h = harness();
    h.controller.edit_text("# Hi").unwrap();
    h.controller.settle().await;
    assert!(!h.controller.result().is_empty());

    h.controller.edit_text("   \n\t ").unwrap();
    assert!(h.controller.result().is_empty());
    assert!(!h.controller.is_pending());
    h.controller.settle().await;

    assert_eq!(h.backend.calls(), vec!["# Hi"]);
    assert!(h.controller.result().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_cancels_pending_debounce() {
    let mut h = harness();
    h.controller.edit_text("draft").unwrap();
    h.controller.edit_text("").unwrap();
    h.controller.settle().await;

    assert!(h.backend.calls().is_empty());
    assert!(h.controller.result().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_edit_text_outside_markdown_mode_is_refused() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    let err = h.controller.edit_text("# nope").unwrap_err();

    assert!(matches!(err, WorkflowError::WrongMode { .. }));
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(
        h.controller.last_error().map(|e| e.class),
        Some(ErrorClass::Validation)
    );
    assert_eq!(h.sink.count(NotificationKind::Error), 1);
    assert_eq!(h.sink.all().len(), 1);
    assert!(h.controller.result().is_empty());
    assert!(h.backend.calls().is_empty());
}

// ── Mode switching ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_set_mode_is_idempotent() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    let once = h.controller.snapshot();
    h.controller.set_mode(Mode::PdfToHtml);
    assert_eq!(h.controller.snapshot(), once);

    assert_eq!(*h.controller.input(), InputDocument::None);
    assert!(h.controller.result().is_empty());
    assert!(!h.controller.is_pending());
}

#[tokio::test(start_paused = true)]
async fn test_switch_to_markdown_starts_with_empty_text() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToDocx);
    h.controller.set_mode(Mode::MarkdownToHtml);
    assert_eq!(h.controller.input().as_text(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn test_mode_switch_discards_in_flight_request() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    h.backend.delay("pdf:slow.pdf", Duration::from_millis(500));
    h.controller.select_file(pdf_file("slow.pdf", 1024));
    assert!(h.controller.is_pending());

    h.controller.set_mode(Mode::MarkdownToHtml);
    assert!(!h.controller.is_pending());
    h.controller.settle().await;

    assert_eq!(h.backend.calls(), vec!["pdf:slow.pdf"]);
    assert!(h.controller.result().is_empty());
    assert_eq!(h.controller.mode(), Mode::MarkdownToHtml);
    assert_eq!(h.sink.count(NotificationKind::Success), 0);
}

#[tokio::test(start_paused = true)]
async fn test_mode_switch_cancels_debounced_edit() {
    let mut h = harness();
    h.controller.edit_text("never sent").unwrap();
    h.controller.set_mode(Mode::PdfToHtml);
    h.controller.settle().await;

    assert!(h.backend.calls().is_empty());
}

// ── File selection ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_wrong_extension_leaves_state_unchanged() {
    let mut h = harness();
    h.controller.edit_text("# Keep").unwrap();
    h.controller.settle().await;
    h.controller.set_mode(Mode::PdfToHtml);
    h.controller.select_file(pdf_file("keep.pdf", 64));
    h.controller.settle().await;
    let before = h.controller.result().clone();
    let key = h.controller.file_input_key();

    let reset = h
        .controller
        .select_file(SelectedFile::new("notes.md", b"# hi".to_vec()));

    assert!(reset.rejected);
    assert_eq!(reset.file_input_key, key + 1);
    assert_eq!(*h.controller.result(), before);
    let err = h.controller.last_error().unwrap();
    assert_eq!(err.class, ErrorClass::Validation);
    assert_eq!(err.message, "Please upload a .pdf file");
    assert_eq!(h.sink.count(NotificationKind::Error), 1);
    assert_eq!(h.backend.calls(), vec!["# Keep", "pdf:keep.pdf"]);
}

#[tokio::test(start_paused = true)]
async fn test_markdown_mode_rejects_pdf_name() {
    let mut h = harness();
    let reset = h.controller.select_file(pdf_file("paper.pdf", 64));
    assert!(reset.rejected);
    assert_eq!(
        h.controller.last_error().map(|e| e.message.as_str()),
        Some("Please upload a .md, .markdown, or .txt file")
    );
    assert_eq!(h.controller.input().as_text(), Some("# Sample"));
}

#[tokio::test(start_paused = true)]
async fn test_oversize_pdf_is_rejected_without_request() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToDocx);
    let reset = h.controller.select_file(pdf_file("huge.pdf", 11 * MIB));
    h.controller.settle().await;

    assert!(reset.rejected);
    assert!(h.backend.calls().is_empty());
    assert!(h.controller.result().is_empty());
    assert_eq!(
        h.controller.last_error().map(|e| e.message.as_str()),
        Some("File size exceeds 10MB limit")
    );
    assert_eq!(h.sink.count(NotificationKind::Error), 1);
}

#[tokio::test(start_paused = true)]
async fn test_non_pdf_bytes_are_rejected() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    let reset = h
        .controller
        .select_file(SelectedFile::new("fake.pdf", b"hello world".to_vec()));

    assert!(reset.rejected);
    assert_eq!(
        h.controller.last_error().map(|e| e.message.as_str()),
        Some("File must be a PDF")
    );
    assert!(h.backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_markdown_file_replaces_text_and_converts_immediately() {
    let mut h = harness();
    let reset = h
        .controller
        .select_file(SelectedFile::new("notes.MD", b"# Notes".to_vec()));
    assert!(!reset.rejected);
    assert!(h.controller.is_pending(), "file conversions are not debounced");

    assert_eq!(
        h.controller.input().source(),
        Some(SourceFile {
            name: "notes.MD".into(),
            size: 7
        })
    );
    h.controller.settle().await;

    assert_eq!(h.controller.result().html(), Some("<h1>Notes</h1>"));
    assert_eq!(h.sink.count(NotificationKind::Success), 1);
}

#[tokio::test(start_paused = true)]
async fn test_picker_key_increments_on_every_selection() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    let a = h.controller.select_file(pdf_file("a.pdf", 64));
    let b = h.controller.select_file(pdf_file("a.pdf", 64));
    let c = h.controller.select_file(SelectedFile::new("a.txt", vec![]));
    assert_eq!(
        (a.file_input_key, b.file_input_key, c.file_input_key),
        (1, 2, 3)
    );
    h.controller.settle().await;
}

// ── PDF conversions ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_pdf_to_html() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    h.controller.select_file(pdf_file("scan.pdf", 4096));
    h.controller.settle().await;

    assert_eq!(h.controller.result().html(), Some("<p>scan.pdf</p>"));
    assert!(matches!(h.controller.input(), InputDocument::Pdf(p) if p.file_name == "scan.pdf"));
}

#[tokio::test(start_paused = true)]
async fn test_pdf_to_docx_then_download_then_mode_switch() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToDocx);
    h.controller.select_file(pdf_file("report.pdf", 2 * MIB));
    assert!(h.controller.is_pending());
    h.controller.settle().await;

    match h.controller.result() {
        ConversionResult::Docx { file_name, bytes } => {
            assert_eq!(file_name, "report.docx");
            assert_eq!(&bytes[..], DOCX_BYTES);
        }
        other => panic!("expected Docx, got {other:?}"),
    }
    let download = h.controller.download_current_docx().unwrap();
    assert_eq!(download.file_name, "report.docx");
    assert_eq!(h.sink.count(NotificationKind::Success), 1);

    h.controller.set_mode(Mode::PdfToHtml);
    assert!(h.controller.result().is_empty());
    assert!(matches!(
        h.controller.download_current_docx(),
        Err(WorkflowError::NoDocxAvailable)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_newer_pdf_wins() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    h.backend.delay("pdf:first.pdf", Duration::from_millis(800));
    h.controller.select_file(pdf_file("first.pdf", 64));
    h.controller.select_file(pdf_file("second.pdf", 64));
    h.controller.settle().await;

    assert_eq!(h.controller.result().html(), Some("<p>second.pdf</p>"));
    assert_eq!(h.sink.count(NotificationKind::Success), 1);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_backend_failure_is_terminal_and_notified_once() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    h.backend
        .fail_with("Failed to convert PDF: No text content found in PDF");
    h.controller.select_file(pdf_file("blank.pdf", 64));
    h.controller.settle().await;

    assert_eq!(
        *h.controller.result(),
        ConversionResult::Failed("Failed to convert PDF: No text content found in PDF".into())
    );
    assert!(!h.controller.is_pending());
    assert_eq!(
        h.controller.last_error().map(|e| e.class),
        Some(ErrorClass::Conversion)
    );
    assert_eq!(h.sink.count(NotificationKind::Error), 1);
    assert_eq!(h.backend.calls().len(), 1, "no automatic retry");

    // Manual retry.
    h.backend.recover();
    h.controller.refresh();
    h.controller.settle().await;
    assert_eq!(h.controller.result().html(), Some("<p>blank.pdf</p>"));
    assert!(h.controller.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_becomes_transport_failure() {
    let mut h = harness_with(
        WorkflowConfig::builder()
            .request_timeout_secs(Some(5))
            .build()
            .unwrap(),
    );
    h.backend.delay("stuck", Duration::from_secs(3600));
    h.controller.edit_text("stuck").unwrap();
    h.controller.settle().await;

    assert_eq!(h.controller.result().kind(), ResultKind::Failed);
    let err = h.controller.last_error().unwrap();
    assert_eq!(err.class, ErrorClass::Transport);
    assert!(err.message.contains("timed out after 5s"), "got: {}", err.message);
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_is_not_reported() {
    let mut h = harness();
    h.backend.delay("# Old", Duration::from_millis(500));
    h.controller.edit_text("# Old").unwrap();
    assert!(h.controller.process_next().await);
    h.backend.fail_with("boom");
    h.controller.set_mode(Mode::PdfToHtml);
    h.controller.settle().await;

    assert!(h.controller.last_error().is_none());
    assert!(h.sink.all().is_empty());
}

// ── Reading files from disk ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_open_file_reads_then_converts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readme.markdown");
    std::fs::write(&path, "# Readme").unwrap();

    let mut h = harness();
    let reset = h.controller.open_file(&path);
    assert!(!reset.rejected);
    assert!(h.controller.is_pending());
    h.controller.settle().await;

    assert_eq!(h.controller.input().as_text(), Some("# Readme"));
    assert_eq!(h.controller.result().html(), Some("<h1>Readme</h1>"));
    assert_eq!(h.controller.file_input_key(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_open_missing_file_is_read_error() {
    let mut h = harness();
    h.controller.open_file("/definitely/not/here.md");
    h.controller.settle().await;

    assert_eq!(
        *h.controller.result(),
        ConversionResult::Failed("Failed to read file".into())
    );
    assert_eq!(
        h.controller.last_error().map(|e| e.class),
        Some(ErrorClass::Read)
    );
    assert_eq!(h.sink.count(NotificationKind::Error), 1);
    assert!(h.backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_open_oversize_pdf_is_rejected_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.pdf");
    std::fs::File::create(&path)
        .unwrap()
        .set_len(11 * MIB as u64)
        .unwrap();

    let mut h = harness();
    h.controller.set_mode(Mode::PdfToHtml);
    h.controller.open_file(&path);
    h.controller.settle().await;

    assert!(h.controller.result().is_empty());
    assert!(!h.controller.is_pending());
    assert_eq!(
        h.controller.last_error().map(|e| e.message.as_str()),
        Some("File size exceeds 10MB limit")
    );
    assert!(h.backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_mode_switch_drops_in_flight_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.md");
    std::fs::write(&path, "# A").unwrap();

    let mut h = harness();
    h.controller.open_file(&path);
    assert!(h.controller.is_pending());
    h.controller.set_mode(Mode::PdfToHtml);
    h.controller.settle().await;

    assert_eq!(h.controller.mode(), Mode::PdfToHtml);
    assert_eq!(*h.controller.input(), InputDocument::None);
    assert!(h.controller.result().is_empty());
    assert!(!h.controller.is_pending());
    assert!(h.backend.calls().is_empty());
    assert!(h.sink.all().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_newer_open_supersedes_older_read() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.md");
    let b = dir.path().join("b.md");
    std::fs::write(&a, "# A").unwrap();
    std::fs::write(&b, "# B").unwrap();

    let mut h = harness();
    h.controller.open_file(&a);
    h.controller.open_file(&b);
    h.controller.settle().await;

    assert_eq!(h.backend.calls(), vec!["# B"]);
    assert_eq!(h.controller.input().as_text(), Some("# B"));
    assert_eq!(h.controller.result().html(), Some("<h1>B</h1>"));
    assert_eq!(h.controller.file_input_key(), 2);
    assert_eq!(h.sink.count(NotificationKind::Error), 0);
}

#[tokio::test(start_paused = true)]
async fn test_open_file_wrong_extension_rejected_synchronously() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToDocx);
    let reset = h.controller.open_file("/tmp/whatever.txt");
    assert!(reset.rejected);
    assert!(!h.controller.has_outstanding_work());
}

// ── Clear, save, snapshot ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_clear_restores_default_input() {
    let mut h = harness();
    h.controller.edit_text("# Changed").unwrap();
    h.controller.settle().await;
    h.controller.clear();

    assert_eq!(h.controller.input().as_text(), Some("# Sample"));
    assert!(h.controller.result().is_empty());
    assert!(h.controller.last_error().is_none());

    h.controller.set_mode(Mode::PdfToHtml);
    h.controller.select_file(pdf_file("a.pdf", 64));
    h.controller.clear();
    h.controller.settle().await;
    assert_eq!(*h.controller.input(), InputDocument::None);
    assert!(h.controller.result().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_save_docx_writes_into_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToDocx);
    h.controller.select_file(pdf_file("Quarterly.PDF", 128));
    h.controller.settle().await;

    let path = h.controller.save_docx(dir.path()).await.unwrap();
    assert_eq!(path, dir.path().join("Quarterly.docx"));
    assert_eq!(std::fs::read(&path).unwrap(), DOCX_BYTES);
    assert_eq!(h.sink.count(NotificationKind::Info), 1);
}

#[tokio::test(start_paused = true)]
async fn test_save_docx_without_docx_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness();
    let err = h.controller.save_docx(dir.path()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NoDocxAvailable));
    assert!(h.sink.all().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_serialises_visible_state() {
    let mut h = harness();
    h.controller.set_mode(Mode::PdfToDocx);
    h.controller.select_file(pdf_file("r.pdf", 100));
    h.controller.settle().await;

    let json = serde_json::to_value(h.controller.snapshot()).unwrap();
    assert_eq!(json["mode"], "pdf-to-docx");
    assert_eq!(json["result"], "docx");
    assert_eq!(json["docx"]["file_name"], "r.docx");
    assert_eq!(json["input"]["kind"], "pdf");
    assert_eq!(json["input"]["source"]["size"], 100);
    assert_eq!(json["pending"], false);
    assert!(json.get("html").is_none());
}
