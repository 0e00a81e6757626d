//! CLI binary for docflow.
//!
//! A thin shim over the library crate: maps flags to `WorkflowConfig`, wires
//! an `HttpBackend` and a console notification sink into a
//! `WorkflowController`, then either converts one file or runs a line-based
//! interactive session on stdin.

use anyhow::{bail, Context, Result};
use clap::Parser;
use docflow::config::DEFAULT_BACKEND_URL;
use docflow::{
    format_file_size, ConversionResult, HttpBackend, Mode, Notification, NotificationKind,
    NotificationSink, WorkflowConfig, WorkflowController, WorkflowError,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Console notification sink ────────────────────────────────────────────────

/// Prints notifications as coloured lines on stderr.
///
/// While a spinner is attached, lines go through it so the bar is redrawn
/// underneath instead of being torn.
struct ConsoleSink {
    quiet: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            quiet,
            bar: Mutex::new(None),
        })
    }

    fn attach(&self, bar: Option<ProgressBar>) {
        if let Ok(mut slot) = self.bar.lock() {
            *slot = bar;
        }
    }
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, n: Notification) {
        // Errors are always shown; --quiet only hides success and info.
        if self.quiet && !n.kind.is_error() {
            return;
        }
        let line = match n.kind {
            NotificationKind::Success => format!("{} {}", green("✔"), n.message),
            NotificationKind::Error => format!("{} {}", red("✘"), red(&n.message)),
            NotificationKind::Info => format!("{} {}", cyan("ℹ"), n.message),
        };
        match self.bar.lock().ok().and_then(|b| b.clone()) {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render a markdown file to HTML (stdout)
  docflow notes.md

  # Extract a PDF's text as HTML
  docflow --mode pdf report.pdf > report.html

  # Convert a PDF to DOCX, saved next to the current directory
  docflow --mode pdf-to-docx report.pdf

  # Save the DOCX somewhere else
  docflow --mode pdf-to-docx --output-dir out/ report.pdf

  # Full workflow state as JSON
  docflow --json notes.md

  # Is the conversion service up?
  docflow --check

  # Interactive session
  docflow

INTERACTIVE COMMANDS:
  mode <markdown|pdf|pdf-to-docx>   switch mode (resets input and result)
  edit <text>                       replace the markdown text (\n for newlines)
  open <path>                       select a file for the current mode
  clear                             restore the default input
  refresh                           convert the current input again
  save [dir]                        write the current DOCX into dir (default .)
  show                              print the current result
  wait                              block until pending work is finished
  help                              list commands
  quit                              leave

ENVIRONMENT VARIABLES:
  DOCFLOW_API_URL         Conversion service root (default http://localhost:3001)
  DOCFLOW_DEBOUNCE_MS     Quiet period before a text edit is converted
  DOCFLOW_TIMEOUT_SECS    Per-request timeout; 0 disables it
  RUST_LOG                Log filter (overrides --verbose / --quiet)
"#;

/// Convert Markdown and PDF documents to HTML or DOCX through a conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "docflow",
    version,
    about = "Convert Markdown and PDF documents to HTML or DOCX",
    long_about = "Drive a document conversion service from the terminal. Convert a single \
Markdown or PDF file, or run an interactive session where text edits are debounced and \
only the freshest result is ever shown.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File to convert. Omit for an interactive session.
    file: Option<PathBuf>,

    /// Conversion service base URL.
    #[arg(long, env = "DOCFLOW_API_URL", default_value = DEFAULT_BACKEND_URL)]
    api_url: String,

    /// Conversion mode.
    #[arg(short, long, value_enum, default_value = "markdown")]
    mode: ModeArg,

    /// Quiet period before a text edit is sent, in milliseconds.
    #[arg(long, env = "DOCFLOW_DEBOUNCE_MS", default_value_t = 300)]
    debounce_ms: u64,

    /// Per-request timeout in seconds (0 disables it).
    #[arg(long, env = "DOCFLOW_TIMEOUT_SECS", default_value_t = 60)]
    timeout: u64,

    /// Wait for the service indefinitely.
    #[arg(long)]
    no_timeout: bool,

    /// Directory DOCX output is saved into.
    #[arg(short, long, env = "DOCFLOW_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Print the workflow snapshot as JSON instead of the bare result.
    #[arg(long)]
    json: bool,

    /// Only query the service's health endpoint.
    #[arg(long)]
    check: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCFLOW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCFLOW_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Markdown,
    Pdf,
    PdfToDocx,
}

impl From<ModeArg> for Mode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Markdown => Mode::MarkdownToHtml,
            ModeArg::Pdf => Mode::PdfToHtml,
            ModeArg::PdfToDocx => Mode::PdfToDocx,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let backend = Arc::new(HttpBackend::new(&config).context("Failed to create HTTP client")?);

    // ── Health check ─────────────────────────────────────────────────────
    if cli.check {
        let health = backend
            .health()
            .await
            .with_context(|| format!("Health check against {} failed", backend.base_url()))?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&health).context("Failed to serialise health")?
            );
        } else {
            let uptime = health
                .uptime
                .map(|u| format!("  up {u:.0}s"))
                .unwrap_or_default();
            println!(
                "{} {} is {}{}",
                if health.is_ok() { green("✔") } else { red("✘") },
                bold(backend.base_url()),
                health.status,
                dim(&uptime)
            );
        }
        if !health.is_ok() {
            bail!("Backend reported status '{}'", health.status);
        }
        return Ok(());
    }

    let sink = ConsoleSink::new(cli.quiet);
    let mut controller = WorkflowController::new(config, backend, sink.clone());
    enter_mode(&mut controller, cli.mode.into());

    match cli.file.clone() {
        Some(path) => convert_one(&cli, &mut controller, &sink, path).await,
        None => interactive(&cli, &mut controller, &sink).await,
    }
}

/// Map CLI args to `WorkflowConfig`.
fn build_config(cli: &Cli) -> Result<WorkflowConfig> {
    let timeout = if cli.no_timeout || cli.timeout == 0 {
        None
    } else {
        Some(cli.timeout)
    };
    WorkflowConfig::builder()
        .backend_base_url(cli.api_url.clone())
        .debounce_ms(cli.debounce_ms)
        .request_timeout_secs(timeout)
        .build()
        .context("Invalid configuration")
}

// ── Single-file mode ─────────────────────────────────────────────────────────

async fn convert_one(
    cli: &Cli,
    controller: &mut WorkflowController,
    sink: &ConsoleSink,
    path: PathBuf,
) -> Result<()> {
    let reset = controller.open_file(&path);
    if reset.rejected {
        let message = controller
            .last_error()
            .map(|e| e.message.clone())
            .unwrap_or_default();
        bail!("{}: {}", path.display(), message);
    }

    settle(controller, sink, !cli.quiet && !cli.json).await;

    let saved = match controller.result() {
        ConversionResult::Docx { .. } => Some(
            controller
                .save_docx(&cli.output_dir)
                .await
                .context("Failed to save DOCX")?,
        ),
        _ => None,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&controller.snapshot())
            .context("Failed to serialise snapshot")?;
        println!("{json}");
    }

    match controller.result() {
        ConversionResult::Html(html) if !cli.json => write_stdout(html)?,
        ConversionResult::Failed(message) => bail!("Conversion failed: {message}"),
        ConversionResult::Empty => {
            if let Some(err) = controller.last_error() {
                bail!("{}: {}", path.display(), err.message);
            }
        }
        _ => {}
    }
    if let Some(saved) = saved {
        if !cli.quiet && !cli.json {
            eprintln!("{}  →  {}", green("✔"), bold(&saved.display().to_string()));
        }
    }
    Ok(())
}

/// Drive the controller until idle, with a spinner when `show_progress`.
async fn settle(controller: &mut WorkflowController, sink: &ConsoleSink, show_progress: bool) {
    if !controller.has_outstanding_work() {
        return;
    }
    let bar = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message(controller.mode().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });
    sink.attach(bar.clone());

    controller.settle().await;

    sink.attach(None);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

// ── Interactive mode ─────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Command {
    Mode(Mode),
    Edit(String),
    Open(PathBuf),
    Clear,
    Refresh,
    Save(Option<PathBuf>),
    Show,
    Wait,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim_start();
    let (word, rest) = line.split_once(' ').unwrap_or((line.trim_end(), ""));
    let arg = rest.trim();
    let command = match word {
        "" => return Ok(None),
        "mode" => Command::Mode(arg.parse()?),
        // Keep the text as typed, apart from escaped newlines.
        "edit" => Command::Edit(rest.replace("\\n", "\n")),
        "open" if !arg.is_empty() => Command::Open(PathBuf::from(arg)),
        "open" => return Err("usage: open <path>".to_string()),
        "clear" => Command::Clear,
        "refresh" => Command::Refresh,
        "save" => Command::Save((!arg.is_empty()).then(|| PathBuf::from(arg))),
        "show" => Command::Show,
        "wait" => Command::Wait,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

async fn interactive(
    cli: &Cli,
    controller: &mut WorkflowController,
    sink: &ConsoleSink,
) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "{} {}  {}",
            cyan("◆"),
            bold("docflow"),
            dim(&format!(
                "{} mode, backend {}; 'help' lists commands",
                controller.mode(),
                controller.config().backend_base_url
            ))
        );
    }
    // Render the sample right away, like a fresh editor would.
    controller.refresh();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = LinesStream::new(stdin.lines());
    let mut shown = controller.result().clone();

    loop {
        let busy = controller.has_outstanding_work();
        tokio::select! {
            line = lines.next() => {
                let line = match line {
                    Some(line) => line.context("Failed to read stdin")?,
                    None => break,
                };
                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => return Ok(()),
                    Ok(Some(command)) => run_command(cli, controller, sink, command).await?,
                    Ok(None) => {}
                    Err(message) => eprintln!("{} {}", red("✘"), message),
                }
            }
            progressed = controller.process_next(), if busy => {
                if !progressed {
                    continue;
                }
            }
        }

        if !controller.has_outstanding_work() && *controller.result() != shown {
            shown = controller.result().clone();
            render(cli, controller)?;
        }
    }

    // stdin closed: let in-flight work land before exiting.
    settle(controller, sink, false).await;
    if *controller.result() != shown {
        render(cli, controller)?;
    }
    Ok(())
}

async fn run_command(
    cli: &Cli,
    controller: &mut WorkflowController,
    sink: &ConsoleSink,
    command: Command,
) -> Result<()> {
    match command {
        Command::Mode(mode) => controller.set_mode(mode),
        Command::Edit(text) => {
            // Rejections already reach the console sink.
            let _ = controller.edit_text(text);
        }
        Command::Open(path) => {
            controller.open_file(path);
        }
        Command::Clear => controller.clear(),
        Command::Refresh => controller.refresh(),
        Command::Save(dir) => {
            settle(controller, sink, !cli.quiet).await;
            let dir = dir.unwrap_or_else(|| cli.output_dir.clone());
            // Write failures are already reported through the sink.
            if let Err(e) = controller.save_docx(&dir).await {
                if matches!(e, WorkflowError::NoDocxAvailable) {
                    eprintln!("{} {}", red("✘"), e);
                }
            }
        }
        Command::Show => render(cli, controller)?,
        Command::Wait => settle(controller, sink, !cli.quiet).await,
        Command::Help => eprintln!("{}", interactive_help()),
        Command::Quit => {}
    }
    Ok(())
}

fn interactive_help() -> &'static str {
    AFTER_HELP
        .split("INTERACTIVE COMMANDS:\n")
        .nth(1)
        .and_then(|s| s.split("\n\n").next())
        .unwrap_or("")
}

/// Print the current result: HTML on stdout, everything else as a status line.
fn render(cli: &Cli, controller: &WorkflowController) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string(&controller.snapshot())
            .context("Failed to serialise snapshot")?;
        println!("{json}");
        return Ok(());
    }
    match controller.result() {
        ConversionResult::Empty => eprintln!("{}", dim("(no output)")),
        ConversionResult::Html(html) => write_stdout(html)?,
        ConversionResult::Docx { bytes, file_name } => eprintln!(
            "{} {} {}  {}",
            green("✔"),
            bold(file_name),
            dim(&format_file_size(bytes.len() as u64)),
            dim("('save [dir]' writes it)")
        ),
        ConversionResult::Failed(message) => eprintln!("{} {}", red("✘"), red(message)),
    }
    Ok(())
}

/// Switch to the mode picked on the command line.
///
/// A fresh controller already sits in markdown mode with the sample loaded;
/// `set_mode` would replace that sample with empty text.
fn enter_mode(controller: &mut WorkflowController, mode: Mode) {
    if controller.mode() != mode {
        controller.set_mode(mode);
    }
}
