//! CLI binary for kiri.
//!
//! A thin shim over the library crate that maps CLI flags to `KiriConfig`,
//! runs one controller action per invocation and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use kiri::{
    export_with, format_file_size, scan_pdfs, AnswerLength, Backend, Controller, Generation,
    GenerationProgress, GenerationRequest, KiriConfig, Note, NoteKind, ProgressCallback,
    QuestionStyle,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while the model works, plus one log line
/// per finished step.
struct CliProgress {
    bar: ProgressBar,
    request_started: parking_lot::Mutex<Option<Instant>>,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            request_started: parking_lot::Mutex::new(None),
        })
    }
}

impl GenerationProgress for CliProgress {
    fn on_extract_start(&self, path: &Path) {
        self.bar.set_prefix("Reading");
        self.bar.set_message(path.display().to_string());
    }

    fn on_extract_complete(&self, path: &Path, chars: usize) {
        self.bar.println(format!(
            "  {} Extracted {}  {}",
            green("✓"),
            path.display(),
            dim(&format!("{chars} chars")),
        ));
    }

    fn on_request_start(&self, chunk: usize, total: usize) {
        *self.request_started.lock() = Some(Instant::now());
        self.bar.set_prefix("Thinking");
        if total > 1 {
            self.bar.set_message(format!("part {chunk}/{total}"));
        } else {
            self.bar.set_message("waiting for the local model…");
        }
    }

    fn on_request_complete(&self, chunk: usize, total: usize, completion_len: usize) {
        let secs = self
            .request_started
            .lock()
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.bar.println(format!(
            "  {} Part {:>2}/{:<2}  {:<12}  {}",
            green("✓"),
            chunk,
            total,
            dim(&format!("{completion_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_generation_complete(&self, body_len: usize, duration_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Generated {} chars in {:.1}s",
            green("✔"),
            bold(&body_len.to_string()),
            duration_ms as f64 / 1000.0
        );
    }

    fn on_generation_error(&self, error: &str) {
        self.bar.finish_and_clear();
        let first_line = error.lines().next().unwrap_or(error);
        eprintln!("{} {}", red("✘"), red(first_line));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a lecture and keep the result
  kiri generate lecture.pdf --save

  # Ten practice questions, exported to Word
  kiri generate lecture.pdf --kind practice --questions 10 --export questions.docx

  # Ask a saved note a question (professor mode)
  kiri notes list
  kiri ask lecture-pdf "Why does the membrane potential reverse?" --length detailed

  # Export a saved note to Markdown
  kiri notes export lecture-pdf notes.md

  # List PDFs in a folder
  kiri browse ~/Documents/courses

KINDS:
  summary      Detailed structured summary (default)
  overview     Brief overview of the key ideas
  qna          Question and answer pairs
  practice     Numbered practice questions

ENVIRONMENT VARIABLES:
  KIRI_MODEL        Model identifier (default gemma3:4b-it-qat)
  KIRI_ENDPOINT     Ollama server URL (default http://localhost:11434; not used with KIRI_PROVIDER)
  KIRI_PROVIDER     Use an edgequake-llm provider instead of Ollama's /api/generate
  KIRI_NOTES        Notes file (default pdf_notes.json)
  KIRI_TIMEOUT      Per-request timeout in seconds (default 300)
  PDFIUM_LIB_PATH   pdfium library file or directory (optional)

SETUP:
  1. Install Ollama and pull the model:  ollama pull gemma3:4b-it-qat
  2. Start the server:                   ollama serve
  3. Generate notes:                     kiri generate document.pdf
"#;

/// Turn PDF documents into study notes with a local language model.
#[derive(Parser, Debug)]
#[command(
    name = "kiri",
    version,
    about = "Turn PDF documents into study notes with a local language model",
    long_about = "Extract the text of a PDF, ask a locally running model (Ollama by default) \
for a summary, overview, Q&A or practice questions, keep the results as notes and export \
them to Word or Markdown.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Model identifier.
    #[arg(long, global = true, env = "KIRI_MODEL", default_value = kiri::config::DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Ollama server. Not used with --provider; providers
    /// read their own environment (e.g. OLLAMA_HOST).
    #[arg(long, global = true, env = "KIRI_ENDPOINT", default_value = kiri::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Talk to the model through an edgequake-llm provider (e.g. ollama, lmstudio).
    /// Cannot be combined with a custom --endpoint.
    #[arg(long, global = true, env = "KIRI_PROVIDER")]
    provider: Option<String>,

    /// Notes file.
    #[arg(long, global = true, env = "KIRI_NOTES", default_value = kiri::store::DEFAULT_NOTES_FILE)]
    notes: PathBuf,

    /// Per-request model timeout in seconds.
    #[arg(long, global = true, env = "KIRI_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Split long documents into chunks of at most this many characters.
    #[arg(long, global = true, env = "KIRI_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// Characters of note text used as context in professor mode.
    #[arg(long, global = true, env = "KIRI_CONTEXT_LIMIT", default_value_t = 5000)]
    context_limit: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "KIRI_PASSWORD")]
    password: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "KIRI_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "KIRI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "KIRI_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate notes from a PDF.
    Generate {
        /// PDF file to read.
        pdf: PathBuf,

        /// summary, overview, qna or practice.
        #[arg(short, long, default_value = "summary")]
        kind: NoteKind,

        /// Number of questions for qna / practice (1–50).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
        questions: Option<u32>,

        /// Question style: multiple-choice, short-answer, discussion, mixed.
        #[arg(long)]
        style: Option<QuestionStyle>,

        /// Title for the saved note (default: the file name).
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Ask a question about a saved note (professor mode).
    Ask {
        /// Identifier of the note to use as context.
        note_id: String,

        /// The question.
        question: String,

        /// Answer length: brief, medium, detailed, comprehensive.
        #[arg(long)]
        length: Option<AnswerLength>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage saved notes.
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },

    /// List PDF files under a directory.
    Browse {
        /// Directory to scan (recursively).
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Save the result to the notes file.
    #[arg(long)]
    save: bool,

    /// Export the result to a .docx or .md file.
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum NotesAction {
    /// List saved notes.
    List,
    /// Print one note.
    Show { id: String },
    /// Delete one note.
    Delete { id: String },
    /// Export one note to a .docx or .md file.
    Export { id: String, dest: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; INFO logs would
    // tear through it.
    let show_progress = !g.quiet && !g.no_progress && !g.json;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // `browse` needs no model or notes file.
    if let Command::Browse { dir } = &cli.command {
        return browse(dir, g.json);
    }

    let needs_progress = show_progress
        && matches!(cli.command, Command::Generate { .. } | Command::Ask { .. });
    let progress: Option<ProgressCallback> = if needs_progress {
        Some(CliProgress::new() as Arc<dyn GenerationProgress>)
    } else {
        None
    };

    let config = build_config(g, progress)?;
    let controller = Controller::open(config).context("Failed to start")?;
    if let Some(warning) = controller.startup_warning() {
        eprintln!("{} {}", yellow("⚠"), yellow(&warning.to_string()));
    }

    match cli.command {
        Command::Generate {
            pdf,
            kind,
            questions,
            style,
            title,
            output,
        } => {
            if kind == NoteKind::Answer {
                anyhow::bail!("Use `kiri ask <note-id> <question>` for professor-mode answers");
            }
            let mut request = GenerationRequest::new(kind);
            if let Some(n) = questions {
                request = request.question_count(n as usize);
            }
            if let Some(s) = style {
                request = request.question_style(s);
            }

            let mut generation = controller
                .generate(&pdf, &request)
                .await
                .with_context(|| format!("Failed to generate {} from {}", kind, pdf.display()))?;
            if let Some(t) = title {
                generation.title = t;
            }
            finish_generation(&controller, &generation, &output, g)?;
        }

        Command::Ask {
            note_id,
            question,
            length,
            output,
        } => {
            let generation = controller
                .ask(&note_id, &question, length)
                .await
                .with_context(|| format!("Failed to answer question about '{note_id}'"))?;
            finish_generation(&controller, &generation, &output, g)?;
        }

        Command::Notes { action } => notes(&controller, action, g)?,

        Command::Browse { .. } => {}
    }

    Ok(())
}

/// Print a generation, then save and export it as requested.
fn finish_generation(
    controller: &Controller,
    generation: &Generation,
    output: &OutputArgs,
    g: &GlobalArgs,
) -> Result<()> {
    if g.json {
        let json = serde_json::to_string_pretty(generation).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", generation.body).context("Failed to write to stdout")?;
    }

    if output.save {
        let note = controller.save(generation).context("Failed to save note")?;
        if !g.quiet {
            eprintln!(
                "{} Saved as {}  {}",
                green("✔"),
                bold(&note.id),
                dim(&controller.config().notes_path.display().to_string())
            );
        }
    }

    if let Some(dest) = &output.export {
        let path = export_with(&generation.export_meta(), &generation.body, dest)
            .context("Export failed")?;
        if !g.quiet {
            eprintln!("{} Exported  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    }
    Ok(())
}

fn notes(controller: &Controller, action: NotesAction, g: &GlobalArgs) -> Result<()> {
    match action {
        NotesAction::List => {
            let notes = controller.notes();
            if g.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&notes).context("Failed to serialise notes")?
                );
            } else if notes.is_empty() {
                eprintln!("{}", dim("No saved notes."));
            } else {
                for note in &notes {
                    print_note_line(note);
                }
            }
        }
        NotesAction::Show { id } => {
            let note = controller.note(&id)?;
            if g.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&note).context("Failed to serialise note")?
                );
            } else {
                println!("{}", bold(&note.title));
                println!(
                    "{}",
                    dim(&format!(
                        "{} · {}",
                        note.kind.label(),
                        note.created.format("%Y-%m-%d %H:%M")
                    ))
                );
                if let Some(q) = &note.question {
                    println!("{} {}", cyan("Q:"), q);
                }
                println!();
                println!("{}", note.body);
            }
        }
        NotesAction::Delete { id } => {
            let removed = controller.delete_note(&id)?;
            if !g.quiet {
                eprintln!("{} Deleted {}", green("✔"), bold(&removed.id));
            }
        }
        NotesAction::Export { id, dest } => {
            let path = controller
                .export_note(&id, &dest)
                .with_context(|| format!("Failed to export note '{id}'"))?;
            if !g.quiet {
                eprintln!("{} Exported  →  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
    }
    Ok(())
}

fn print_note_line(note: &Note) {
    println!(
        "{:<28} {:<20} {}  {}",
        bold(&note.id),
        note.kind.label(),
        note.title,
        dim(&note.created.format("%Y-%m-%d %H:%M").to_string())
    );
}

fn browse(dir: &Path, json: bool) -> Result<()> {
    let entries = scan_pdfs(dir).with_context(|| format!("Failed to scan {}", dir.display()))?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialise listing")?
        );
        return Ok(());
    }
    if entries.is_empty() {
        eprintln!("{}", dim("No PDF files found."));
    }
    for entry in &entries {
        println!(
            "{:>10}  {}",
            dim(&format_file_size(entry.size)),
            entry.path.display()
        );
    }
    Ok(())
}

/// Map CLI args to `KiriConfig`.
fn build_config(g: &GlobalArgs, progress: Option<ProgressCallback>) -> Result<KiriConfig> {
    let mut builder = KiriConfig::builder()
        .model(g.model.clone())
        .endpoint(g.endpoint.clone())
        .notes_path(g.notes.clone())
        .request_timeout_secs(g.timeout)
        .context_limit(g.context_limit);

    if let Some(name) = &g.provider {
        builder = builder.backend(Backend::Provider(name.clone()));
    }
    if let Some(size) = g.chunk_size {
        builder = builder.chunk_size(size);
    }
    if let Some(pwd) = &g.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
