//! # kiri
//!
//! Turn PDF documents into study notes with a locally running language
//! model.
//!
//! ## Why this crate?
//!
//! Lecture slides and papers are long; revising from them means writing
//! summaries and question sets by hand. kiri reads a PDF's text layer, asks
//! a local model (Ollama by default) for a summary, an overview, Q&A pairs
//! or practice questions, and keeps the results in a small JSON notes file.
//! Nothing leaves the machine. Saved notes can be questioned again in
//! "professor mode" and exported to Word or Markdown for editing.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    check the path is a readable PDF
//!  ├─ 2. Extract  text layer via pdfium (pdf-extract fallback, spawn_blocking)
//!  ├─ 3. Prompt   kind-specific instruction + source text
//!  ├─ 4. Model    one request per chunk to the local server
//!  ├─ 5. Polish   strip fences, reasoning blocks, invisible characters
//!  └─ 6. Notes    save to pdf_notes.json, export to .docx / .md
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kiri::{Controller, GenerationRequest, KiriConfig, NoteKind};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Talks to Ollama on http://localhost:11434 with gemma3:4b-it-qat.
//!     let controller = Controller::open(KiriConfig::default())?;
//!     let generation = controller
//!         .generate(Path::new("lecture.pdf"), &GenerationRequest::new(NoteKind::Summary))
//!         .await?;
//!     println!("{}", generation.body);
//!
//!     let note = controller.save_current()?;
//!     controller.export_note(&note.id, Path::new("lecture-notes.docx"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `kiri` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! kiri = { version = "0.3", default-features = false }
//! ```
//!
//! ## PDF backend
//!
//! pdfium is loaded at runtime from `PDFIUM_LIB_PATH` or the system library
//! path. Without it, extraction falls back to the pure-Rust `pdf-extract`
//! crate, which handles most text-based PDFs.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod library;
pub mod note;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnswerLength, Backend, KiriConfig, KiriConfigBuilder, QuestionStyle};
pub use controller::{Controller, Generation, GenerationRequest, GenerationSlot};
pub use error::KiriError;
pub use export::{export, export_with, ExportFormat, ExportMeta};
pub use library::{format_file_size, scan_pdfs, PdfEntry};
pub use note::{Note, NoteKind};
pub use pipeline::extract::{PdfExtractor, TextExtractor};
pub use pipeline::llm::{ModelClient, OllamaClient, ProviderClient};
pub use progress::{GenerationProgress, NoopProgress, ProgressCallback};
pub use prompts::{Prompt, PromptOptions};
pub use store::NoteStore;
