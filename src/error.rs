//! Error type for the kiri library.
//!
//! Every operation the controller exposes returns `Result<_, KiriError>`.
//! Variants are grouped by the stage that produces them so a front end can
//! decide how to present a failure:
//!
//! * **Extraction** — the PDF could not be opened or had no text layer.
//! * **Input** — a prompt could not be built from what the user supplied.
//! * **Model** — the local inference server was unreachable, slow, or
//!   returned nothing usable.
//! * **Store** — the notes file was unreadable or could not be rewritten.
//! * **Export** — the destination document could not be written.
//!
//! Nothing is retried automatically; the user re-triggers the action.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the kiri library.
#[derive(Debug, Error)]
pub enum KiriError {
    // ── Extraction errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The PDF structure could not be parsed by any backend.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The document opened fine but carries no text layer (e.g. a scan).
    #[error("No text found in PDF '{path}'\nScanned, image-only documents are not supported (no OCR).")]
    NoText { path: PathBuf },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The request handed to the prompt builder was malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── Model errors ──────────────────────────────────────────────────────
    /// The inference endpoint refused the connection or could not be resolved.
    #[error("Local model server not running at {endpoint}\nStart it with: ollama serve\nDetail: {detail}")]
    ModelUnreachable { endpoint: String, detail: String },

    /// No response arrived within the configured bound.
    #[error("Model '{model}' did not answer within {secs}s\nIncrease --timeout or use a smaller model.")]
    ModelTimeout { model: String, secs: u64 },

    /// The server answered but produced no usable text.
    #[error("Model '{model}' returned an empty response")]
    EmptyResponse { model: String },

    /// The server answered with an error status or an undecodable body.
    #[error("Model API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    ModelApi {
        status: Option<u16>,
        message: String,
    },

    /// The configured edgequake-llm provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Store errors ──────────────────────────────────────────────────────
    /// The notes file exists but does not hold a valid note collection.
    #[error("Notes file '{path}' is corrupt: {source}")]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The notes file could not be read or rewritten.
    #[error("Failed to access notes file '{path}': {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No note carries the requested identifier.
    #[error("Note '{id}' not found")]
    NoteNotFound { id: String },

    /// A note with this identifier is already stored.
    #[error("A note with id '{id}' already exists")]
    DuplicateNote { id: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// Could not create or write the exported document.
    #[error("Failed to export '{path}': {detail}")]
    ExportFailed { path: PathBuf, detail: String },

    // ── Controller errors ─────────────────────────────────────────────────
    /// A generation is already in flight; only one may run at a time.
    #[error("A generation is already running; wait for it to finish")]
    Busy,

    /// Save or export was requested before anything was generated.
    #[error("Nothing has been generated yet")]
    NothingToSave,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KiriError {
    /// True for failures that happen while reading the source document.
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            KiriError::FileNotFound { .. }
                | KiriError::PermissionDenied { .. }
                | KiriError::NotAPdf { .. }
                | KiriError::CorruptPdf { .. }
                | KiriError::PasswordRequired { .. }
                | KiriError::WrongPassword { .. }
                | KiriError::NoText { .. }
        )
    }

    /// True for failures reported by the model client.
    pub fn is_model_error(&self) -> bool {
        matches!(
            self,
            KiriError::ModelUnreachable { .. }
                | KiriError::ModelTimeout { .. }
                | KiriError::EmptyResponse { .. }
                | KiriError::ModelApi { .. }
                | KiriError::ProviderNotConfigured { .. }
        )
    }
}
