//! Pipeline stages for PDF-to-notes generation.
//!
//! Each submodule implements exactly one step so it can be tested on its
//! own and swapped (e.g. a different PDF backend) without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunk ──▶ llm ──▶ postprocess
//! (path)    (text)      (opt.)    (model)  (cleanup)
//! ```
//!
//! 1. [`input`]   — check the user-supplied path is a readable PDF
//! 2. [`extract`] — read the text layer; runs in `spawn_blocking` because
//!    the PDF backends are blocking
//! 3. [`chunk`]   — optional sentence-aligned split for small context windows
//! 4. [`llm`]     — one request per chunk; the only stage with network I/O
//! 5. [`postprocess`] — deterministic cleanup of model quirks
//!
//! [`topic`] guesses a document title from the extracted text.

pub mod chunk;
pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod topic;
