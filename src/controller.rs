//! The application controller: one method per user action.
//!
//! The controller owns every piece of mutable state (the note store and the
//! most recent generation) and wires the pipeline stages together:
//!
//! ```text
//! generate(pdf) ──▶ extract ──▶ prompt ──▶ model ──▶ current generation
//!                                                        │
//!                      save_current ◀────────────────────┤
//!                      export_current ◀──────────────────┘
//! ```
//!
//! ## Single-slot execution
//!
//! A local model serves one request at a time, so at most one generation
//! may be in flight. [`GenerationSlot`] holds a one-permit semaphore; a
//! second call while the permit is taken fails immediately with
//! [`KiriError::Busy`] instead of queueing behind a long model call.
//!
//! Store and current generation sit behind a `parking_lot::Mutex` that is
//! never held across an `.await`, so read-only actions (`notes`, `note`)
//! remain available while a generation runs.

use crate::config::{AnswerLength, KiriConfig, QuestionStyle};
use crate::error::KiriError;
use crate::export::{self, ExportMeta};
use crate::note::{Note, NoteKind};
use crate::pipeline::chunk::{chunk_text, SECTION_BREAK};
use crate::pipeline::extract::{PdfExtractor, TextExtractor};
use crate::pipeline::input::display_name;
use crate::pipeline::llm::{client_from_config, ModelClient};
use crate::pipeline::topic::extract_topic;
use crate::progress::ProgressCallback;
use crate::prompts::{self, PromptOptions};
use crate::store::NoteStore;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

// ── Generation slot ──────────────────────────────────────────────────────────

/// Guard allowing at most one generation at a time.
#[derive(Debug, Clone)]
pub struct GenerationSlot {
    permits: Arc<Semaphore>,
}

impl Default for GenerationSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationSlot {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the slot, or fail with [`KiriError::Busy`] when it is taken.
    /// The slot is released when the returned permit is dropped.
    pub fn try_acquire(&self) -> Result<OwnedSemaphorePermit, KiriError> {
        Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|_| KiriError::Busy)
    }

    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

// ── Requests and results ─────────────────────────────────────────────────────

/// What to generate from a document.
///
/// Unset fields fall back to the controller's [`KiriConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: NoteKind,
    pub question_count: Option<usize>,
    pub question_style: Option<QuestionStyle>,
    pub answer_length: Option<AnswerLength>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self::new(NoteKind::Summary)
    }
}

impl GenerationRequest {
    pub fn new(kind: NoteKind) -> Self {
        Self {
            kind,
            question_count: None,
            question_style: None,
            answer_length: None,
        }
    }

    pub fn question_count(mut self, n: usize) -> Self {
        self.question_count = Some(n.clamp(1, 50));
        self
    }

    pub fn question_style(mut self, style: QuestionStyle) -> Self {
        self.question_style = Some(style);
        self
    }

    pub fn answer_length(mut self, length: AnswerLength) -> Self {
        self.answer_length = Some(length);
        self
    }
}

/// The outcome of one successful generation, not yet saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub title: String,
    pub kind: NoteKind,
    pub body: String,
    /// Topic guessed from the source text.
    pub topic: Option<String>,
    pub source: Option<PathBuf>,
    /// Question asked in professor mode.
    pub question: Option<String>,
    pub model: String,
    /// Model requests made (more than one when chunking).
    pub requests: usize,
    pub duration_ms: u64,
}

impl Generation {
    /// The note this generation becomes when saved under `id`.
    pub fn to_note(&self, id: impl Into<String>) -> Note {
        let mut note = Note::new(id, self.title.clone(), self.kind, self.body.clone());
        note.source = self.source.clone();
        note.question = self.question.clone();
        note.model = Some(self.model.clone());
        note
    }

    /// Heading and metadata used when exporting this generation.
    pub fn export_meta(&self) -> ExportMeta {
        ExportMeta {
            title: self.title.clone(),
            topic: self.topic.clone(),
            source: self.source.as_deref().map(display_name),
            model: Some(self.model.clone()),
            kind: Some(self.kind),
        }
    }
}

/// Input to one model run, after extraction.
struct Job<'a> {
    title: String,
    text: &'a str,
    kind: NoteKind,
    question: Option<String>,
    source: Option<PathBuf>,
    topic: Option<String>,
}

struct State {
    store: NoteStore,
    current: Option<Generation>,
}

// ── Controller ───────────────────────────────────────────────────────────────

/// Orchestrates extraction, generation, persistence and export.
pub struct Controller {
    config: KiriConfig,
    extractor: Arc<dyn TextExtractor>,
    client: Arc<dyn ModelClient>,
    slot: GenerationSlot,
    state: Mutex<State>,
    startup_warning: Option<KiriError>,
}

impl Controller {
    /// Build a controller with the default extractor and the client chosen
    /// by `config.backend`, loading notes from `config.notes_path`.
    ///
    /// A corrupt notes file does not prevent startup: the controller starts
    /// with an empty store and reports the problem via
    /// [`Controller::startup_warning`].
    pub fn open(config: KiriConfig) -> Result<Self, KiriError> {
        let extractor = Arc::new(PdfExtractor::new(config.password.clone()));
        let client = client_from_config(&config)?;
        let (store, warning) = NoteStore::open_or_empty(&config.notes_path);
        let mut controller = Self::with_components(config, extractor, client, store);
        controller.startup_warning = warning;
        Ok(controller)
    }

    /// Build a controller from explicit parts.
    pub fn with_components(
        config: KiriConfig,
        extractor: Arc<dyn TextExtractor>,
        client: Arc<dyn ModelClient>,
        store: NoteStore,
    ) -> Self {
        info!(
            "Controller ready: model={} notes={} ({} stored)",
            client.model(),
            store.path().display(),
            store.len()
        );
        Self {
            config,
            extractor,
            client,
            slot: GenerationSlot::new(),
            state: Mutex::new(State {
                store,
                current: None,
            }),
            startup_warning: None,
        }
    }

    pub fn config(&self) -> &KiriConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// The error hit while loading the notes file at startup, if any.
    pub fn startup_warning(&self) -> Option<&KiriError> {
        self.startup_warning.as_ref()
    }

    /// True while a generation holds the slot.
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// The most recent successful generation.
    pub fn current(&self) -> Option<Generation> {
        self.state.lock().current.clone()
    }

    // ── Generation ───────────────────────────────────────────────────────

    /// Extract `pdf` and generate the requested kind of note from it.
    ///
    /// On success the result becomes the current generation. Nothing is
    /// saved; call [`Controller::save_current`] for that.
    pub async fn generate(
        &self,
        pdf: &Path,
        request: &GenerationRequest,
    ) -> Result<Generation, KiriError> {
        let _permit = self.slot.try_acquire()?;
        let start = Instant::now();
        info!("Generating {} from {}", request.kind, pdf.display());

        let result = self.extract_and_run(pdf, request, start).await;
        self.finish(result)
    }

    async fn extract_and_run(
        &self,
        pdf: &Path,
        request: &GenerationRequest,
        start: Instant,
    ) -> Result<Generation, KiriError> {
        if let Some(cb) = self.progress() {
            cb.on_extract_start(pdf);
        }
        let text = self.extractor.extract(pdf).await?;
        if let Some(cb) = self.progress() {
            cb.on_extract_complete(pdf, text.chars().count());
        }

        let job = Job {
            title: display_name(pdf),
            text: &text,
            kind: request.kind,
            question: None,
            source: Some(pdf.to_path_buf()),
            topic: Some(extract_topic(&text)),
        };
        self.run(job, request, start).await
    }

    /// Generate from text that is already available.
    pub async fn generate_from_text(
        &self,
        title: &str,
        text: &str,
        request: &GenerationRequest,
    ) -> Result<Generation, KiriError> {
        let _permit = self.slot.try_acquire()?;
        let start = Instant::now();
        info!("Generating {} from text '{}'", request.kind, title);

        let job = Job {
            title: title.to_string(),
            text,
            kind: request.kind,
            question: None,
            source: None,
            topic: Some(extract_topic(text)),
        };
        let result = self.run(job, request, start).await;
        self.finish(result)
    }

    /// Professor mode: answer `question` using the body of note `note_id`
    /// as context.
    pub async fn ask(
        &self,
        note_id: &str,
        question: &str,
        length: Option<AnswerLength>,
    ) -> Result<Generation, KiriError> {
        let _permit = self.slot.try_acquire()?;
        let start = Instant::now();

        let result = self.answer(note_id, question, length, start).await;
        self.finish(result)
    }

    async fn answer(
        &self,
        note_id: &str,
        question: &str,
        length: Option<AnswerLength>,
        start: Instant,
    ) -> Result<Generation, KiriError> {
        let note = self.note(note_id)?;
        info!("Answering question about '{}'", note.id);

        let mut request = GenerationRequest::new(NoteKind::Answer);
        request.answer_length = length;

        let job = Job {
            title: note.title.clone(),
            text: &note.body,
            kind: NoteKind::Answer,
            question: Some(question.trim().to_string()),
            source: note.source.clone(),
            topic: None,
        };
        self.run(job, &request, start).await
    }

    /// Send the job to the model, chunk by chunk when configured.
    async fn run(
        &self,
        job: Job<'_>,
        request: &GenerationRequest,
        start: Instant,
    ) -> Result<Generation, KiriError> {
        let options = self.prompt_options(request);

        let chunks = match self.config.chunk_size {
            Some(size) if job.kind != NoteKind::Answer && job.text.chars().count() > size => {
                chunk_text(job.text, size)
            }
            _ => vec![job.text.to_string()],
        };
        let total = chunks.len();
        debug!("{} request(s) for {}", total, job.title);

        let mut parts = Vec::with_capacity(total);
        for (i, chunk) in chunks.iter().enumerate() {
            let prompt = prompts::build_with(chunk, job.kind, job.question.as_deref(), &options)?;
            if let Some(cb) = self.progress() {
                cb.on_request_start(i + 1, total);
            }
            let completion = self.client.generate(&prompt).await?;
            if let Some(cb) = self.progress() {
                cb.on_request_complete(i + 1, total, completion.len());
            }
            parts.push(completion);
        }

        let separator = if job.kind == NoteKind::Summary {
            SECTION_BREAK
        } else {
            "\n\n"
        };

        Ok(Generation {
            title: job.title,
            kind: job.kind,
            body: parts.join(separator),
            topic: job.topic,
            source: job.source,
            question: job.question,
            model: self.client.model().to_string(),
            requests: total,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn finish(&self, result: Result<Generation, KiriError>) -> Result<Generation, KiriError> {
        match result {
            Ok(generation) => {
                info!(
                    "Generated {} ({} chars, {} request(s)) in {}ms",
                    generation.kind,
                    generation.body.len(),
                    generation.requests,
                    generation.duration_ms
                );
                if let Some(cb) = self.progress() {
                    cb.on_generation_complete(generation.body.len(), generation.duration_ms);
                }
                self.state.lock().current = Some(generation.clone());
                Ok(generation)
            }
            Err(e) => {
                let stage = if e.is_extraction_error() {
                    "extraction"
                } else if e.is_model_error() {
                    "model"
                } else {
                    "generation"
                };
                warn!("Generation failed at {} stage: {}", stage, e);
                if let Some(cb) = self.progress() {
                    cb.on_generation_error(&e.to_string());
                }
                Err(e)
            }
        }
    }

    fn prompt_options(&self, request: &GenerationRequest) -> PromptOptions {
        PromptOptions {
            question_count: request.question_count.or(self.config.question_count),
            question_style: request
                .question_style
                .unwrap_or(self.config.question_style),
            answer_length: request.answer_length.or(self.config.answer_length),
            context_limit: self.config.context_limit,
        }
    }

    fn progress(&self) -> Option<&ProgressCallback> {
        self.config.progress_callback.as_ref()
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Save the current generation as a new note.
    pub fn save_current(&self) -> Result<Note, KiriError> {
        let generation = self.current().ok_or(KiriError::NothingToSave)?;
        self.save(&generation)
    }

    /// Save `generation` as a new note and rewrite the notes file.
    ///
    /// The identifier is derived from the title; a title that is already
    /// taken gets a numeric suffix. If the file cannot be written the note
    /// is removed again, leaving memory and disk in agreement.
    pub fn save(&self, generation: &Generation) -> Result<Note, KiriError> {
        let mut state = self.state.lock();
        let id = state.store.unique_id(&generation.title);
        let note = generation.to_note(id.clone());

        state.store.add(note.clone())?;
        if let Err(e) = state.store.save() {
            warn!("Rolling back note '{}': {}", id, e);
            let _ = state.store.delete(&id);
            return Err(e);
        }

        info!("Saved note '{}'", id);
        Ok(note)
    }

    /// Snapshot of all stored notes, in insertion order.
    pub fn notes(&self) -> Vec<Note> {
        self.state.lock().store.list().to_vec()
    }

    pub fn note(&self, id: &str) -> Result<Note, KiriError> {
        self.state.lock().store.get(id).cloned()
    }

    /// Delete a note and rewrite the notes file.
    pub fn delete_note(&self, id: &str) -> Result<Note, KiriError> {
        let mut state = self.state.lock();
        let index = state
            .store
            .position(id)
            .ok_or_else(|| KiriError::NoteNotFound { id: id.to_string() })?;
        let removed = state.store.delete(id)?;

        if let Err(e) = state.store.save() {
            warn!("Restoring note '{}': {}", id, e);
            state.store.restore(index, removed);
            return Err(e);
        }

        info!("Deleted note '{}'", id);
        Ok(removed)
    }

    // ── Export ───────────────────────────────────────────────────────────

    /// Export the current generation to `dest`. Returns the path written.
    pub fn export_current(&self, dest: &Path) -> Result<PathBuf, KiriError> {
        let generation = self.current().ok_or(KiriError::NothingToSave)?;
        export::export_with(&generation.export_meta(), &generation.body, dest)
    }

    /// Export a stored note to `dest`. Returns the path written.
    pub fn export_note(&self, id: &str, dest: &Path) -> Result<PathBuf, KiriError> {
        let note = self.note(id)?;
        let meta = ExportMeta {
            title: note.title.clone(),
            topic: Some(extract_topic(&note.body)),
            source: note.source.as_deref().map(display_name),
            model: note.model.clone(),
            kind: Some(note.kind),
        };
        export::export_with(&meta, &note.body, dest)
    }
}
