//! Configuration for the kiri pipeline.
//!
//! Every knob lives in [`KiriConfig`], built via [`KiriConfigBuilder`]. The
//! CLI maps its flags (and their `KIRI_*` environment variables) onto the
//! builder; library users set only what they care about and rely on the
//! documented defaults for the rest.

use crate::error::KiriError;
use crate::progress::ProgressCallback;
use crate::store::DEFAULT_NOTES_FILE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default local inference endpoint (Ollama).
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemma3:4b-it-qat";

/// Configuration for extraction, generation and persistence.
///
/// # Example
/// ```rust
/// use kiri::KiriConfig;
///
/// let config = KiriConfig::builder()
///     .model("llama3.2:3b")
///     .request_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "llama3.2:3b");
/// ```
#[derive(Clone)]
pub struct KiriConfig {
    /// Base URL of the local inference server. Default: `http://localhost:11434`.
    pub endpoint: String,

    /// Model identifier sent with every request. Default: `gemma3:4b-it-qat`.
    pub model: String,

    /// Which client talks to the model. Default: [`Backend::Ollama`].
    pub backend: Backend,

    /// Upper bound for one model call, in seconds. Default: 300.
    ///
    /// A 4B model on a laptop CPU can take minutes for a long document; the
    /// bound exists so a wedged server does not block the user forever.
    pub request_timeout_secs: u64,

    /// Nucleus-sampling parameter sent with every request. Default: 0.9.
    pub top_p: f32,

    /// JSON file holding saved notes. Default: `pdf_notes.json`.
    pub notes_path: PathBuf,

    /// Maximum characters of note text used as context in professor mode. Default: 5000.
    pub context_limit: usize,

    /// Split long documents into sentence-aligned chunks of at most this many
    /// characters and send them one after another. Default: `None` (whole text).
    pub chunk_size: Option<usize>,

    /// Number of questions for Q&A and practice sets. Default: `None`
    /// (5 for Q&A, 10 for practice questions).
    pub question_count: Option<usize>,

    /// Style of generated questions. Default: [`QuestionStyle::Mixed`].
    pub question_style: QuestionStyle,

    /// Answer length requested in professor mode. Default: `None` (model decides).
    pub answer_length: Option<AnswerLength>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Receives pipeline events (extraction, requests, completion).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for KiriConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            backend: Backend::default(),
            request_timeout_secs: 300,
            top_p: 0.9,
            notes_path: PathBuf::from(DEFAULT_NOTES_FILE),
            context_limit: 5000,
            chunk_size: None,
            question_count: None,
            question_style: QuestionStyle::default(),
            answer_length: None,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for KiriConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KiriConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("backend", &self.backend)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("top_p", &self.top_p)
            .field("notes_path", &self.notes_path)
            .field("context_limit", &self.context_limit)
            .field("chunk_size", &self.chunk_size)
            .field("question_count", &self.question_count)
            .field("question_style", &self.question_style)
            .field("answer_length", &self.answer_length)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgress>"),
            )
            .finish()
    }
}

impl KiriConfig {
    /// Create a new builder for `KiriConfig`.
    pub fn builder() -> KiriConfigBuilder {
        KiriConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`KiriConfig`].
#[derive(Debug)]
pub struct KiriConfigBuilder {
    config: KiriConfig,
}

impl KiriConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn notes_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.notes_path = path.into();
        self
    }

    pub fn context_limit(mut self, chars: usize) -> Self {
        self.config.context_limit = chars;
        self
    }

    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.config.chunk_size = Some(chars);
        self
    }

    pub fn question_count(mut self, n: usize) -> Self {
        self.config.question_count = Some(n.clamp(1, 50));
        self
    }

    pub fn question_style(mut self, style: QuestionStyle) -> Self {
        self.config.question_style = style;
        self
    }

    pub fn answer_length(mut self, length: AnswerLength) -> Self {
        self.config.answer_length = Some(length);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<KiriConfig, KiriError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(KiriError::InvalidConfig("model must not be empty".into()));
        }
        if matches!(c.backend, Backend::Ollama)
            && !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://"))
        {
            return Err(KiriError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if let Backend::Provider(name) = &c.backend {
            // Providers read their own settings (e.g. OLLAMA_HOST).
            if c.endpoint != DEFAULT_ENDPOINT {
                return Err(KiriError::InvalidConfig(format!(
                    "endpoint '{}' only applies to the Ollama backend; \
                     configure provider '{name}' through its own environment (e.g. OLLAMA_HOST)",
                    c.endpoint
                )));
            }
        }
        if c.context_limit == 0 {
            return Err(KiriError::InvalidConfig(
                "context limit must be ≥ 1 character".into(),
            ));
        }
        if let Some(size) = c.chunk_size {
            if size < 100 {
                return Err(KiriError::InvalidConfig(format!(
                    "chunk size must be ≥ 100 characters, got {size}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which client implementation talks to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    /// Ollama's native `/api/generate` endpoint over plain HTTP. (default)
    #[default]
    Ollama,
    /// A named edgequake-llm provider (e.g. `"lmstudio"`, `"ollama"`).
    Provider(String),
}

/// Style of questions requested for Q&A and practice sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestionStyle {
    MultipleChoice,
    ShortAnswer,
    Discussion,
    /// A mix of all of the above. (default)
    #[default]
    Mixed,
}

impl QuestionStyle {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionStyle::MultipleChoice => "Multiple Choice",
            QuestionStyle::ShortAnswer => "Short Answer",
            QuestionStyle::Discussion => "Discussion",
            QuestionStyle::Mixed => "Mixed",
        }
    }
}

impl FromStr for QuestionStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "multiple_choice" | "mc" => Ok(QuestionStyle::MultipleChoice),
            "short_answer" | "short" => Ok(QuestionStyle::ShortAnswer),
            "discussion" => Ok(QuestionStyle::Discussion),
            "mixed" => Ok(QuestionStyle::Mixed),
            other => Err(format!("unknown question style '{other}'")),
        }
    }
}

/// Answer length requested in professor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerLength {
    /// 1–2 sentences.
    Brief,
    /// 3–5 sentences.
    Medium,
    /// One paragraph.
    Detailed,
    /// Two or more paragraphs.
    Comprehensive,
}

impl AnswerLength {
    /// Directive inserted into the professor prompt.
    pub fn directive(&self) -> &'static str {
        match self {
            AnswerLength::Brief => "Brief answer (1-2 sentences)",
            AnswerLength::Medium => "Medium-length answer (3-5 sentences)",
            AnswerLength::Detailed => "Detailed answer (1 paragraph)",
            AnswerLength::Comprehensive => "Comprehensive answer (2+ paragraphs)",
        }
    }
}

impl FromStr for AnswerLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Ok(AnswerLength::Brief),
            "medium" => Ok(AnswerLength::Medium),
            "detailed" => Ok(AnswerLength::Detailed),
            "comprehensive" => Ok(AnswerLength::Comprehensive),
            other => Err(format!(
                "unknown answer length '{other}' (expected brief, medium, detailed or comprehensive)"
            )),
        }
    }
}
