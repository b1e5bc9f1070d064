//! Model interaction: send one prompt, get one completion.
//!
//! This module is intentionally thin. Prompt wording lives in
//! [`crate::prompts`] and output cleanup in [`super::postprocess`], so the
//! clients here only deal with transport and error mapping.
//!
//! ## Failure handling
//!
//! Nothing is retried. A local model that timed out once will almost
//! certainly time out again, and the user is better served by a clear
//! message ("local model server not running", "did not answer within 300s")
//! than by a spinner that keeps going. Every failure maps onto one of the
//! model variants of [`KiriError`].

use crate::config::{Backend, KiriConfig};
use crate::error::KiriError;
use crate::pipeline::postprocess::clean_completion;
use crate::prompts::Prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Upper bound on generated tokens for provider backends.
const PROVIDER_MAX_TOKENS: usize = 4096;

/// Sends a prompt to a language model and returns the cleaned completion.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// The returned text is already cleaned and never empty; a blank answer
    /// is reported as [`KiriError::EmptyResponse`].
    async fn generate(&self, prompt: &Prompt) -> Result<String, KiriError>;

    /// Model identifier, used in note metadata and exports.
    fn model(&self) -> &str;
}

/// Build the client selected by `config.backend`.
pub fn client_from_config(config: &KiriConfig) -> Result<Arc<dyn ModelClient>, KiriError> {
    match &config.backend {
        Backend::Ollama => Ok(Arc::new(OllamaClient::from_config(config)?)),
        Backend::Provider(name) => Ok(Arc::new(ProviderClient::new(
            name,
            &config.model,
            config.request_timeout_secs,
        )?)),
    }
}

// ── Ollama ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for Ollama's native `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    top_p: f32,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a client for `endpoint` (e.g. `http://localhost:11434`).
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        top_p: f32,
    ) -> Result<Self, KiriError> {
        let timeout_secs = timeout_secs.max(1);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| KiriError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            top_p,
            timeout_secs,
        })
    }

    pub fn from_config(config: &KiriConfig) -> Result<Self, KiriError> {
        Self::new(
            &config.endpoint,
            &config.model,
            config.request_timeout_secs,
            config.top_p,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_transport_error(&self, e: reqwest::Error) -> KiriError {
        if e.is_timeout() {
            KiriError::ModelTimeout {
                model: self.model.clone(),
                secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            KiriError::ModelUnreachable {
                endpoint: self.endpoint.clone(),
                detail: e.to_string(),
            }
        } else {
            KiriError::ModelApi {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, KiriError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt.text,
            stream: false,
            options: SamplingOptions {
                temperature: prompt.temperature,
                top_p: self.top_p,
            },
        };

        let start = Instant::now();
        debug!(
            "POST {} model={} kind={} prompt_chars={}",
            url,
            self.model,
            prompt.kind,
            prompt.text.chars().count()
        );

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(KiriError::ModelApi {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: GenerateResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_transport_error(e)
            } else {
                KiriError::ModelApi {
                    status: Some(status.as_u16()),
                    message: format!("undecodable response body: {e}"),
                }
            }
        })?;

        let completion = clean_completion(&parsed.response);
        debug!(
            "Completion: {} chars in {:?}",
            completion.chars().count(),
            start.elapsed()
        );

        if completion.is_empty() {
            return Err(KiriError::EmptyResponse {
                model: self.model.clone(),
            });
        }
        Ok(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ── edgequake-llm providers ──────────────────────────────────────────────────

/// Client backed by any `edgequake-llm` provider (`ollama`, `lmstudio`, …).
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    model: String,
    timeout_secs: u64,
}

impl ProviderClient {
    /// Instantiate the named provider via [`ProviderFactory::create_llm_provider`].
    pub fn new(name: &str, model: &str, timeout_secs: u64) -> Result<Self, KiriError> {
        let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            KiriError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::with_provider(provider, model, timeout_secs))
    }

    /// Wrap an already configured provider.
    pub fn with_provider(
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout_secs: timeout_secs.max(1),
        }
    }

    fn map_provider_error(&self, e: LlmError) -> KiriError {
        match e {
            LlmError::NetworkError(detail) => KiriError::ModelUnreachable {
                endpoint: format!("{} provider", self.provider.name()),
                detail,
            },
            LlmError::Timeout => KiriError::ModelTimeout {
                model: self.model.clone(),
                secs: self.timeout_secs,
            },
            other => KiriError::ModelApi {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, KiriError> {
        // The whole prompt goes in one user turn, as with /api/generate.
        let messages = vec![ChatMessage::user(prompt.text.as_str())];
        let options = CompletionOptions {
            temperature: Some(prompt.temperature),
            max_tokens: Some(PROVIDER_MAX_TOKENS),
            ..Default::default()
        };

        let call = self.provider.chat(&messages, Some(&options));
        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| KiriError::ModelTimeout {
                model: self.model.clone(),
                secs: self.timeout_secs,
            })?
            .map_err(|e| self.map_provider_error(e))?;

        let completion = clean_completion(&response.content);
        if completion.is_empty() {
            return Err(KiriError::EmptyResponse {
                model: self.model.clone(),
            });
        }
        Ok(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteKind;

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            model: "gemma3:4b-it-qat",
            prompt: "hi",
            stream: false,
            options: SamplingOptions {
                temperature: 0.4,
                top_p: 0.9,
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "gemma3:4b-it-qat");
        assert_eq!(v["stream"], false);
        assert!(v["options"]["top_p"].as_f64().unwrap() > 0.89);
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let c = OllamaClient::new("http://localhost:11434/", "m", 5, 0.9).unwrap();
        assert_eq!(c.endpoint(), "http://localhost:11434");
        assert_eq!(c.model(), "m");
    }

    #[tokio::test]
    async fn provider_completion_is_cleaned() {
        let mock = Arc::new(edgequake_llm::MockProvider::new());
        mock.add_response("```\nQ: What is ATP?\nA: Energy.\n```").await;
        let c = ProviderClient::with_provider(mock, "mock-model", 5);
        let prompt = crate::prompts::build("text", NoteKind::Qna, None).unwrap();
        assert_eq!(
            c.generate(&prompt).await.unwrap(),
            "Q: What is ATP?\nA: Energy."
        );
    }

    #[test]
    fn provider_errors_map_to_model_errors() {
        let c = ProviderClient::with_provider(
            Arc::new(edgequake_llm::MockProvider::new()),
            "gemma3:4b-it-qat",
            7,
        );

        let refused = c.map_provider_error(LlmError::NetworkError(
            "Connection failed: error sending request for url (http://127.0.0.1:1/api/chat)".into(),
        ));
        match refused {
            KiriError::ModelUnreachable { endpoint, detail } => {
                assert!(endpoint.contains("mock"), "endpoint: {endpoint}");
                assert!(detail.contains("127.0.0.1:1"));
            }
            other => panic!("expected ModelUnreachable, got {other:?}"),
        }

        assert!(matches!(
            c.map_provider_error(LlmError::Timeout),
            KiriError::ModelTimeout { secs: 7, .. }
        ));
        assert!(matches!(
            c.map_provider_error(LlmError::ModelNotFound("x".into())),
            KiriError::ModelApi { status: None, .. }
        ));
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Port 1 is never served locally.
        let c = OllamaClient::new("http://127.0.0.1:1", "m", 5, 0.9).unwrap();
        let prompt = crate::prompts::build("text", NoteKind::Summary, None).unwrap();
        let err = c.generate(&prompt).await.unwrap_err();
        assert!(matches!(err, KiriError::ModelUnreachable { .. }), "got {err:?}");
    }
}
