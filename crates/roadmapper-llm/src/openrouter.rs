//! OpenRouter provider
//!
//! OpenRouter fronts many models behind one OpenAI-compatible endpoint, which
//! makes it the natural home for a model fallback list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use roadmapper_config::Config;
use roadmapper_utils::error::CompletionError;

use crate::http_client::HttpClient;
use crate::types::{Completion, CompletionProvider, CompletionRequest};

/// Default OpenRouter API endpoint
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_REFERER: &str = "https://github.com/roadmapper/roadmapper";

const DEFAULT_TITLE: &str = "roadmapper";

/// Request parameters shared by the HTTP providers
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

impl HttpParams {
    /// `metadata["max_tokens"]` and `metadata["temperature"]` override defaults.
    pub(crate) fn resolve(&self, request: &CompletionRequest) -> Self {
        Self {
            max_tokens: request
                .metadata
                .get("max_tokens")
                .and_then(|v| v.as_u64())
                .map_or(self.max_tokens, |v| v as u32),
            temperature: request
                .metadata
                .get("temperature")
                .and_then(|v| v.as_f64())
                .map_or(self.temperature, |v| v as f32),
        }
    }
}

#[derive(Clone)]
pub(crate) struct OpenRouterProvider {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_params: HttpParams,
}

impl OpenRouterProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_params: HttpParams,
    ) -> Result<Self, CompletionError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_params,
        })
    }

    /// # Errors
    ///
    /// Returns `CompletionError::Misconfiguration` if the API key variable is
    /// unset or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, CompletionError> {
        let section = config.llm.openrouter.clone().unwrap_or_default();
        let api_key_env = section.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);

        let api_key = std::env::var(api_key_env).map_err(|_| {
            CompletionError::Misconfiguration(format!(
                "OpenRouter API key not found in environment variable '{api_key_env}'. \
                 Set it or configure a different api_key_env in [llm.openrouter]."
            ))
        })?;

        let defaults = HttpParams::default();
        let params = HttpParams {
            max_tokens: section.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: section.temperature.unwrap_or(defaults.temperature),
        };

        Self::new(api_key, section.base_url, params)
    }

    fn build_body(&self, request: &CompletionRequest) -> OpenRouterRequest {
        let params = self.default_params.resolve(request);
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        OpenRouterRequest {
            model: request.model.clone(),
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let body = self.build_body(&request);

        debug!(
            provider = "openrouter",
            job_id = %request.job_id,
            model = %body.model,
            max_tokens = body.max_tokens,
            "Invoking OpenRouter"
        );

        let http_request = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", DEFAULT_REFERER)
            .header("X-Title", DEFAULT_TITLE)
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute(http_request, request.timeout, "openrouter")
            .await?;

        let response_body: OpenRouterResponse = response.json().await.map_err(|e| {
            CompletionError::Transport(format!("Failed to parse OpenRouter response: {e}"))
        })?;

        // OpenRouter reports some upstream failures inside a 200 body
        if let Some(error) = response_body.error {
            return Err(classify_embedded_error(error));
        }

        let content = response_body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                CompletionError::Transport(
                    "OpenRouter response missing content in choices[0]".to_string(),
                )
            })?;

        let mut completion = Completion::new(content, "openrouter", body.model);
        if let Some(usage) = response_body.usage {
            completion.tokens_input = Some(usage.prompt_tokens);
            completion.tokens_output = Some(usage.completion_tokens);
        }

        debug!(
            provider = "openrouter",
            tokens_output = ?completion.tokens_output,
            "OpenRouter call completed"
        );

        Ok(completion)
    }
}

fn classify_embedded_error(error: EmbeddedError) -> CompletionError {
    let status = error
        .code
        .and_then(|c| u16::try_from(c).ok())
        .and_then(|c| reqwest::StatusCode::from_u16(c).ok())
        .unwrap_or(reqwest::StatusCode::BAD_GATEWAY);
    crate::http_client::map_status_error(status, &error.message, "openrouter")
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
    error: Option<EmbeddedError>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddedError {
    code: Option<i64>,
    #[serde(default)]
    message: String,
}
