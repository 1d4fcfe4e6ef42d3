//! Anthropic Messages API provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use roadmapper_config::Config;
use roadmapper_utils::error::CompletionError;

use crate::http_client::HttpClient;
use crate::openrouter::HttpParams;
use crate::types::{Completion, CompletionProvider, CompletionRequest};

/// Default Anthropic API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Clone)]
pub(crate) struct AnthropicProvider {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_params: HttpParams,
}

impl AnthropicProvider {
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
        let section = config.llm.anthropic.clone().unwrap_or_default();
        let api_key_env = section.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);

        let api_key = std::env::var(api_key_env).map_err(|_| {
            CompletionError::Misconfiguration(format!(
                "Anthropic API key not found in environment variable '{api_key_env}'. \
                 Set it or configure a different api_key_env in [llm.anthropic]."
            ))
        })?;

        let defaults = HttpParams::default();
        let params = HttpParams {
            max_tokens: section.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: section.temperature.unwrap_or(defaults.temperature),
        };

        Self::new(api_key, section.base_url, params)
    }

    fn build_body(&self, request: &CompletionRequest) -> AnthropicRequest {
        let params = self.default_params.resolve(request);
        AnthropicRequest {
            model: request.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system: request.system.clone(),
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let body = self.build_body(&request);

        debug!(
            provider = "anthropic",
            job_id = %request.job_id,
            model = %body.model,
            max_tokens = body.max_tokens,
            "Invoking Anthropic"
        );

        let http_request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute(http_request, request.timeout, "anthropic")
            .await?;

        let response_body: AnthropicResponse = response.json().await.map_err(|e| {
            CompletionError::Transport(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let content = response_body.text();
        if content.is_empty() {
            return Err(CompletionError::Transport(
                "Anthropic response missing text content".to_string(),
            ));
        }

        let mut completion = Completion::new(content, "anthropic", body.model);
        if let Some(usage) = response_body.usage {
            completion.tokens_input = Some(usage.input_tokens);
            completion.tokens_output = Some(usage.output_tokens);
        }

        Ok(completion)
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

impl AnthropicResponse {
    /// Concatenate the text blocks, ignoring tool-use and other block types
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.content_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
