//! Core types for the completion provider abstraction

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use roadmapper_utils::error::CompletionError;

/// Metadata key naming the unit of work (`structure` or `phase`)
pub const META_UNIT: &str = "unit";

/// Metadata key carrying the 1-based phase number for detail requests
pub const META_PHASE_NUMBER: &str = "phase_number";

/// Metadata key carrying the phase title for detail requests
pub const META_PHASE_TITLE: &str = "phase_title";

/// One completion call issued by the engine.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Job the call belongs to; used for log correlation only
    pub job_id: String,
    /// Model identifier selected by the rotation cursor
    pub model: String,
    /// Optional system instructions
    pub system: Option<String>,
    /// The prompt text
    pub prompt: String,
    /// Upper bound for this call
    pub timeout: Duration,
    /// Provider-specific hints (e.g. `max_tokens`, `temperature`) and unit
    /// descriptors consumed by the offline provider
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(
        job_id: impl Into<String>,
        model: impl Into<String>,
        prompt: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            timeout,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Unit descriptor, if the caller set one
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.metadata.get(META_UNIT).and_then(|v| v.as_str())
    }
}

/// Text returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
}

impl Completion {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
        }
    }
}

/// The "generate completion" capability the orchestrator depends on.
///
/// Implementations classify failures through [`CompletionError`]; the engine
/// decides whether to rotate models based on
/// [`CompletionError::is_recoverable`]. A call cannot be aborted once issued.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError>;
}
