use roadmapper_utils::error::ConfigError;

use super::{Config, KNOWN_PROVIDERS};

impl Config {
    /// Validate configuration values, collecting every problem found.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let provider = self.provider();
        if !KNOWN_PROVIDERS.contains(&provider) {
            errors.push(format!(
                "llm.provider: unknown provider '{provider}' (expected one of: {})",
                KNOWN_PROVIDERS.join(", ")
            ));
        }

        if self.llm.models.iter().any(|m| m.trim().is_empty()) {
            errors.push("llm.models: model identifiers must not be empty".to_string());
        }

        if let Some(budget) = self.llm.call_budget
            && budget == 0
        {
            errors.push("llm.call_budget: must be greater than 0".to_string());
        }

        if let Some(timeout) = self.defaults.call_timeout_secs
            && !(1..=3600).contains(&timeout)
        {
            errors.push("call_timeout_secs: must be between 1 and 3600".to_string());
        }

        if let Some(backoff) = self.defaults.retry_backoff_ms
            && backoff > 60_000
        {
            errors.push("retry_backoff_ms: exceeds maximum of 60000".to_string());
        }

        let temperatures = [
            (
                "llm.openrouter.temperature",
                self.llm.openrouter.as_ref().and_then(|c| c.temperature),
            ),
            (
                "llm.anthropic.temperature",
                self.llm.anthropic.as_ref().and_then(|c| c.temperature),
            ),
        ];
        for (key, value) in temperatures {
            if let Some(t) = value
                && !(0.0..=2.0).contains(&t)
            {
                errors.push(format!("{key}: must be between 0.0 and 2.0"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed {
                error_count: errors.len(),
                errors,
            })
        }
    }
}
