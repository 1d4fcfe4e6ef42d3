//! Programmatic configuration without filesystem or environment discovery.

use std::collections::HashMap;
use std::time::Duration;

use roadmapper_utils::error::ConfigError;

use super::{Config, ConfigSource, Defaults, LlmConfig};

impl Config {
    /// Start a deterministic configuration.
    ///
    /// Unlike [`Config::discover`], the builder never reads config files or
    /// environment variables.
    ///
    /// ```rust
    /// use roadmapper_config::Config;
    ///
    /// let config = Config::builder()
    ///     .provider("dry-run")
    ///     .models(vec!["model-a".into(), "model-b".into()])
    ///     .build()?;
    /// assert_eq!(config.models().len(), 2);
    /// # Ok::<(), roadmapper_utils::error::ConfigError>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`Config`]; every value set here is attributed to
/// [`ConfigSource::Programmatic`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    defaults: Defaults,
    llm: LlmConfig,
    touched: Vec<&'static str>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn store_dir(mut self, dir: impl Into<String>) -> Self {
        self.defaults.store_dir = Some(dir.into());
        self.touched.push("store_dir");
        self
    }

    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.llm.provider = Some(provider.into());
        self.touched.push("llm.provider");
        self
    }

    #[must_use]
    pub fn models(mut self, models: Vec<String>) -> Self {
        self.llm.models = models;
        self.touched.push("llm.models");
        self
    }

    #[must_use]
    pub fn call_budget(mut self, budget: u32) -> Self {
        self.llm.call_budget = Some(budget);
        self.touched.push("llm.call_budget");
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.defaults.retry_backoff_ms = Some(backoff.as_millis() as u64);
        self.touched.push("retry_backoff_ms");
        self
    }

    #[must_use]
    pub fn job_yield(mut self, pause: Duration) -> Self {
        self.defaults.job_yield_ms = Some(pause.as_millis() as u64);
        self.touched.push("job_yield_ms");
        self
    }

    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.defaults.call_timeout_secs = Some(timeout.as_secs());
        self.touched.push("call_timeout_secs");
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationFailed`] for invalid values.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution: HashMap<String, ConfigSource> = HashMap::new();
        for key in self.touched {
            source_attribution.insert(key.to_string(), ConfigSource::Programmatic);
        }

        let config = Config {
            defaults: self.defaults,
            llm: self.llm,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
