//! Configuration management for roadmapper
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults. The TOML file supports `[defaults]`,
//! `[llm]`, `[llm.openrouter]` and `[llm.anthropic]` sections.
//!
//! ```toml
//! [defaults]
//! store_dir = "roadmaps"
//! retry_backoff_ms = 1000
//!
//! [llm]
//! provider = "openrouter"
//! models = ["google/gemini-2.0-flash-001", "meta-llama/llama-3.3-70b-instruct"]
//! call_budget = 60
//! ```

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use discovery::{CALL_BUDGET_ENV_VAR, PROVIDER_ENV_VAR};
pub use model::*;

use camino::Utf8PathBuf;
use std::time::Duration;

impl Config {
    /// Effective provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// Ordered model fallback list; never empty after validation.
    #[must_use]
    pub fn models(&self) -> Vec<String> {
        if self.llm.models.is_empty() {
            DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect()
        } else {
            self.llm.models.clone()
        }
    }

    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(
            self.defaults
                .retry_backoff_ms
                .unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
        )
    }

    #[must_use]
    pub fn job_yield(&self) -> Duration {
        Duration::from_millis(self.defaults.job_yield_ms.unwrap_or(DEFAULT_JOB_YIELD_MS))
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(
            self.defaults
                .call_timeout_secs
                .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS),
        )
    }

    /// Directory for stored roadmaps. Relative paths resolve against the
    /// roadmapper home.
    #[must_use]
    pub fn store_dir(&self) -> Utf8PathBuf {
        match self.defaults.store_dir.as_deref() {
            Some(dir) => {
                let path = Utf8PathBuf::from(dir);
                if path.is_absolute() {
                    path
                } else {
                    roadmapper_utils::paths::roadmapper_home().join(path)
                }
            }
            None => roadmapper_utils::paths::default_store_dir(),
        }
    }

    #[must_use]
    pub fn call_budget(&self) -> Option<u32> {
        self.llm.call_budget
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    /// Minimal config for unit tests: dry-run provider, no backoff.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self::builder()
            .provider("dry-run")
            .models(vec!["test-model".to_string()])
            .retry_backoff(Duration::ZERO)
            .job_yield(Duration::ZERO)
            .build()
            .expect("minimal test config is valid")
    }
}
