use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Fixed delay between rotation attempts after a recoverable failure
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;

/// Pause between jobs so queue commands can land
pub const DEFAULT_JOB_YIELD_MS: u64 = 50;

/// Per-call timeout for completion requests
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 180;

/// Provider used when nothing else is configured
pub const DEFAULT_PROVIDER: &str = "openrouter";

/// Model fallback list used when `[llm] models` is not set
pub const DEFAULT_MODELS: &[&str] = &[
    "google/gemini-2.0-flash-001",
    "meta-llama/llama-3.3-70b-instruct",
    "mistralai/mistral-small-3.1-24b-instruct",
];

/// Providers `roadmapper` knows how to construct
pub const KNOWN_PROVIDERS: &[&str] = &["openrouter", "anthropic", "dry-run"];

/// Where an effective configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value read from an environment variable.
    Env,
    /// Value loaded from the given configuration file.
    ConfigFile(PathBuf),
    /// Value provided programmatically via [`ConfigBuilder`](super::ConfigBuilder).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Env => write!(f, "env"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "default"),
        }
    }
}

/// Effective roadmapper configuration.
///
/// Build one with [`Config::discover`] (CLI behaviour) or
/// [`Config::builder`] (deterministic, for embedding and tests).
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub llm: LlmConfig,
    /// Source of each effective value, keyed by dotted config key
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[defaults]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Directory holding stored roadmap documents
    pub store_dir: Option<String>,
    /// Delay between model rotation attempts, in milliseconds
    pub retry_backoff_ms: Option<u64>,
    /// Pause between jobs, in milliseconds
    pub job_yield_ms: Option<u64>,
    /// Timeout for a single completion call, in seconds
    pub call_timeout_secs: Option<u64>,
    pub verbose: Option<bool>,
}

/// `[llm]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider name: `openrouter`, `anthropic` or `dry-run`
    pub provider: Option<String>,
    /// Ordered model fallback list
    #[serde(default)]
    pub models: Vec<String>,
    /// Maximum provider calls per process
    pub call_budget: Option<u32>,
    pub openrouter: Option<OpenRouterConfig>,
    pub anthropic: Option<AnthropicConfig>,
}

/// `[llm.openrouter]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    /// Environment variable holding the API key (default `OPENROUTER_API_KEY`)
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// `[llm.anthropic]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnthropicConfig {
    /// Environment variable holding the API key (default `ANTHROPIC_API_KEY`)
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Command-line overrides, applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file (skips discovery)
    pub config_path: Option<PathBuf>,
    pub store_dir: Option<String>,
    pub provider: Option<String>,
    /// Replaces the configured model list when non-empty
    pub models: Vec<String>,
    pub call_budget: Option<u32>,
    pub verbose: Option<bool>,
    /// Force the offline `dry-run` provider
    pub dry_run: bool,
}
