//! Completion provider abstraction for roadmapper
//!
//! Every provider implements [`CompletionProvider`], so the generation engine
//! can drive any backend without knowing how it talks to the network.
//! [`from_config`] builds the provider named by `[llm] provider` and wraps it
//! in a [`BudgetedProvider`] when `[llm] call_budget` is set.

mod anthropic;
mod budgeted;
mod dry_run;
pub(crate) mod http_client;
mod openrouter;
mod types;

use std::sync::Arc;

use roadmapper_config::Config;
use tracing::info;

pub use budgeted::BudgetedProvider;
pub use dry_run::{DryRunProvider, META_OBJECTIVE};
pub use roadmapper_utils::error::{CompletionError, CompletionErrorKind};
pub use types::{
    Completion, CompletionProvider, CompletionRequest, META_PHASE_NUMBER, META_PHASE_TITLE,
    META_UNIT,
};

use anthropic::AnthropicProvider;
use openrouter::OpenRouterProvider;

/// Construct the configured provider.
///
/// # Errors
///
/// Returns `CompletionError::Unsupported` for an unknown provider name and
/// `CompletionError::Misconfiguration` when provider settings (API keys) are
/// missing.
pub fn from_config(config: &Config) -> Result<Arc<dyn CompletionProvider>, CompletionError> {
    let provider: Arc<dyn CompletionProvider> = match config.provider() {
        "openrouter" => Arc::new(OpenRouterProvider::from_config(config)?),
        "anthropic" => Arc::new(AnthropicProvider::from_config(config)?),
        "dry-run" => Arc::new(DryRunProvider::new()),
        other => {
            return Err(CompletionError::Unsupported(format!(
                "Unknown provider '{other}'"
            )));
        }
    };

    info!(
        provider = provider.name(),
        models = config.models().len(),
        budget = ?config.call_budget(),
        "Completion provider ready"
    );

    Ok(match config.call_budget() {
        Some(limit) => Arc::new(BudgetedProvider::new(provider, limit)),
        None => provider,
    })
}
