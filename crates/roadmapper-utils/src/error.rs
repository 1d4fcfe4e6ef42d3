//! Error taxonomy shared by every roadmapper crate.
//!
//! Each error enum carries enough structure for programmatic handling and
//! implements [`UserFriendlyError`] so the presentation layer can render a
//! message, some context, and a list of suggestions without string matching.
//!
//! | Type | Raised by |
//! |------|-----------|
//! | [`ConfigError`] | config discovery and validation |
//! | [`CompletionError`] | completion providers (HTTP backends, dry-run) |
//! | [`StoreError`] | roadmap persistence and the store lock |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;

    /// Render message, context and suggestions as a single block of text.
    fn display_for_user(&self) -> String {
        let mut out = format!("Error [{}]: {}", self.category(), self.user_message());
        if let Some(context) = self.context() {
            out.push_str("\n\n");
            out.push_str(&context);
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                out.push_str("\n  - ");
                out.push_str(&suggestion);
            }
        }
        out
    }
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Generation,
    Storage,
    Concurrency,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Provider => write!(f, "Provider"),
            Self::Generation => write!(f, "Generation"),
            Self::Storage => write!(f, "Storage"),
            Self::Concurrency => write!(f, "Concurrency"),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("Configuration validation failed: {error_count} error(s)")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => format!("Required configuration '{key}' is missing"),
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::ValidationFailed { errors, .. } => format!(
                "Configuration validation failed with {} errors: {}",
                errors.len(),
                errors.join(", ")
            ),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [defaults] and [llm] sections."
                    .to_string(),
            ),
            Self::NotFound { .. } => Some(
                "roadmapper searches upward from the working directory for .roadmapper/config.toml."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .roadmapper/config.toml".to_string(),
                "Run 'roadmapper config' to see the effective configuration".to_string(),
            ],
            Self::MissingRequired(key) => {
                vec![format!("Set '{key}' in the config file or on the command line")]
            }
            Self::InvalidValue { key, .. } => {
                vec![format!("Correct the value of '{key}'")]
            }
            Self::NotFound { .. } => vec![
                "Pass an existing file with --config".to_string(),
                "Or remove --config to fall back to discovery".to_string(),
            ],
            Self::ValidationFailed { .. } => {
                vec!["Fix the listed configuration problems and retry".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

// ============================================================================
// Completion providers
// ============================================================================

/// Coarse classification of a provider failure.
///
/// The first three kinds are recoverable by rotating to another model;
/// everything else is [`CompletionErrorKind::Fatal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    RateLimited,
    ModelUnavailable,
    Transient,
    Fatal,
}

impl fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ModelUnavailable => write!(f, "model_unavailable"),
            Self::Transient => write!(f, "transient"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Errors raised by a completion provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// Provider quota/rate limit exceeded (429)
    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    /// Model not found or not served by the provider (404, unknown model)
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Provider service outage (5xx errors)
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    Auth(String),

    /// Request rejected or connection failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Call budget exhausted for this process
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl CompletionError {
    /// Classify this error for the model rotation retrier.
    ///
    /// Timeouts count as transient: the request never produced output, and
    /// another model may well answer within the limit.
    #[must_use]
    pub fn kind(&self) -> CompletionErrorKind {
        match self {
            Self::RateLimited(_) => CompletionErrorKind::RateLimited,
            Self::ModelUnavailable(_) => CompletionErrorKind::ModelUnavailable,
            Self::Transient(_) | Self::Timeout { .. } => CompletionErrorKind::Transient,
            Self::Auth(_)
            | Self::Transport(_)
            | Self::BudgetExceeded { .. }
            | Self::Misconfiguration(_)
            | Self::Unsupported(_) => CompletionErrorKind::Fatal,
        }
    }

    /// Whether rotating to the next model may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.kind() != CompletionErrorKind::Fatal
    }
}

impl UserFriendlyError for CompletionError {
    fn user_message(&self) -> String {
        match self {
            Self::RateLimited(msg) => format!("LLM provider rate limit exceeded: {msg}"),
            Self::ModelUnavailable(msg) => format!("LLM model is not available: {msg}"),
            Self::Transient(msg) => format!("LLM provider service error: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM request timed out after {duration:?}")
            }
            Self::Auth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::BudgetExceeded { limit, attempted } => format!(
                "LLM call budget exceeded: attempted {attempted} calls, limit is {limit}"
            ),
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self.kind() {
            CompletionErrorKind::Fatal => None,
            _ => Some(
                "This failure is normally absorbed by rotating to the next configured model."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::RateLimited(_) | Self::Transient(_) | Self::Timeout { .. } => vec![
                "Wait a few minutes and resume the roadmap".to_string(),
                "Add more models to [llm] models to widen the fallback list".to_string(),
            ],
            Self::ModelUnavailable(_) => vec![
                "Check the model identifiers in [llm] models".to_string(),
            ],
            Self::Auth(_) => vec![
                "Check that the API key environment variable is set".to_string(),
                "Verify the API key is valid and not expired".to_string(),
            ],
            Self::Transport(_) => vec![
                "Verify network connectivity".to_string(),
                "Run with --verbose to see detailed error information".to_string(),
            ],
            Self::BudgetExceeded { .. } => vec![
                "Raise [llm] call_budget or ROADMAPPER_CALL_BUDGET".to_string(),
            ],
            Self::Misconfiguration(_) | Self::Unsupported(_) => vec![
                "Check the [llm] section of .roadmapper/config.toml".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
            _ => ErrorCategory::Provider,
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Errors raised by roadmap stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize roadmap '{id}': {reason}")]
    Serialize { id: String, reason: String },

    #[error("Corrupt roadmap document at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Roadmap '{id}' not found")]
    NotFound { id: String },

    #[error("Store at {path} is locked by another worker")]
    Locked { path: PathBuf },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl UserFriendlyError for StoreError {
    fn user_message(&self) -> String {
        match self {
            Self::Io { path, source } => {
                format!("Could not access roadmap storage at {}: {source}", path.display())
            }
            Self::Serialize { id, reason } => {
                format!("Roadmap '{id}' could not be saved: {reason}")
            }
            Self::Corrupt { path, reason } => {
                format!("Stored roadmap {} is unreadable: {reason}", path.display())
            }
            Self::NotFound { id } => format!("No roadmap with id '{id}'"),
            Self::Locked { path } => format!(
                "Another roadmapper worker is using the store at {}",
                path.display()
            ),
            Self::Unavailable(msg) => format!("Roadmap storage is unavailable: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Io { .. } | Self::Unavailable(_) => Some(
                "Progress made in memory is kept but was not checkpointed; resuming re-runs the unsaved phase."
                    .to_string(),
            ),
            Self::Locked { .. } => Some(
                "Only one worker process may write to a store directory at a time.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Io { .. } => vec!["Check permissions and free space on the store directory".to_string()],
            Self::Corrupt { .. } => vec!["Delete or repair the listed file".to_string()],
            Self::NotFound { .. } => vec!["Run 'roadmapper list' to see stored roadmaps".to_string()],
            Self::Locked { .. } => vec![
                "Wait for the other worker to finish".to_string(),
                "Or point --store-dir at a different directory".to_string(),
            ],
            Self::Serialize { .. } | Self::Unavailable(_) => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Locked { .. } => ErrorCategory::Concurrency,
            _ => ErrorCategory::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(CompletionError::RateLimited("429".into()).is_recoverable());
        assert!(CompletionError::ModelUnavailable("404".into()).is_recoverable());
        assert!(CompletionError::Transient("503".into()).is_recoverable());
        assert!(
            CompletionError::Timeout {
                duration: Duration::from_secs(5)
            }
            .is_recoverable()
        );

        assert!(!CompletionError::Auth("401".into()).is_recoverable());
        assert!(!CompletionError::Transport("400".into()).is_recoverable());
        assert!(
            !CompletionError::BudgetExceeded {
                limit: 1,
                attempted: 2
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_kind_display_is_snake_case() {
        assert_eq!(CompletionErrorKind::RateLimited.to_string(), "rate_limited");
        assert_eq!(
            CompletionErrorKind::ModelUnavailable.to_string(),
            "model_unavailable"
        );
    }

    #[test]
    fn test_display_for_user_includes_suggestions() {
        let err = StoreError::Locked {
            path: PathBuf::from("/tmp/store"),
        };
        let text = err.display_for_user();
        assert!(text.starts_with("Error [Concurrency]"));
        assert!(text.contains("Suggestions:"));
        assert!(text.contains("--store-dir"));
    }

    #[test]
    fn test_config_error_category() {
        let err = ConfigError::InvalidValue {
            key: "llm.models".into(),
            value: "[]".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.user_message().contains("llm.models"));
    }
}
