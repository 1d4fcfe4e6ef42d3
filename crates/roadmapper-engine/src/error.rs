//! Job-level errors and the top-level error aggregate.

use thiserror::Error;

use roadmapper_utils::error::{
    CompletionError, ConfigError, ErrorCategory, StoreError, UserFriendlyError,
};
use roadmapper_utils::exit_codes::ExitCode;

/// Why a generation job (or a control command) failed.
///
/// Every variant is fatal for the job it occurred in; recoverable provider
/// failures never surface here unless rotation ran out of models.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("All {attempts} configured models failed; last error: {last}")]
    ModelsExhausted {
        attempts: usize,
        #[source]
        last: CompletionError,
    },

    #[error("Provider call failed: {0}")]
    Provider(#[source] CompletionError),

    #[error("Malformed model response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Invalid roadmap structure: {reason}")]
    InvalidStructure { reason: String },

    #[error("Checkpoint failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("No models configured")]
    NoModels,

    #[error("Roadmap '{id}' is already complete")]
    AlreadyComplete { id: String },
}

impl UserFriendlyError for GenerationError {
    fn user_message(&self) -> String {
        match self {
            Self::ModelsExhausted { attempts, last } => format!(
                "Every configured model failed ({attempts} tried). Last error: {}",
                last.user_message()
            ),
            Self::Provider(e) => e.user_message(),
            Self::MalformedResponse { reason } => {
                format!("The model returned output that is not valid roadmap JSON: {reason}")
            }
            Self::InvalidStructure { reason } => {
                format!("The model returned an unusable roadmap outline: {reason}")
            }
            Self::Persistence(e) => e.user_message(),
            Self::NoModels => "No models are configured for generation".to_string(),
            Self::AlreadyComplete { id } => {
                format!("Roadmap '{id}' is already complete; nothing to resume")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ModelsExhausted { .. } | Self::Provider(_) | Self::MalformedResponse { .. } => {
                Some("The roadmap keeps every phase detailed so far and can be resumed.".to_string())
            }
            Self::Persistence(e) => e.context(),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ModelsExhausted { .. } => vec![
                "Wait a minute and run 'roadmapper resume <id>'".to_string(),
                "Add more models to [llm] models".to_string(),
            ],
            Self::Provider(e) => e.suggestions(),
            Self::MalformedResponse { .. } | Self::InvalidStructure { .. } => {
                vec!["Retry; model output varies between calls".to_string()]
            }
            Self::Persistence(e) => e.suggestions(),
            Self::NoModels => vec!["Set [llm] models or pass --model".to_string()],
            Self::AlreadyComplete { .. } => {
                vec!["Use 'roadmapper regenerate <id>' to rebuild it".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ModelsExhausted { .. } | Self::Provider(_) => ErrorCategory::Provider,
            Self::Persistence(e) => e.category(),
            Self::NoModels => ErrorCategory::Configuration,
            _ => ErrorCategory::Generation,
        }
    }
}

/// Top-level error for the roadmapper library and CLI.
#[derive(Error, Debug)]
pub enum RoadmapperError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl RoadmapperError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Completion(_) => ExitCode::PROVIDER_FAILURE,
            Self::Store(StoreError::NotFound { .. })
            | Self::Generation(GenerationError::Persistence(StoreError::NotFound { .. })) => {
                ExitCode::NOT_FOUND
            }
            Self::Store(StoreError::Locked { .. }) => ExitCode::LOCK_HELD,
            Self::Store(_) => ExitCode::INTERNAL,
            Self::Generation(GenerationError::NoModels) => ExitCode::CLI_ARGS,
            Self::Generation(_) => ExitCode::JOB_FAILED,
        }
    }
}

impl UserFriendlyError for RoadmapperError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Completion(e) => e.user_message(),
            Self::Store(e) => e.user_message(),
            Self::Generation(e) => e.user_message(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Completion(e) => e.context(),
            Self::Store(e) => e.context(),
            Self::Generation(e) => e.context(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Completion(e) => e.suggestions(),
            Self::Store(e) => e.suggestions(),
            Self::Generation(e) => e.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Completion(e) => e.category(),
            Self::Store(e) => e.category(),
            Self::Generation(e) => e.category(),
        }
    }
}
