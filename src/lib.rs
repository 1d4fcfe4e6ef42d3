//! roadmapper - queue-driven, resumable learning roadmap generation
//!
//! roadmapper turns a learning objective ("Learn Rust") and a final goal
//! ("Write a CLI tool") into a multi-phase roadmap using LLM providers. One
//! structure call outlines the phases; one call per phase fills in its goal,
//! mini-goals, resources and project. Each unit of work is checkpointed to
//! the store, so generation survives pauses, provider outages and crashes.
//!
//! roadmapper can be used in two ways:
//! - **CLI**: `roadmapper generate --objective ... --goal ...`
//! - **Library**: drive an [`Orchestrator`] with any [`CompletionProvider`]
//!   and [`RoadmapStore`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Offline run with canned output
//! roadmapper generate --objective "Learn Rust" --goal "Write a CLI tool" --dry-run
//!
//! # Inspect and continue
//! roadmapper list
//! roadmapper resume learn-rust-roadmap
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roadmapper::{DryRunProvider, MemoryStore, Orchestrator, OrchestratorOptions, RoadmapJob};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(
//!     Arc::new(DryRunProvider::new()),
//!     Arc::new(MemoryStore::new()),
//!     OrchestratorOptions::new(vec!["model-a".into(), "model-b".into()]),
//! )?;
//! orchestrator.enqueue(RoadmapJob::new("Learn Rust", "Write a CLI tool", "beginner"));
//! let status = orchestrator.wait_idle().await;
//! println!("{} roadmap(s) completed", status.completed_jobs);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate layout
//!
//! - `roadmapper-utils`: errors, exit codes, logging, atomic writes
//! - `roadmapper-config`: configuration discovery with source attribution
//! - `roadmapper-llm`: completion providers (OpenRouter, Anthropic, dry-run)
//! - `roadmapper-store`: roadmap model, file and memory stores, worker lock
//! - `roadmapper-engine`: queue, phase state machine, model rotation

pub mod cli;

pub use roadmapper_config::{CliArgs, Config, ConfigBuilder};
pub use roadmapper_engine::{
    GenerationError, InterruptToken, Orchestrator, OrchestratorOptions, OrchestratorStatus,
    RoadmapJob, RoadmapperError,
};
pub use roadmapper_llm::{
    BudgetedProvider, Completion, CompletionError, CompletionProvider, CompletionRequest,
    DryRunProvider,
};
pub use roadmapper_store::{
    FileStore, GenerationState, MemoryStore, Phase, Roadmap, RoadmapStore, StoreError, StoreLock,
};
pub use roadmapper_utils::error::UserFriendlyError;
pub use roadmapper_utils::exit_codes::ExitCode;
