//! Roadmap generation engine.
//!
//! Turns a learning objective into a multi-phase roadmap through a sequence
//! of model calls: one structure call, then one detail call per phase. Jobs
//! run one at a time from a queue that can be paused, reordered and cleared
//! while a call is in flight. Every completed unit of work is checkpointed,
//! so a stored roadmap can always be resumed from its first undetailed phase.

pub mod dedup;
pub mod error;
pub mod extraction;
pub mod interrupt;
pub mod job;
pub mod orchestrator;
pub mod phases;
pub mod prompts;
pub mod queue;
pub mod retrier;

pub use error::{GenerationError, RoadmapperError};
pub use interrupt::InterruptToken;
pub use job::RoadmapJob;
pub use orchestrator::{Orchestrator, OrchestratorOptions, OrchestratorStatus};
pub use phases::PhaseState;
pub use retrier::{ModelRotation, Outcome, Retrier};
