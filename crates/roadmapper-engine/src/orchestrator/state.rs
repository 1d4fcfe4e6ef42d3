use serde::Serialize;

use roadmapper_store::Roadmap;

use crate::job::RoadmapJob;
use crate::queue::GenerationQueue;

/// In-memory orchestration state. Never persisted; guarded by the
/// orchestrator's mutex.
#[derive(Debug, Default)]
pub(crate) struct OrchestratorState {
    pub queue: GenerationQueue,
    pub current_job: Option<RoadmapJob>,
    /// Evolving document of the executing job
    pub current_roadmap: Option<Roadmap>,
    pub is_paused: bool,
    /// True while a worker loop owns the queue
    pub is_processing: bool,
    /// The executing job was removed or the queue cleared; it must stop and
    /// must not be parked
    pub current_cancelled: bool,
    pub last_error: Option<String>,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
}

impl OrchestratorState {
    pub fn snapshot(&self, interrupt_requested: bool) -> OrchestratorStatus {
        OrchestratorStatus {
            current_job: self.current_job.clone(),
            queue: self.queue.snapshot(),
            current_roadmap: self.current_roadmap.clone(),
            is_paused: self.is_paused,
            is_processing: self.is_processing,
            interrupt_requested,
            last_error: self.last_error.clone(),
            completed_jobs: self.completed_jobs,
            failed_jobs: self.failed_jobs,
        }
    }
}

/// Observable orchestrator state, published after every change.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorStatus {
    pub current_job: Option<RoadmapJob>,
    /// Pending jobs in execution order
    pub queue: Vec<RoadmapJob>,
    pub current_roadmap: Option<Roadmap>,
    pub is_paused: bool,
    pub is_processing: bool,
    pub interrupt_requested: bool,
    /// User-facing message of the most recent job failure
    pub last_error: Option<String>,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
}

impl OrchestratorStatus {
    /// No worker is running. The queue may still hold jobs if paused.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.is_processing
    }
}
