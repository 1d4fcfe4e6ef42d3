//! Roadmap generation orchestrator.
//!
//! A single-worker job queue. Control commands ([`Orchestrator::enqueue`],
//! [`Orchestrator::pause_queue`], ...) may arrive at any time, including
//! while the worker awaits the network; they take effect at the worker's next
//! suspension point. Progress is checkpointed to the store after the
//! structure call and after every phase, so an interruption, crash or pause
//! loses at most one in-flight call.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roadmapper_engine::{Orchestrator, OrchestratorOptions, RoadmapJob};
//! use roadmapper_llm::DryRunProvider;
//! use roadmapper_store::MemoryStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(
//!     Arc::new(DryRunProvider::new()),
//!     Arc::new(MemoryStore::new()),
//!     OrchestratorOptions::new(vec!["model-a".into()]),
//! )?;
//! orchestrator.enqueue(RoadmapJob::new("Learn Rust", "Write a CLI tool", ""));
//! let status = orchestrator.wait_idle().await;
//! assert_eq!(status.completed_jobs, 1);
//! # Ok(())
//! # }
//! ```

mod state;
mod worker;

pub use state::OrchestratorStatus;

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use roadmapper_config::Config;
use roadmapper_llm::CompletionProvider;
use roadmapper_store::{GenerationState, RoadmapStore};

use crate::dedup::is_equivalent;
use crate::error::GenerationError;
use crate::interrupt::InterruptToken;
use crate::job::RoadmapJob;
use crate::retrier::Retrier;

use self::state::OrchestratorState;

/// Runtime knobs for the worker.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Ordered model fallback list; must not be empty
    pub models: Vec<String>,
    /// Fixed delay between rotation attempts
    pub retry_backoff: Duration,
    /// Pause between jobs so queued control commands can land
    pub job_yield: Duration,
    pub call_timeout: Duration,
}

impl OrchestratorOptions {
    /// Options with zero backoff and yield, for embedding and tests.
    #[must_use]
    pub fn new(models: Vec<String>) -> Self {
        Self {
            models,
            retry_backoff: Duration::ZERO,
            job_yield: Duration::ZERO,
            call_timeout: Duration::from_secs(roadmapper_config::config::DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            models: config.models(),
            retry_backoff: config.retry_backoff(),
            job_yield: config.job_yield(),
            call_timeout: config.call_timeout(),
        }
    }
}

/// Cloneable handle to one orchestrator. Independent orchestrators share
/// nothing.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    state: Mutex<OrchestratorState>,
    interrupt: InterruptToken,
    status_tx: watch::Sender<OrchestratorStatus>,
    store: Arc<dyn RoadmapStore>,
    retrier: Retrier,
    options: OrchestratorOptions,
    runtime: Option<Handle>,
}

impl Orchestrator {
    /// # Errors
    ///
    /// `GenerationError::NoModels` if `options.models` is empty.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn RoadmapStore>,
        options: OrchestratorOptions,
    ) -> Result<Self, GenerationError> {
        if options.models.is_empty() {
            return Err(GenerationError::NoModels);
        }
        let (status_tx, _) = watch::channel(OrchestratorStatus::default());
        let retrier = Retrier::new(provider, options.retry_backoff, options.call_timeout);

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(OrchestratorState::default()),
                interrupt: InterruptToken::new(),
                status_tx,
                store,
                retrier,
                options,
                runtime: Handle::try_current().ok(),
            }),
        })
    }

    /// Append a job. Returns `false` without changing anything when the job
    /// id is already known or an equivalent job is queued or executing.
    ///
    /// Starts the worker if it is idle and the queue is not paused.
    pub fn enqueue(&self, mut job: RoadmapJob) -> bool {
        let start = {
            let mut state = self.inner.lock();

            let executing = state.current_job.as_ref();
            let duplicate = state.queue.contains_job(&job.job_id)
                || executing.is_some_and(|c| c.job_id == job.job_id);
            let equivalent = state.queue.find_equivalent(&job).is_some()
                || executing.is_some_and(|c| is_equivalent(&job, c));
            if duplicate || equivalent {
                debug!(job_id = %job.job_id, duplicate, equivalent, "Rejected job");
                return false;
            }

            job.enqueued_at = Some(Utc::now());
            info!(job_id = %job.job_id, objective = %job.objective, "Enqueued job");
            state.queue.push_back(job);
            let start = self.inner.claim_worker(&mut state);
            self.inner.publish(&state);
            start
        };

        if start {
            self.inner.spawn_worker();
        }
        true
    }

    /// Remove queued entries whose job id or roadmap id equals `id`. If the
    /// executing job matches, it is stopped at its next suspension point and
    /// not re-queued. Returns the number of entries affected.
    pub fn remove_from_queue(&self, id: &str) -> usize {
        let mut state = self.inner.lock();
        let mut affected = state.queue.remove_matching(id).len();

        if state.current_job.as_ref().is_some_and(|c| c.matches(id)) {
            state.current_cancelled = true;
            self.inner.interrupt.request();
            affected += 1;
        }

        debug!(id, affected, "Removed from queue");
        self.inner.publish(&state);
        affected
    }

    /// Pause the queue. The executing job is interrupted and parked at the
    /// head of the queue as a resume. Idempotent.
    pub fn pause_queue(&self) {
        let mut state = self.inner.lock();
        if state.is_paused {
            return;
        }
        state.is_paused = true;
        self.inner.interrupt.request();

        if !state.current_cancelled
            && let Some(current) = state.current_job.clone()
            && !state.queue.contains_job(&current.job_id)
        {
            let mut parked = current;
            parked.is_resume = parked.roadmap_id.is_some();
            info!(job_id = %parked.job_id, "Parked executing job at queue head");
            state.queue.push_front(parked);
        }

        info!(queued = state.queue.len(), "Queue paused");
        self.inner.publish(&state);
    }

    /// Unpause and restart the worker if there is queued work.
    pub fn resume_queue(&self) {
        let start = {
            let mut state = self.inner.lock();
            state.is_paused = false;
            if !state.current_cancelled {
                self.inner.interrupt.clear();
            }
            let start = !state.queue.is_empty() && self.inner.claim_worker(&mut state);
            info!(queued = state.queue.len(), "Queue resumed");
            self.inner.publish(&state);
            start
        };

        if start {
            self.inner.spawn_worker();
        }
    }

    /// Drop every queued job. The executing job stops at its next
    /// suspension point and is not re-queued.
    pub fn clear_queue(&self) -> usize {
        let mut state = self.inner.lock();
        let cleared = state.queue.clear();
        if state.current_job.is_some() {
            state.current_cancelled = true;
            self.inner.interrupt.request();
        }
        info!(cleared, "Queue cleared");
        self.inner.publish(&state);
        cleared
    }

    /// Move a queued job to `index`. Returns false if it is not queued.
    pub fn move_job(&self, job_id: &str, index: usize) -> bool {
        let mut state = self.inner.lock();
        let moved = state.queue.move_to(job_id, index);
        if moved {
            self.inner.publish(&state);
        }
        moved
    }

    /// Re-enqueue an incomplete stored roadmap as a resume job.
    ///
    /// # Errors
    ///
    /// `Persistence(NotFound)` for an unknown id, `AlreadyComplete` for a
    /// finished roadmap.
    pub fn retry(&self, roadmap_id: &str) -> Result<bool, GenerationError> {
        let roadmap = self.inner.store.get(roadmap_id)?;
        if roadmap.generation_state == GenerationState::Completed && roadmap.is_fully_detailed() {
            return Err(GenerationError::AlreadyComplete {
                id: roadmap.id,
            });
        }
        Ok(self.enqueue(RoadmapJob::resume(&roadmap)))
    }

    /// Enqueue a from-scratch rebuild of a stored roadmap under its id.
    ///
    /// # Errors
    ///
    /// `Persistence(NotFound)` for an unknown id.
    pub fn regenerate(&self, roadmap_id: &str) -> Result<bool, GenerationError> {
        let roadmap = self.inner.store.get(roadmap_id)?;
        Ok(self.enqueue(RoadmapJob::regenerate(&roadmap)))
    }

    #[must_use]
    pub fn status(&self) -> OrchestratorStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Receive a fresh [`OrchestratorStatus`] after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Wait until no worker is running and return the final status.
    pub async fn wait_idle(&self) -> OrchestratorStatus {
        let mut rx = self.subscribe();
        loop {
            {
                let status = rx.borrow_and_update();
                if status.is_idle() {
                    return status.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.status();
            }
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &OrchestratorState) {
        self.status_tx
            .send_replace(state.snapshot(self.interrupt.is_requested()));
    }

    /// Check-and-set of `is_processing`; true means the caller must start
    /// the worker. Overlapping triggers never start two loops.
    fn claim_worker(&self, state: &mut OrchestratorState) -> bool {
        if state.is_paused || state.is_processing {
            return false;
        }
        state.is_processing = true;
        true
    }

    fn spawn_worker(self: &Arc<Self>) {
        let handle = Handle::try_current().ok().or_else(|| self.runtime.clone());
        match handle {
            Some(handle) => {
                let inner = Arc::clone(self);
                handle.spawn(async move { inner.drain().await });
            }
            None => {
                warn!("No async runtime available; worker not started");
                let mut state = self.lock();
                state.is_processing = false;
                self.publish(&state);
            }
        }
    }
}

#[cfg(test)]
mod tests;
