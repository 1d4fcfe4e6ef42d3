//! Shared fixtures for the integration tests: a scripted provider built on
//! the dry-run output and a store that can be told to fail.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::Notify;

use roadmapper::{
    Completion, CompletionError, CompletionProvider, CompletionRequest, DryRunProvider,
    MemoryStore, Orchestrator, OrchestratorOptions, Roadmap, RoadmapStore, StoreError,
};

/// One provider call as seen by [`ScriptedProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub model: String,
    /// "structure" or "phase-N" (one-based)
    pub unit: String,
}

/// Parks the first call for one unit until released.
pub struct Gate {
    unit: String,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated call is in flight.
    pub async fn entered(&self) {
        tokio::time::timeout(Duration::from_secs(10), self.entered.notified())
            .await
            .expect("gated call never started");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Dry-run output with per-model failures, an optional gate, and a call log.
#[derive(Default)]
pub struct ScriptedProvider {
    inner: DryRunProvider,
    calls: Mutex<Vec<Call>>,
    failing_models: Mutex<HashMap<String, CompletionError>>,
    gate: Mutex<Option<Arc<Gate>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call to `model` fails with `error`.
    pub fn fail_model(&self, model: &str, error: CompletionError) {
        self.failing_models
            .lock()
            .unwrap()
            .insert(model.to_string(), error);
    }

    pub fn heal_all(&self) {
        self.failing_models.lock().unwrap().clear();
    }

    /// Park the first call for `unit` ("structure", "phase-2", ...).
    pub fn gate(&self, unit: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate {
            unit: unit.to_string(),
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        });
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn units(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.unit).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn unit_label(request: &CompletionRequest) -> String {
    match request.unit() {
        Some("phase") => {
            let number = request
                .metadata
                .get("phase_number")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            format!("phase-{number}")
        }
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let unit = unit_label(&request);
        self.calls.lock().unwrap().push(Call {
            model: request.model.clone(),
            unit: unit.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate
            && gate.unit == unit
            && gate.armed.swap(false, Ordering::SeqCst)
        {
            gate.entered.notify_one();
            gate.release.notified().await;
        } else {
            tokio::task::yield_now().await;
        }

        let failure = self.failing_models.lock().unwrap().get(&request.model).cloned();
        let result = match failure {
            Some(error) => Err(error),
            None => self.inner.complete(request).await,
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Memory store whose `nth` save (one-based) fails once.
pub struct FlakyStore {
    pub inner: MemoryStore,
    saves: AtomicUsize,
    fail_on: usize,
    pause_before_failing: OnceLock<Orchestrator>,
}

impl FlakyStore {
    pub fn failing_save(nth: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            saves: AtomicUsize::new(0),
            fail_on: nth,
            pause_before_failing: OnceLock::new(),
        })
    }

    /// Pause `orchestrator` from inside the failing save, after the call
    /// that produced the document has returned.
    pub fn pause_before_failing(&self, orchestrator: Orchestrator) {
        let _ = self.pause_before_failing.set(orchestrator);
    }
}

impl RoadmapStore for FlakyStore {
    fn save(&self, roadmap: &Roadmap) -> Result<Roadmap, StoreError> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            if let Some(orchestrator) = self.pause_before_failing.get() {
                orchestrator.pause_queue();
            }
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.save(roadmap)
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.inner.remove(id)
    }

    fn list_all(&self) -> Result<Vec<Roadmap>, StoreError> {
        self.inner.list_all()
    }
}

pub fn models(names: &[&str]) -> OrchestratorOptions {
    OrchestratorOptions::new(names.iter().map(|m| m.to_string()).collect())
}

pub fn orchestrator(
    provider: Arc<ScriptedProvider>,
    store: Arc<dyn RoadmapStore>,
    names: &[&str],
) -> Orchestrator {
    Orchestrator::new(provider, store, models(names)).expect("non-empty model list")
}
