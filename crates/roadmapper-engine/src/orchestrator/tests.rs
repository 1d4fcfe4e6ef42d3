use super::*;
use async_trait::async_trait;
use roadmapper_llm::{Completion, CompletionError, CompletionRequest, DryRunProvider, META_OBJECTIVE};
use roadmapper_store::{MemoryStore, Roadmap, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Dry-run output, except that the first call for `unit` parks until
/// released.
struct Blocking {
    inner: DryRunProvider,
    unit: &'static str,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Blocking {
    fn on(unit: &'static str) -> Arc<Self> {
        Arc::new(Self {
            inner: DryRunProvider::new(),
            unit,
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    async fn wait_entered(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.entered.notified())
            .await
            .expect("provider call never started");
    }
}

#[async_trait]
impl CompletionProvider for Blocking {
    fn name(&self) -> &str {
        "blocking"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        if request.unit() == Some(self.unit) && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.complete(request).await
    }
}

/// Rejects structure calls for the objective "bad" with an auth error.
struct RejectsBad(DryRunProvider);

#[async_trait]
impl CompletionProvider for RejectsBad {
    fn name(&self) -> &str {
        "rejects-bad"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        if request.metadata.get(META_OBJECTIVE).and_then(|v| v.as_str()) == Some("bad") {
            return Err(CompletionError::Auth("401 invalid key".into()));
        }
        self.0.complete(request).await
    }
}

fn orchestrator(provider: Arc<dyn CompletionProvider>, store: Arc<MemoryStore>) -> Orchestrator {
    Orchestrator::new(provider, store, OrchestratorOptions::new(vec!["m1".into(), "m2".into()]))
        .unwrap()
}

fn job(objective: &str) -> RoadmapJob {
    RoadmapJob::new(objective, "Write a CLI tool", "")
}

#[test]
fn test_empty_model_list_is_rejected() {
    let result = Orchestrator::new(
        Arc::new(DryRunProvider::new()),
        Arc::new(MemoryStore::new()),
        OrchestratorOptions::new(vec![]),
    );
    assert!(matches!(result, Err(GenerationError::NoModels)));
}

#[tokio::test]
async fn test_enqueued_job_runs_to_completion() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(Arc::new(DryRunProvider::new()), store.clone());

    assert!(orch.enqueue(job("Learn Rust")));
    let status = orch.wait_idle().await;

    assert_eq!(status.completed_jobs, 1);
    assert_eq!(status.failed_jobs, 0);
    assert!(status.current_job.is_none());
    let roadmaps = store.list_all().unwrap();
    assert_eq!(roadmaps.len(), 1);
    assert!(roadmaps[0].is_fully_detailed());
    assert_eq!(roadmaps[0].generation_state, GenerationState::Completed);
    assert_eq!(status.current_roadmap.unwrap().id, roadmaps[0].id);
}

#[tokio::test]
async fn test_duplicates_are_rejected_without_mutation() {
    let orch = orchestrator(Arc::new(DryRunProvider::new()), Arc::new(MemoryStore::new()));
    orch.pause_queue();

    let first = job("Learn Rust");
    assert!(orch.enqueue(first.clone()));
    assert!(!orch.enqueue(first.clone()), "same job id");
    assert!(!orch.enqueue(RoadmapJob::new(" learn rust ", "WRITE A CLI TOOL", "")));
    assert!(orch.enqueue(job("Learn Go")));

    let status = orch.status();
    assert_eq!(status.queue.len(), 2);
    assert!(status.queue[0].enqueued_at.is_some());
    assert!(!status.is_processing);
}

#[tokio::test]
async fn test_pause_during_structure_parks_job_once() {
    let provider = Blocking::on("structure");
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(provider.clone(), store.clone());

    let first = job("Learn Rust");
    orch.enqueue(first.clone());
    provider.wait_entered().await;

    orch.pause_queue();
    orch.pause_queue();
    provider.release.notify_one();
    let status = orch.wait_idle().await;

    assert!(status.is_paused);
    assert_eq!(status.queue.len(), 1);
    assert_eq!(status.queue[0].job_id, first.job_id);
    assert!(!status.queue[0].is_resume, "nothing was saved yet");
    assert!(store.list_all().unwrap().is_empty());

    orch.resume_queue();
    let status = orch.wait_idle().await;
    assert_eq!(status.completed_jobs, 1);
    assert!(status.queue.is_empty());
    assert_eq!(store.list_all().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pause_after_structure_resumes_same_roadmap() {
    let provider = Blocking::on("phase");
    let store = Arc::new(MemoryStore::recording());
    let orch = orchestrator(provider.clone(), store.clone());

    orch.enqueue(job("Learn Rust"));
    provider.wait_entered().await;
    orch.pause_queue();
    provider.release.notify_one();
    let status = orch.wait_idle().await;

    let parked = &status.queue[0];
    assert!(parked.is_resume);
    let roadmap_id = parked.roadmap_id.clone().unwrap();
    assert_eq!(store.get(&roadmap_id).unwrap().detailed_count(), 0);

    orch.resume_queue();
    let status = orch.wait_idle().await;
    assert_eq!(status.completed_jobs, 1);

    let roadmaps = store.list_all().unwrap();
    assert_eq!(roadmaps.len(), 1);
    assert_eq!(roadmaps[0].id, roadmap_id);
    // structure plus one save per phase; the discarded call saved nothing
    assert_eq!(store.history().len(), 4);
}

#[tokio::test]
async fn test_clear_stops_current_job_without_parking() {
    let provider = Blocking::on("phase");
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(provider.clone(), store.clone());

    orch.enqueue(job("Learn Rust"));
    orch.enqueue(job("Learn Go"));
    provider.wait_entered().await;

    assert_eq!(orch.clear_queue(), 1);
    provider.release.notify_one();
    let status = orch.wait_idle().await;

    assert!(status.queue.is_empty());
    assert_eq!(status.completed_jobs, 0);
    assert_eq!(status.failed_jobs, 0);
    let roadmaps = store.list_all().unwrap();
    assert_eq!(roadmaps.len(), 1, "structure checkpoint survives");
    assert_eq!(roadmaps[0].generation_state, GenerationState::InProgress);
}

#[tokio::test]
async fn test_removing_current_job_moves_on() {
    let provider = Blocking::on("structure");
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(provider.clone(), store.clone());

    let first = job("Learn Rust");
    orch.enqueue(first.clone());
    orch.enqueue(job("Learn Go"));
    provider.wait_entered().await;

    assert_eq!(orch.remove_from_queue(&first.job_id), 1);
    provider.release.notify_one();
    let status = orch.wait_idle().await;

    assert_eq!(status.completed_jobs, 1);
    let roadmaps = store.list_all().unwrap();
    assert_eq!(roadmaps.len(), 1);
    assert_eq!(roadmaps[0].objective, "Learn Go");
}

#[tokio::test]
async fn test_failed_job_records_error_and_next_job_runs() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(Arc::new(RejectsBad(DryRunProvider::new())), store.clone());

    orch.enqueue(job("bad"));
    orch.enqueue(job("good"));
    let status = orch.wait_idle().await;

    assert_eq!(status.failed_jobs, 1);
    assert_eq!(status.completed_jobs, 1);
    assert!(status.last_error.is_some());
    assert_eq!(store.list_all().unwrap().len(), 1);
}

#[tokio::test]
async fn test_move_job_reorders_queue() {
    let orch = orchestrator(Arc::new(DryRunProvider::new()), Arc::new(MemoryStore::new()));
    orch.pause_queue();
    let jobs: Vec<_> = ["a", "b", "c"].into_iter().map(job).collect();
    for j in &jobs {
        orch.enqueue(j.clone());
    }

    assert!(orch.move_job(&jobs[2].job_id, 0));
    assert!(!orch.move_job("missing", 0));
    let order: Vec<_> = orch.status().queue.into_iter().map(|j| j.objective).collect();
    assert_eq!(order, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_retry_and_regenerate_targets() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(Arc::new(DryRunProvider::new()), store.clone());

    orch.enqueue(job("Learn Rust"));
    orch.wait_idle().await;
    let done = store.list_all().unwrap().remove(0);

    assert!(matches!(
        orch.retry(&done.id),
        Err(GenerationError::AlreadyComplete { .. })
    ));
    assert!(matches!(
        orch.retry("missing"),
        Err(GenerationError::Persistence(StoreError::NotFound { .. }))
    ));

    let partial = store
        .save(&Roadmap::new("Learn Go", "Ship a service", ""))
        .unwrap();
    assert!(orch.retry(&partial.id).unwrap());
    orch.wait_idle().await;
    assert!(store.get(&partial.id).unwrap().is_fully_detailed());

    assert!(orch.regenerate(&done.id).unwrap());
    let status = orch.wait_idle().await;
    assert_eq!(status.completed_jobs, 3);
    let regenerated = store.get(&done.id).unwrap();
    assert_eq!(regenerated.created_at, done.created_at);
    assert_eq!(store.list_all().unwrap().len(), 2);
}
