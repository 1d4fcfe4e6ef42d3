//! Resuming from documents on disk across orchestrator instances, as happens
//! after a crash or a Ctrl-C.

mod test_support;

use camino::Utf8Path;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use roadmapper::{FileStore, GenerationState, RoadmapJob, RoadmapStore, StoreError, StoreLock};
use test_support::{ScriptedProvider, orchestrator};

fn open_store(temp: &TempDir) -> Arc<FileStore> {
    let root = temp.path().join("roadmaps");
    Arc::new(FileStore::open(root.to_str().unwrap().to_string()).unwrap())
}

fn json_documents(temp: &TempDir) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(temp.path().join("roadmaps"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".json"))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_new_process_resumes_from_first_undetailed_phase() {
    let temp = TempDir::new().unwrap();

    let roadmap_id = {
        let provider = ScriptedProvider::new();
        let orch = orchestrator(provider.clone(), open_store(&temp), &["m1"]);
        let gate = provider.gate("phase-3");
        orch.enqueue(RoadmapJob::new("Learn Rust", "Write a CLI tool", "beginner"));
        gate.entered().await;
        orch.pause_queue();
        gate.release();
        let status = orch.wait_idle().await;
        status.queue[0].roadmap_id.clone().unwrap()
    };
    assert_eq!(json_documents(&temp), vec![format!("{roadmap_id}.json")]);

    let provider = ScriptedProvider::new();
    let store = open_store(&temp);
    let orch = orchestrator(provider.clone(), store.clone(), &["m1"]);
    assert!(orch.retry(&roadmap_id).unwrap());
    let status = orch.wait_idle().await;

    assert_eq!(status.completed_jobs, 1);
    assert_eq!(provider.units(), vec!["phase-3"]);
    assert_eq!(json_documents(&temp).len(), 1);

    let roadmap = store.get(&roadmap_id).unwrap();
    assert_eq!(roadmap.generation_state, GenerationState::Completed);
    assert_eq!(roadmap.starting_level, "beginner");

    let raw: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("roadmaps").join(format!("{roadmap_id}.json")))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(raw["generationState"], "completed");
    assert_ne!(raw["phases"][2]["goal"], "...");
}

#[tokio::test]
async fn test_regenerate_replaces_document_under_same_id() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let provider = ScriptedProvider::new();
    let orch = orchestrator(provider.clone(), store.clone(), &["m1"]);

    orch.enqueue(RoadmapJob::new("Learn Rust", "Write a CLI tool", ""));
    orch.wait_idle().await;
    let original = store.list_all().unwrap().remove(0);

    assert!(orch.regenerate(&original.id).unwrap());
    let status = orch.wait_idle().await;

    assert_eq!(status.completed_jobs, 2);
    assert_eq!(json_documents(&temp).len(), 1);
    let regenerated = store.get(&original.id).unwrap();
    assert_eq!(regenerated.created_at, original.created_at);
    assert!(regenerated.updated_at >= original.updated_at);
    assert_eq!(provider.calls().len(), 8);
}

#[test]
fn test_second_worker_is_refused_the_store() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("roadmaps");
    let dir = Utf8Path::new(dir.to_str().unwrap());

    let held = StoreLock::acquire(dir).unwrap();
    assert!(matches!(
        StoreLock::acquire(dir),
        Err(StoreError::Locked { .. })
    ));
    drop(held);
    assert!(StoreLock::acquire(dir).is_ok());
}
