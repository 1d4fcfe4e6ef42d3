//! Durable roadmap storage.
//!
//! [`RoadmapStore`] is the persistence seam the generation engine
//! checkpoints through. Writes are full-document upserts keyed by a slug id
//! derived from the title; last writer wins. Only one worker writes a given
//! roadmap during generation, and [`StoreLock`] keeps a second worker process
//! off the same directory.

mod file_store;
mod lock;
mod memory;
pub mod model;
pub mod slug;

pub use file_store::FileStore;
pub use lock::{LockInfo, StoreLock};
pub use memory::MemoryStore;
pub use model::{GenerationState, MiniGoal, Phase, Project, Resource, Roadmap, SENTINEL_GOAL};
pub use roadmapper_utils::error::StoreError;

/// Upsert/remove/list access to stored roadmaps.
pub trait RoadmapStore: Send + Sync {
    /// Insert or replace a roadmap, returning the stored copy.
    ///
    /// A roadmap with an empty id gets a unique slug of its title. The
    /// returned copy carries the assigned id and a fresh `updated_at`.
    fn save(&self, roadmap: &Roadmap) -> Result<Roadmap, StoreError>;

    /// Remove a roadmap by id.
    fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Every stored roadmap, oldest first.
    fn list_all(&self) -> Result<Vec<Roadmap>, StoreError>;

    fn get(&self, id: &str) -> Result<Roadmap, StoreError> {
        self.list_all()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}
