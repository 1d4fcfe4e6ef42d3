//! Common helper functions used across CLI commands
//!
//! Store opening and worker session setup shared by the draining commands.

use std::sync::Arc;
use tracing::debug;

use crate::{
    Config, FileStore, Orchestrator, OrchestratorOptions, RoadmapperError, StoreLock,
};

/// Open the configured store without taking the worker lock (read-only
/// commands and deletes).
pub fn open_store(config: &Config) -> Result<FileStore, RoadmapperError> {
    Ok(FileStore::open(config.store_dir())?)
}

/// Everything a draining command needs. The store lock is held until the
/// session is dropped.
pub struct WorkerSession {
    pub orchestrator: Orchestrator,
    pub store: Arc<FileStore>,
    _lock: StoreLock,
}

impl WorkerSession {
    /// Lock the store, build the provider and start an orchestrator.
    ///
    /// The lock is taken first so a second worker fails fast with
    /// `LOCK_HELD` before any provider setup.
    pub fn open(config: &Config) -> Result<Self, RoadmapperError> {
        let store_dir = config.store_dir();
        let lock = StoreLock::acquire(&store_dir)?;
        debug!(lock = %lock.path(), pid = lock.info().pid, "Acquired store lock");

        let store = Arc::new(FileStore::open(store_dir)?);
        let provider = roadmapper_llm::from_config(config)?;
        let orchestrator = Orchestrator::new(
            provider,
            store.clone(),
            OrchestratorOptions::from_config(config),
        )?;

        Ok(Self {
            orchestrator,
            store,
            _lock: lock,
        })
    }
}
