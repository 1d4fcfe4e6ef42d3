use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use roadmapper_utils::error::StoreError;

use crate::RoadmapStore;
use crate::model::Roadmap;
use crate::slug::{slugify, unique_slug};

/// In-process store for tests and embedding.
///
/// Only the latest version of each roadmap is kept unless the store was
/// built with [`MemoryStore::recording`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    record_history: bool,
}

#[derive(Debug, Default)]
struct Inner {
    roadmaps: BTreeMap<String, Roadmap>,
    history: Vec<Roadmap>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that also keeps every saved snapshot, so tests can inspect
    /// the checkpoint sequence. The history is never trimmed.
    #[must_use]
    pub fn recording() -> Self {
        Self {
            record_history: true,
            ..Self::default()
        }
    }

    /// Every roadmap passed to `save`, in call order, as stored. Empty
    /// unless the store is [recording](MemoryStore::recording).
    #[must_use]
    pub fn history(&self) -> Vec<Roadmap> {
        self.lock().history.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoadmapStore for MemoryStore {
    fn save(&self, roadmap: &Roadmap) -> Result<Roadmap, StoreError> {
        let mut inner = self.lock();
        let mut stored = roadmap.clone();
        if stored.id.is_empty() {
            let title = if stored.title.is_empty() {
                &stored.objective
            } else {
                &stored.title
            };
            stored.id = unique_slug(&slugify(title), |c| inner.roadmaps.contains_key(c));
        }
        stored.updated_at = Utc::now();
        inner.roadmaps.insert(stored.id.clone(), stored.clone());
        if self.record_history {
            inner.history.push(stored.clone());
        }
        Ok(stored)
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.lock()
            .roadmaps
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    fn list_all(&self) -> Result<Vec<Roadmap>, StoreError> {
        let mut all: Vec<_> = self.lock().roadmaps.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    fn get(&self, id: &str) -> Result<Roadmap, StoreError> {
        self.lock()
            .roadmaps
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}
