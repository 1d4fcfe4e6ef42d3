use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use std::fs;
use std::io;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use roadmapper_utils::atomic_write::write_file_atomic;
use roadmapper_utils::error::StoreError;

use crate::RoadmapStore;
use crate::model::Roadmap;
use crate::slug::{is_valid_id, slugify, unique_slug};

const DOCUMENT_EXT: &str = "json";

/// One pretty-printed JSON document per roadmap under `root`.
///
/// Each save is an atomic replace, so a crash mid-write leaves the previous
/// checkpoint intact.
#[derive(Debug)]
pub struct FileStore {
    root: Utf8PathBuf,
    // Serializes id allocation with the write that claims it
    write_guard: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        debug!(root = %root, "Opened file store");
        Ok(Self {
            root,
            write_guard: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Utf8PathBuf {
        self.root.join(format!("{id}.{DOCUMENT_EXT}"))
    }

    fn read_document(path: &Utf8Path) -> Result<Roadmap, StoreError> {
        let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: path.into(),
            reason: e.to_string(),
        })
    }
}

impl RoadmapStore for FileStore {
    fn save(&self, roadmap: &Roadmap) -> Result<Roadmap, StoreError> {
        let _guard = self.write_guard.lock().unwrap_or_else(PoisonError::into_inner);

        let mut stored = roadmap.clone();
        if stored.id.is_empty() {
            let title = if stored.title.is_empty() {
                &stored.objective
            } else {
                &stored.title
            };
            stored.id = unique_slug(&slugify(title), |candidate| {
                self.path_for(candidate).exists()
            });
        } else if !is_valid_id(&stored.id) {
            return Err(StoreError::Serialize {
                id: stored.id,
                reason: "id must be a lowercase slug".to_string(),
            });
        }
        stored.updated_at = Utc::now();

        let json = serde_json::to_string_pretty(&stored).map_err(|e| StoreError::Serialize {
            id: stored.id.clone(),
            reason: e.to_string(),
        })?;

        let path = self.path_for(&stored.id);
        let result = write_file_atomic(&path, &json).map_err(|e| StoreError::io(&path, e))?;
        if result.rename_retry_count > 0 || result.used_cross_filesystem_fallback {
            debug!(
                path = %path,
                retries = result.rename_retry_count,
                fallback = result.used_cross_filesystem_fallback,
                "Roadmap write needed recovery"
            );
        }

        Ok(stored)
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        let _guard = self.write_guard.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound { id: id.to_string() })
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    fn list_all(&self) -> Result<Vec<Roadmap>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;

        let mut roadmaps = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if path.extension() != Some(DOCUMENT_EXT) {
                continue;
            }
            // One unreadable document must not hide the rest
            match Self::read_document(&path) {
                Ok(roadmap) => roadmaps.push(roadmap),
                Err(e) => warn!(path = %path, error = %e, "Skipping unreadable roadmap"),
            }
        }

        roadmaps.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(roadmaps)
    }

    fn get(&self, id: &str) -> Result<Roadmap, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Self::read_document(&path)
    }
}
