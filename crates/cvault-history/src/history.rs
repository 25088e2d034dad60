use std::sync::{Arc, Mutex};

use cvault_codec::Obfuscator;
use cvault_store::SessionStorage;
use cvault_types::{Clock, CvVersion, SystemClock, VersionId, VersionMetadata};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::HistoryConfig;
use crate::error::HistoryResult;
use crate::export::{Artifact, ArtifactSink};
use crate::summary::{StorageStats, VersionSummary};

/// Size-bounded, newest-first history of generated CVs.
///
/// The whole list is stored as one obfuscated JSON array under one storage
/// key. Every mutation is a read-modify-write of that key, serialized by an
/// internal lock so a shared `Arc<CvHistory>` stays consistent.
pub struct CvHistory<S> {
    storage: S,
    obfuscator: Obfuscator,
    storage_key: String,
    max_versions: usize,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl<S: SessionStorage> CvHistory<S> {
    /// History with the default key, obfuscation key and capacity.
    pub fn new(storage: S) -> Self {
        let config = HistoryConfig::default();
        Self {
            storage,
            obfuscator: Obfuscator::default(),
            storage_key: config.storage_key,
            max_versions: config.max_versions,
            clock: Arc::new(SystemClock),
            write_lock: Mutex::new(()),
        }
    }

    /// History using a validated configuration.
    pub fn with_config(storage: S, config: &HistoryConfig) -> HistoryResult<Self> {
        config.validate()?;
        Ok(Self {
            storage,
            obfuscator: config.obfuscator()?,
            storage_key: config.storage_key.clone(),
            max_versions: config.max_versions,
            clock: Arc::new(SystemClock),
            write_lock: Mutex::new(()),
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    // ---- Save ----

    /// Save a CV as the newest version, evicting the oldest past capacity.
    ///
    /// Returns the new id, or `None` if the content could not be serialized
    /// or the storage write failed. On failure the stored history is
    /// unchanged.
    pub fn save_version<T>(&self, cv_data: &T, metadata: VersionMetadata) -> Option<VersionId>
    where
        T: Serialize + ?Sized,
    {
        match self.try_save_version(cv_data, metadata) {
            Ok(id) => Some(id),
            Err(e) => {
                error!(error = %e, "failed to save CV version");
                None
            }
        }
    }

    pub fn try_save_version<T>(&self, cv_data: &T, metadata: VersionMetadata) -> HistoryResult<VersionId>
    where
        T: Serialize + ?Sized,
    {
        let cv_content = serde_json::to_value(cv_data)?;

        let _guard = self.write_lock.lock().expect("lock poisoned");
        let mut versions = self.load();

        let now = self.clock.now();
        let now_ms = now.timestamp_millis().max(0) as u64;
        // Two saves in the same millisecond: step past the newest id.
        let id_ms = match versions.first() {
            Some(newest) if newest.id.as_millis() >= now_ms => {
                match newest.id.as_millis().checked_add(1) {
                    Some(next) => next,
                    None => {
                        warn!(newest = %newest.id, "newest CV version id is exhausted; using the clock");
                        now_ms
                    }
                }
            }
            _ => now_ms,
        };
        let id = VersionId::from_millis(id_ms);
        let timestamp = if id_ms == now_ms {
            now
        } else {
            id.to_datetime().unwrap_or(now)
        };

        versions.insert(
            0,
            CvVersion {
                id,
                timestamp,
                cv_content,
                metadata: metadata.normalized(),
            },
        );
        let evicted = versions.len().saturating_sub(self.max_versions);
        versions.truncate(self.max_versions);

        self.persist(&versions)?;
        debug!(%id, count = versions.len(), evicted, "saved CV version");
        Ok(id)
    }

    // ---- Read ----

    /// All stored versions, newest first.
    ///
    /// A missing, unreadable or corrupt stored value yields an empty list.
    pub fn list_versions(&self) -> Vec<CvVersion> {
        self.load()
    }

    pub fn get_version(&self, id: VersionId) -> Option<CvVersion> {
        self.list_versions().into_iter().find(|v| v.id == id)
    }

    pub fn get_latest(&self) -> Option<CvVersion> {
        self.list_versions().into_iter().next()
    }

    // ---- Delete ----

    /// Remove one version.
    ///
    /// Returns `true` only if a version with `id` existed and the updated
    /// list was written. Returns `false` when nothing matched or the write
    /// failed.
    pub fn delete_version(&self, id: VersionId) -> bool {
        match self.try_delete_version(id) {
            Ok(removed) => removed,
            Err(e) => {
                error!(%id, error = %e, "failed to delete CV version");
                false
            }
        }
    }

    /// `Ok(false)` means no version matched; nothing is written in that case.
    pub fn try_delete_version(&self, id: VersionId) -> HistoryResult<bool> {
        let _guard = self.write_lock.lock().expect("lock poisoned");
        let mut versions = self.load();
        let Some(index) = versions.iter().position(|v| v.id == id) else {
            debug!(%id, "delete requested for unknown CV version");
            return Ok(false);
        };
        versions.remove(index);
        self.persist(&versions)?;
        debug!(%id, remaining = versions.len(), "deleted CV version");
        Ok(true)
    }

    /// Drop the whole history.
    pub fn clear_all(&self) {
        let _guard = self.write_lock.lock().expect("lock poisoned");
        match self.storage.remove_item(&self.storage_key) {
            Ok(()) => debug!(key = %self.storage_key, "cleared CV history"),
            Err(e) => warn!(key = %self.storage_key, error = %e, "failed to clear CV history"),
        }
    }

    // ---- Export ----

    /// Pretty-printed JSON of one version, named `cv_{style}_{id}.json`.
    pub fn export_artifact(&self, id: VersionId) -> Option<Artifact> {
        let version = self.get_version(id)?;
        match serde_json::to_string_pretty(&version) {
            Ok(json) => Some(Artifact::new(version.export_file_name(), json)),
            Err(e) => {
                error!(%id, error = %e, "failed to serialize CV version for export");
                None
            }
        }
    }

    /// Hand one version to `sink`. Returns `false` if the id is unknown or
    /// the sink refused the artifact.
    pub fn export_version(&self, id: VersionId, sink: &dyn ArtifactSink) -> bool {
        let Some(artifact) = self.export_artifact(id) else {
            return false;
        };
        match sink.emit(&artifact) {
            Ok(()) => {
                debug!(%id, file = %artifact.file_name, "exported CV version");
                true
            }
            Err(e) => {
                error!(%id, file = %artifact.file_name, error = %e, "failed to export CV version");
                false
            }
        }
    }

    // ---- Projections ----

    pub fn summaries(&self) -> Vec<VersionSummary> {
        let now = self.clock.now();
        self.list_versions()
            .iter()
            .map(|v| VersionSummary::from_version(v, now))
            .collect()
    }

    pub fn storage_stats(&self) -> StorageStats {
        let stored_len = self.read_raw().map_or(0, |raw| raw.len());
        StorageStats::compute(&self.list_versions(), self.max_versions, stored_len)
    }

    // ---- Internals ----

    fn read_raw(&self) -> Option<String> {
        match self.storage.get_item(&self.storage_key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.storage_key, error = %e, "failed to read CV history");
                None
            }
        }
    }

    /// Decoded list, capped at `max_versions` so every caller sees the same view.
    fn load(&self) -> Vec<CvVersion> {
        let Some(raw) = self.read_raw() else {
            return Vec::new();
        };
        match self.obfuscator.decode_json::<Vec<CvVersion>>(&raw) {
            Ok(mut versions) => {
                versions.truncate(self.max_versions);
                versions
            }
            Err(e) => {
                warn!(key = %self.storage_key, error = %e, "stored CV history is unreadable; treating as empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, versions: &[CvVersion]) -> HistoryResult<()> {
        let encoded = self.obfuscator.encode_json(versions)?;
        self.storage.set_item(&self.storage_key, &encoded)?;
        Ok(())
    }
}

impl<S> std::fmt::Debug for CvHistory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CvHistory")
            .field("storage_key", &self.storage_key)
            .field("max_versions", &self.max_versions)
            .finish()
    }
}
