//! JSON-file snapshot store with hot reload.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use super::error::StoreError;
use super::index::SnapshotIndex;
use super::store::{SnapshotProvider, SnapshotStore, SnapshotVersion};
use super::types::SnapshotData;

/// Holds the current snapshot and swaps it on reload.
///
/// Readers pin the current [`SnapshotIndex`] via [`SnapshotProvider::current`]
/// and keep using it even if a reload swaps in a newer one meanwhile.
pub struct JsonSnapshotStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<SnapshotIndex>>,
}

impl JsonSnapshotStore {
    /// Load a snapshot from a JSON file.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let index = load(&path).await?;
        info!(
            path = %path.display(),
            version = %index.version(),
            stations = index.station_count(),
            "loaded snapshot"
        );
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(index)),
        })
    }

    /// Build a store from in-memory data. Such a store cannot be reloaded
    /// from disk, only [`replace`](Self::replace)d.
    pub fn from_data(data: SnapshotData) -> Result<Self, StoreError> {
        Ok(Self {
            path: None,
            current: RwLock::new(Arc::new(SnapshotIndex::build(data)?)),
        })
    }

    /// The pinned current snapshot.
    pub fn snapshot(&self) -> Arc<SnapshotIndex> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Version of the current snapshot.
    pub fn version(&self) -> SnapshotVersion {
        self.snapshot().version()
    }

    /// Re-read the backing file.
    ///
    /// Returns `true` if the content changed and a new snapshot was swapped
    /// in. On failure the current snapshot is kept.
    pub async fn reload(&self) -> Result<bool, StoreError> {
        let path = self.path.as_deref().ok_or(StoreError::NotReloadable)?;
        let index = load(path).await?;
        Ok(self.swap(index))
    }

    /// Replace the snapshot with new data.
    pub fn replace(&self, data: SnapshotData) -> Result<bool, StoreError> {
        let index = SnapshotIndex::build(data)?;
        Ok(self.swap(index))
    }

    fn swap(&self, index: SnapshotIndex) -> bool {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        if guard.version() == index.version() {
            debug!(version = %index.version(), "snapshot unchanged");
            return false;
        }
        info!(
            from = %guard.version(),
            to = %index.version(),
            stations = index.station_count(),
            "snapshot replaced"
        );
        *guard = Arc::new(index);
        true
    }
}

impl SnapshotProvider for JsonSnapshotStore {
    fn current(&self) -> Arc<dyn SnapshotStore> {
        self.snapshot()
    }
}

async fn load(path: &Path) -> Result<SnapshotIndex, StoreError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data: SnapshotData = serde_json::from_slice(&bytes)?;
    SnapshotIndex::build(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StationId;
    use crate::snapshot::fixtures::two_platform_station;

    fn write_snapshot(file: &tempfile::NamedTempFile, data: &SnapshotData) {
        let json = serde_json::to_vec(data).unwrap();
        std::fs::write(file.path(), json).unwrap();
    }

    #[tokio::test]
    async fn open_and_query() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_snapshot(&file, &two_platform_station());

        let store = JsonSnapshotStore::open(file.path()).await.unwrap();
        let snap = store.current();
        assert!(snap.station(StationId(100)).unwrap().is_some());
        assert_eq!(snap.station_members(StationId(100)).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reload_bumps_version_only_on_change() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut data = two_platform_station();
        data.version = None;
        write_snapshot(&file, &data);

        let store = JsonSnapshotStore::open(file.path()).await.unwrap();
        let before = store.version();
        assert!(!store.reload().await.unwrap());
        assert_eq!(store.version(), before);

        data.stations[0].name = "Strasbourg-Ville".into();
        write_snapshot(&file, &data);
        assert!(store.reload().await.unwrap());
        assert_ne!(store.version(), before);
    }

    #[tokio::test]
    async fn failed_reload_keeps_current() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_snapshot(&file, &two_platform_station());
        let store = JsonSnapshotStore::open(file.path()).await.unwrap();
        let before = store.version();

        std::fs::write(file.path(), b"{ not json").unwrap();
        assert!(matches!(store.reload().await, Err(StoreError::Parse(_))));
        assert_eq!(store.version(), before);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = JsonSnapshotStore::open("/definitely/not/here.json")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[tokio::test]
    async fn in_memory_store_is_not_reloadable() {
        let store = JsonSnapshotStore::from_data(two_platform_station()).unwrap();
        assert!(matches!(
            store.reload().await,
            Err(StoreError::NotReloadable)
        ));

        let mut data = two_platform_station();
        data.version = Some(2);
        assert!(store.replace(data).unwrap());
        assert_eq!(store.version(), SnapshotVersion(2));
    }
}
