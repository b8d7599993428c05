//! Snapshot file input source.

use async_trait::async_trait;
use std::path::PathBuf;

use super::SensorSource;
use crate::error::{Result, StoreError};
use crate::model::{Sensor, SensorGroup};
use crate::store::Snapshot;

/// Reads groups and sensors from a JSON snapshot file on every fetch.
///
/// Lets another process, or a person with an editor, drive the display.
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<Snapshot> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Snapshot::load(&path))
            .await
            .map_err(|e| StoreError::Source(e.to_string()))?
    }
}

#[async_trait]
impl SensorSource for SnapshotSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn fetch_groups(&self) -> Result<Vec<SensorGroup>> {
        Ok(self.read().await?.groups)
    }

    async fn fetch_sensors(&self) -> Result<Vec<Sensor>> {
        Ok(self.read().await?.sensors)
    }

    /// One read of the file, so groups and sensors match.
    async fn fetch(&self) -> Result<Snapshot> {
        self.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupId, SensorKind};
    use tempfile::TempDir;
    use tokio_test::assert_err;

    #[tokio::test]
    async fn test_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        Snapshot {
            groups: vec![SensorGroup::new("roof", "Roof")],
            sensors: vec![Sensor::new("wind", "Wind", SensorKind::Distance).in_group("roof")],
        }
        .save(&path)
        .unwrap();

        let source = SnapshotSource::new(&path);
        assert_eq!(source.fetch_groups().await.unwrap().len(), 1);
        assert_eq!(source.fetch_sensors().await.unwrap()[0].id.as_str(), "wind");
    }

    #[tokio::test]
    async fn test_fetch_reads_one_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        let version = |n: u32| {
            let group = GroupId::new(format!("g{}", n));
            Snapshot {
                groups: vec![SensorGroup::new(group.clone(), "G")],
                sensors: vec![Sensor::new("rain", "Rain", SensorKind::Distance).in_group(group)],
            }
        };

        let source = SnapshotSource::new(&path);
        for n in 0..3 {
            version(n).save(&path).unwrap();
            let snapshot = source.fetch().await.unwrap();
            assert_eq!(snapshot, version(n));

            let store = crate::store::SensorStore::new();
            store.restore(snapshot);
            assert!(store.ungrouped().is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let source = SnapshotSource::new(dir.path().join("missing.json"));
        assert_err!(source.fetch_groups().await);
        assert_err!(source.fetch().await);
    }
}
