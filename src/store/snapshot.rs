//! Snapshot persistence.
//!
//! A snapshot is the store's content as plain JSON: the groups in display
//! order and a flat list of sensors, each naming its group. It is what the
//! daemon writes on exit and what the snapshot source reads on refresh.

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::{Sensor, SensorGroup};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub groups: Vec<SensorGroup>,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

impl Snapshot {
    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        Ok(snapshot)
    }

    /// Read a snapshot file, falling back to an empty snapshot.
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<Snapshot>(&bytes) {
                Ok(snapshot) => {
                    info!(
                        "Loaded {} groups and {} sensors from {:?}",
                        snapshot.groups.len(),
                        snapshot.sensors.len(),
                        path
                    );
                    snapshot
                }
                Err(e) => {
                    warn!("Failed to parse snapshot file: {}", e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No snapshot found at {:?} (first run)", path);
                Self::default()
            }
            Err(e) => {
                error!("Failed to read snapshot file: {}", e);
                Self::default()
            }
        }
    }

    /// Write the snapshot as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        info!(
            "Saved {} groups and {} sensors to {:?}",
            self.groups.len(),
            self.sensors.len(),
            path
        );
        Ok(())
    }
}
