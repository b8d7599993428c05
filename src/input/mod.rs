//! Input sources for the sensor store.
//!
//! A [`SensorSource`] produces the full set of groups and sensors on demand.
//! The [`Refresher`] polls a source and applies what it returns to the store.
//!
//! Current input sources:
//! - `simulation`: generated groups and jittered readings for development
//! - `snapshot`: a JSON snapshot file re-read on every refresh

pub mod refresher;
pub mod simulation;
pub mod snapshot;

pub use refresher::{RefreshOutcome, Refresher};
pub use simulation::SimulatedSource;
pub use snapshot::SnapshotSource;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Sensor, SensorGroup};
use crate::store::Snapshot;

/// Backend that can report the current groups and sensors.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    async fn fetch_groups(&self) -> Result<Vec<SensorGroup>>;

    async fn fetch_sensors(&self) -> Result<Vec<Sensor>>;

    /// Groups and sensors read together, as the refresher applies them.
    ///
    /// Fetches groups, then sensors. Sources that can read both from one
    /// version of their data override this.
    async fn fetch(&self) -> Result<Snapshot> {
        let groups = self.fetch_groups().await?;
        let sensors = self.fetch_sensors().await?;
        Ok(Snapshot { groups, sensors })
    }
}
