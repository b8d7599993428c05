//! Background refresh of the sensor store.
//!
//! The refresher polls a [`SensorSource`] on a fixed interval and applies
//! each result to the store as one combined replace. The store's
//! stop-refreshing flag is checked before each fetch and again before the
//! result is applied, so setting it from any thread stops the next mutation
//! without interrupting a fetch in progress. A loop waiting for its next
//! tick wakes as soon as the flag is set.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::SensorSource;
use crate::error::Result;
use crate::store::SensorStore;

/// Result of a single refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New data was written to the store.
    Applied,
    /// The stop-refreshing flag was set; the store was left alone.
    Skipped,
}

/// Shortest accepted polling period.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

pub struct Refresher {
    store: Arc<SensorStore>,
    source: Arc<dyn SensorSource>,
    interval: Duration,
}

impl Refresher {
    /// Periods below [`MIN_INTERVAL`] are raised to it.
    pub fn new(store: Arc<SensorStore>, source: Arc<dyn SensorSource>, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            warn!(
                "[Refresh] Interval {:?} is too short, using {:?}",
                interval, MIN_INTERVAL
            );
        }
        Self {
            store,
            source,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch from the source once and apply the result.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome> {
        if self.store.stop_refreshing() {
            return Ok(RefreshOutcome::Skipped);
        }

        let snapshot = self.source.fetch().await?;

        if self.store.stop_refreshing() {
            debug!(
                "[Refresh] Discarding {} result, refreshing was stopped",
                self.source.name()
            );
            return Ok(RefreshOutcome::Skipped);
        }

        self.store.replace_all(snapshot.groups, snapshot.sensors);
        Ok(RefreshOutcome::Applied)
    }

    /// Spawn the polling loop.
    ///
    /// The task ends once the store's stop-refreshing flag is set, without
    /// waiting for the next tick.
    /// Fetch failures are logged and retried on the next tick. Returns a
    /// `JoinHandle` that can also be used to abort the task on shutdown.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        info!(
            "[Refresh] Polling {} every {:?}",
            self.source.name(),
            self.interval
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.store.stopped() => break,
            }
            match self.refresh_once().await {
                Ok(RefreshOutcome::Applied) => {
                    debug!(
                        "[Refresh] Applied {} groups, {} sensors",
                        self.store.groups().len(),
                        self.store.sensor_count()
                    );
                }
                Ok(RefreshOutcome::Skipped) => break,
                Err(e) => {
                    warn!("[Refresh] {} fetch failed: {}", self.source.name(), e);
                }
            }
        }

        info!("[Refresh] Stopped polling {}", self.source.name());
    }
}
