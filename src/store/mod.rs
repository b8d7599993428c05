//! Sensor store.
//!
//! [`SensorStore`] is the single in-memory copy of the sensor groups and
//! sensors the display shows. It is filled wholesale by refreshes and
//! reordered by the user, and publishes [`StoreEvent`]s to subscribed
//! observers after every mutation.
//!
//! State lives behind one `RwLock` as a set of `Arc` snapshots. A mutation
//! builds the new snapshots and swaps them in under the write guard, so a
//! reader sees either the old state or the new one. Events are published
//! after the guard is released.

pub mod diff;
pub mod notifier;
pub mod snapshot;

pub use diff::{ChangeScope, ChangeSet};
pub use notifier::{StoreEvent, StoreNotifier, Subscription};
pub use snapshot::Snapshot;

use indexmap::IndexMap;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use crate::error::{Result, StoreError};
use crate::model::{GroupId, Identified, Sensor, SensorGroup};

/// Group identifier to the ordered sensors displayed in that group.
pub type SensorMap = IndexMap<GroupId, Vec<Sensor>>;

/// Location of a sensor in display order: group index, then index within
/// the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub group: usize,
    pub sensor: usize,
}

impl Position {
    pub fn new(group: usize, sensor: usize) -> Self {
        Self { group, sensor }
    }
}

impl From<(usize, usize)> for Position {
    fn from((group, sensor): (usize, usize)) -> Self {
        Self::new(group, sensor)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.group, self.sensor)
    }
}

#[derive(Default)]
struct StoreState {
    groups: Arc<Vec<SensorGroup>>,
    /// One entry per distinct group id, in group order.
    sensors: Arc<SensorMap>,
    /// Sensors without a group, or whose group is not in `groups`.
    ungrouped: Arc<Vec<Sensor>>,
}

impl StoreState {
    /// Every sensor in display order, ungrouped ones last.
    fn all_sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.values().flatten().chain(self.ungrouped.iter())
    }
}

/// Split `sensors` into per-group lists following the order of `groups`.
fn partition(
    groups: &[SensorGroup],
    sensors: impl IntoIterator<Item = Sensor>,
) -> (SensorMap, Vec<Sensor>) {
    let mut mapping: SensorMap = groups
        .iter()
        .map(|group| (group.id.clone(), Vec::new()))
        .collect();
    let mut ungrouped = Vec::new();

    for sensor in sensors {
        match sensor
            .group_id
            .as_ref()
            .and_then(|id| mapping.get_mut(id))
        {
            Some(list) => list.push(sensor),
            None => ungrouped.push(sensor),
        }
    }

    (mapping, ungrouped)
}

/// Keep the first item for every id, warning about the rest.
fn dedup_by_id<T>(items: Vec<T>, kind: &str) -> Vec<T>
where
    T: Identified,
    T::Id: fmt::Display,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| {
            let first = seen.insert(item.id().clone());
            if !first {
                warn!("[Store] Dropping duplicate {} {}", kind, item.id());
            }
            first
        })
        .collect()
}

/// Authoritative store of sensor groups and sensors.
///
/// Shared as `Arc<SensorStore>` between the refresher, observers and
/// whatever handles user reordering.
///
/// # Example
/// ```ignore
/// let store = Arc::new(SensorStore::new());
/// let mut events = store.subscribe();
///
/// store.replace_groups(groups);
/// store.replace_sensors(sensors);
/// store.move_sensor((0, 0), (1, 1))?;
/// ```
pub struct SensorStore {
    state: RwLock<StoreState>,
    stop_refreshing: AtomicBool,
    /// Mirrors `stop_refreshing` so waiting tasks wake when it is set.
    stop_signal: watch::Sender<bool>,
    notifier: StoreNotifier,
}

impl Default for SensorStore {
    fn default() -> Self {
        Self {
            state: RwLock::default(),
            stop_refreshing: AtomicBool::new(false),
            stop_signal: watch::Sender::new(false),
            notifier: StoreNotifier::default(),
        }
    }
}

impl SensorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for reload and change events.
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    /// Current groups in display order.
    pub fn groups(&self) -> Arc<Vec<SensorGroup>> {
        self.state.read().groups.clone()
    }

    /// Current sensors, keyed by group id in group order.
    pub fn sensors(&self) -> Arc<SensorMap> {
        self.state.read().sensors.clone()
    }

    /// Sensors not attached to any current group.
    pub fn ungrouped(&self) -> Arc<Vec<Sensor>> {
        self.state.read().ungrouped.clone()
    }

    /// Owned copy of the groups for an editing flow.
    ///
    /// Changes to the copy only reach the store through
    /// [`replace_groups`](Self::replace_groups).
    pub fn groups_for_edit(&self) -> Vec<SensorGroup> {
        self.state.read().groups.as_ref().clone()
    }

    /// Sensors displayed in `group_id`, empty if the group is unknown.
    pub fn sensors_in(&self, group_id: &GroupId) -> Vec<Sensor> {
        self.state
            .read()
            .sensors
            .get(group_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of sensors, grouped or not.
    pub fn sensor_count(&self) -> usize {
        self.state.read().all_sensors().count()
    }

    pub fn is_empty(&self) -> bool {
        let state = self.state.read();
        state.groups.is_empty() && state.all_sensors().next().is_none()
    }

    /// Whether background refreshing should stop.
    pub fn stop_refreshing(&self) -> bool {
        self.stop_refreshing.load(Ordering::SeqCst)
    }

    /// Ask refreshers to stop before their next mutation. Safe from any thread.
    pub fn set_stop_refreshing(&self, stop: bool) {
        let old = self.stop_refreshing.swap(stop, Ordering::SeqCst);
        self.stop_signal.send_replace(stop);
        if old != stop {
            info!(
                "[Store] Refreshing {}",
                if stop { "stopped" } else { "resumed" }
            );
        }
    }

    /// Resolves once the stop-refreshing flag is set.
    pub async fn stopped(&self) {
        let mut signal = self.stop_signal.subscribe();
        // The sender lives in `self`, so this only returns once the flag is set
        let _ = signal.wait_for(|stop| *stop).await;
    }

    /// Replace the groups with `groups`.
    ///
    /// Existing sensors are re-attached to the new groups by id and keep
    /// their relative order; sensors whose group disappeared become
    /// ungrouped. If a group id occurs more than once only the first
    /// occurrence is kept. Publishes `Reload`, then a group `Change` when
    /// anything differs.
    pub fn replace_groups(&self, groups: Vec<SensorGroup>) {
        let groups = dedup_by_id(groups, "group");
        let changes = {
            let mut state = self.state.write();
            let changes = diff::diff(ChangeScope::Groups, state.groups.iter(), groups.iter());

            let sensors: Vec<Sensor> = state.all_sensors().cloned().collect();
            let (mapping, ungrouped) = partition(&groups, sensors);

            state.groups = Arc::new(groups);
            state.sensors = Arc::new(mapping);
            state.ungrouped = Arc::new(ungrouped);
            changes
        };

        debug!(
            "[Store] Groups replaced: {} inserted, {} updated, {} deleted",
            changes.inserted.len(),
            changes.updated.len(),
            changes.deleted.len()
        );
        self.publish([changes]);
    }

    /// Replace every sensor with `sensors`.
    ///
    /// Sensors are distributed to groups by their `group_id`. If an id occurs
    /// more than once only the first occurrence is kept. Publishes `Reload`,
    /// then a sensor `Change` when anything differs.
    pub fn replace_sensors(&self, sensors: Vec<Sensor>) {
        let sensors = dedup_by_id(sensors, "sensor");
        let changes = {
            let mut state = self.state.write();
            let (mapping, ungrouped) = partition(&state.groups, sensors);

            let new_order = mapping.values().flatten().chain(ungrouped.iter());
            let changes = diff::diff(ChangeScope::Sensors, state.all_sensors(), new_order);

            state.sensors = Arc::new(mapping);
            state.ungrouped = Arc::new(ungrouped);
            changes
        };

        debug!(
            "[Store] Sensors replaced: {} inserted, {} updated, {} deleted",
            changes.inserted.len(),
            changes.updated.len(),
            changes.deleted.len()
        );
        self.publish([changes]);
    }

    /// Replace groups and sensors together.
    ///
    /// Same rules as [`replace_groups`](Self::replace_groups) followed by
    /// [`replace_sensors`](Self::replace_sensors), but both are swapped in
    /// under one write guard, so no reader sees the new groups with the old
    /// sensors. Publishes a single `Reload`, then a group `Change` and a
    /// sensor `Change` for whichever differ.
    pub fn replace_all(&self, groups: Vec<SensorGroup>, sensors: Vec<Sensor>) {
        let groups = dedup_by_id(groups, "group");
        let sensors = dedup_by_id(sensors, "sensor");

        let (group_changes, sensor_changes) = {
            let mut state = self.state.write();
            let group_changes =
                diff::diff(ChangeScope::Groups, state.groups.iter(), groups.iter());

            let (mapping, ungrouped) = partition(&groups, sensors);
            let new_order = mapping.values().flatten().chain(ungrouped.iter());
            let sensor_changes = diff::diff(ChangeScope::Sensors, state.all_sensors(), new_order);

            state.groups = Arc::new(groups);
            state.sensors = Arc::new(mapping);
            state.ungrouped = Arc::new(ungrouped);
            (group_changes, sensor_changes)
        };

        debug!(
            "[Store] Replaced all: {} group changes, {} sensor changes",
            group_changes.len(),
            sensor_changes.len()
        );
        self.publish([group_changes, sensor_changes]);
    }

    /// Move the sensor at `from` to `to`.
    ///
    /// `to.sensor` is an index into the destination group after the sensor
    /// has been removed, so it may equal that group's length to append.
    /// Moving across groups updates the sensor's `group_id`. Out-of-range
    /// positions are rejected and leave the store untouched.
    ///
    /// Publishes a sensor `Change` computed exactly as
    /// [`replace_sensors`](Self::replace_sensors) would for the resulting
    /// list, and no `Reload`. A move onto its own position publishes nothing.
    pub fn move_sensor(&self, from: impl Into<Position>, to: impl Into<Position>) -> Result<()> {
        let (from, to) = (from.into(), to.into());

        let (moved, changes) = {
            let mut state = self.state.write();
            let group_count = state.groups.len();

            let group_at = |index: usize| -> Result<GroupId> {
                state
                    .groups
                    .get(index)
                    .map(|group| group.id.clone())
                    .ok_or(StoreError::GroupOutOfBounds {
                        index,
                        len: group_count,
                    })
            };
            let source = group_at(from.group)?;
            let destination = group_at(to.group)?;

            let source_len = state.sensors.get(&source).map_or(0, Vec::len);
            if from.sensor >= source_len {
                return Err(StoreError::SensorOutOfBounds {
                    position: from,
                    len: source_len,
                });
            }
            let destination_len = if source == destination {
                source_len - 1
            } else {
                state.sensors.get(&destination).map_or(0, Vec::len)
            };
            if to.sensor > destination_len {
                return Err(StoreError::SensorOutOfBounds {
                    position: to,
                    len: destination_len,
                });
            }

            let before = state.sensors.clone();
            let mapping = Arc::make_mut(&mut state.sensors);
            let Some(list) = mapping.get_mut(&source) else {
                return Err(StoreError::SensorOutOfBounds {
                    position: from,
                    len: 0,
                });
            };
            let mut sensor = list.remove(from.sensor);
            sensor.group_id = Some(destination.clone());
            let id = sensor.id.clone();
            mapping
                .entry(destination)
                .or_default()
                .insert(to.sensor, sensor);

            let old_order = before.values().flatten().chain(state.ungrouped.iter());
            let changes = diff::diff(ChangeScope::Sensors, old_order, state.all_sensors());
            (id, changes)
        };

        debug!("[Store] Moved sensor {} from {} to {}", moved, from, to);

        if !changes.is_empty() {
            self.notifier.notify(StoreEvent::Change(changes));
        }
        Ok(())
    }

    /// Copy of the current state suitable for persisting.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            groups: state.groups.as_ref().clone(),
            sensors: state.all_sensors().cloned().collect(),
        }
    }

    /// Load `snapshot` into the store as one combined replace.
    pub fn restore(&self, snapshot: Snapshot) {
        info!(
            "[Store] Restoring {} groups and {} sensors",
            snapshot.groups.len(),
            snapshot.sensors.len()
        );
        self.replace_all(snapshot.groups, snapshot.sensors);
    }

    fn publish(&self, changes: impl IntoIterator<Item = ChangeSet>) {
        self.notifier.notify(StoreEvent::Reload);
        for changes in changes {
            if !changes.is_empty() {
                self.notifier.notify(StoreEvent::Change(changes));
            }
        }
    }
}
