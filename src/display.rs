//! Text rendering of the store for the log-based display.
//!
//! Stands in for the UI layer: it subscribes to the store like any other
//! observer and re-renders on reload, logging only the touched identifiers
//! for fine-grained changes.

use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::store::{ChangeScope, SensorStore, StoreEvent};

/// Render the store as display lines, one group header followed by its
/// sensors, then any ungrouped sensors.
pub fn render(store: &SensorStore) -> Vec<String> {
    let groups = store.groups();
    let sensors = store.sensors();
    let ungrouped = store.ungrouped();

    let mut lines = Vec::new();
    for group in groups.iter() {
        lines.push(format!("{} [{}]", group.name, group.id));
        for sensor in sensors.get(&group.id).into_iter().flatten() {
            lines.push(format!("  {:<20} {}", sensor.name, sensor.display_value()));
        }
    }
    if !ungrouped.is_empty() {
        lines.push("(ungrouped)".to_string());
        for sensor in ungrouped.iter() {
            lines.push(format!("  {:<20} {}", sensor.name, sensor.display_value()));
        }
    }
    lines
}

/// Subscribe to `store` and spawn a task that logs it on every event.
///
/// The subscription is taken before this returns, so no event published
/// afterwards is missed. Abort the handle to stop the task; the
/// subscription is released with it.
pub fn spawn_display(store: Arc<SensorStore>) -> JoinHandle<()> {
    let mut subscription = store.subscribe();
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            match event {
                StoreEvent::Reload => {
                    for line in render(&store) {
                        info!("[Display] {}", line);
                    }
                }
                StoreEvent::Change(changes) => {
                    let scope = match changes.scope {
                        ChangeScope::Groups => "groups",
                        ChangeScope::Sensors => "sensors",
                    };
                    info!(
                        "[Display] {} changed: +{:?} ~{:?} -{:?}",
                        scope, changes.inserted, changes.updated, changes.deleted
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Sensor, SensorGroup, SensorKind};

    #[test]
    fn test_render_layout() {
        let store = SensorStore::new();
        store.replace_groups(vec![SensorGroup::new("out", "Outdoor")]);
        store.replace_sensors(vec![
            Sensor::new("t", "Temperature", SensorKind::Temperature)
                .in_group("out")
                .with_value(3.25),
            Sensor::new("x", "Loose", SensorKind::Power),
        ]);

        let lines = render(&store);
        assert_eq!(lines[0], "Outdoor [out]");
        assert!(lines[1].starts_with("  Temperature"));
        assert!(lines[1].ends_with("3.2°C") || lines[1].ends_with("3.3°C"));
        assert_eq!(lines[2], "(ungrouped)");
        assert!(lines[3].ends_with("--"));
    }

    #[test]
    fn test_render_empty() {
        assert!(render(&SensorStore::new()).is_empty());
    }

    #[tokio::test]
    async fn test_abort_releases_subscription() {
        let store = Arc::new(SensorStore::new());
        let handle = spawn_display(store.clone());

        store.replace_groups(vec![SensorGroup::new("g", "G")]);
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        // The aborted task dropped its subscription
        assert_eq!(store.observer_count(), 0);

        let mut events = store.subscribe();
        store.replace_groups(vec![]);
        assert_eq!(events.try_recv(), Some(StoreEvent::Reload));
    }
}
