use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{GroupId, Identified, SensorKind};

/// Opaque sensor identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(String);

impl SensorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One physical or virtual sensor and its latest reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub name: String,
    pub kind: SensorKind,
    /// Latest reading, `None` until the device has reported.
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Group this sensor is displayed in, if any.
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl Sensor {
    pub fn new(id: impl Into<SensorId>, name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            value: None,
            updated_at: None,
            group_id: None,
        }
    }

    /// Builder-style group assignment.
    pub fn in_group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Builder-style reading.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Record a new reading taken now.
    pub fn record(&mut self, value: f64) {
        self.value = Some(value);
        self.updated_at = Some(Utc::now());
    }

    /// Reading formatted with the kind's unit, e.g. `21.5°C`.
    pub fn display_value(&self) -> String {
        match self.value {
            Some(v) if self.kind == SensorKind::DigitalOutput => {
                let state = if v != 0.0 { "on" } else { "off" };
                state.to_string()
            }
            Some(v) => format!("{:.1}{}", v, self.kind.unit()),
            None => "--".to_string(),
        }
    }
}

impl Identified for Sensor {
    type Id = SensorId;

    fn id(&self) -> &SensorId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value() {
        let sensor = Sensor::new("t1", "Outside", SensorKind::Temperature);
        assert_eq!(sensor.display_value(), "--");

        let sensor = sensor.with_value(21.54);
        assert_eq!(sensor.display_value(), "21.5°C");

        let relay = Sensor::new("r1", "Fan", SensorKind::DigitalOutput).with_value(1.0);
        assert_eq!(relay.display_value(), "on");
    }

    #[test]
    fn test_record_sets_timestamp() {
        let mut sensor = Sensor::new("h1", "Humidity", SensorKind::Humidity);
        assert!(sensor.updated_at.is_none());
        sensor.record(55.0);
        assert_eq!(sensor.value, Some(55.0));
        assert!(sensor.updated_at.is_some());
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{"id":"p1","name":"Pressure","kind":"barometer"}"#;
        let sensor: Sensor = serde_json::from_str(json).unwrap();
        assert_eq!(sensor.id, SensorId::new("p1"));
        assert_eq!(sensor.kind, SensorKind::Barometer);
        assert!(sensor.group_id.is_none());
        assert!(sensor.value.is_none());
    }
}
