//! Sensor simulation for development and testing.
//!
//! Provides a fixed outdoor/indoor layout whose readings drift a little on
//! every fetch, so observers see real change events.

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use rand::Rng;

use super::SensorSource;
use crate::error::Result;
use crate::model::{Sensor, SensorGroup, SensorKind};

/// Baseline readings: id, name, kind, group, starting value.
const LAYOUT: &[(&str, &str, SensorKind, &str, f64)] = &[
    ("outdoor-temp", "Temperature", SensorKind::Temperature, "outdoor", 12.0),
    ("outdoor-humidity", "Humidity", SensorKind::Humidity, "outdoor", 70.0),
    ("outdoor-pressure", "Pressure", SensorKind::Barometer, "outdoor", 1013.0),
    ("indoor-temp", "Temperature", SensorKind::Temperature, "indoor", 21.0),
    ("indoor-co2", "CO2", SensorKind::Concentration, "indoor", 600.0),
    ("indoor-heater", "Heater", SensorKind::DigitalOutput, "indoor", 0.0),
];

/// Simulated weather station.
pub struct SimulatedSource {
    sensors: Mutex<Vec<Sensor>>,
}

impl SimulatedSource {
    pub fn new() -> Self {
        let sensors = LAYOUT
            .iter()
            .map(|&(id, name, kind, group, value)| {
                Sensor::new(id, name, kind).in_group(group).with_value(value)
            })
            .collect();
        Self {
            sensors: Mutex::new(sensors),
        }
    }

    fn jitter(sensor: &mut Sensor, rng: &mut impl Rng) {
        let current = sensor.value.unwrap_or_default();
        let next = match sensor.kind {
            SensorKind::DigitalOutput => {
                if rng.gen_bool(0.1) {
                    1.0 - current
                } else {
                    current
                }
            }
            SensorKind::Humidity => (current + rng.gen_range(-1.0..1.0)).clamp(0.0, 100.0),
            SensorKind::Concentration => (current + rng.gen_range(-20.0..20.0)).max(0.0),
            _ => current + rng.gen_range(-0.5..0.5),
        };
        sensor.record(next);
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulation"
    }

    async fn fetch_groups(&self) -> Result<Vec<SensorGroup>> {
        Ok(vec![
            SensorGroup::new("outdoor", "Outdoor"),
            SensorGroup::new("indoor", "Indoor"),
        ])
    }

    async fn fetch_sensors(&self) -> Result<Vec<Sensor>> {
        let mut rng = rand::thread_rng();
        let mut sensors = self.sensors.lock();
        for sensor in sensors.iter_mut() {
            Self::jitter(sensor, &mut rng);
        }
        debug!("[Sim] Generated {} readings", sensors.len());
        Ok(sensors.clone())
    }
}
