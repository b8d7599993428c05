//! Sensor kinds, keyed by their IPSO object id.
//!
//! The device server reports each reading as an instance of an IPSO object.
//! Only the object types the display knows how to render are listed here.

use serde::{Deserialize, Serialize};
use strum::FromRepr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, FromRepr, Serialize, Deserialize)]
#[repr(u16)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Digital output (on/off actuator state)
    DigitalOutput = 3201,
    /// Temperature in degrees Celsius
    Temperature = 3303,
    /// Relative humidity in percent
    Humidity = 3304,
    /// Barometric pressure in hectopascal
    Barometer = 3315,
    /// Gas concentration in parts per million
    Concentration = 3325,
    /// Power in watts
    Power = 3328,
    /// Distance in metres
    Distance = 3330,
}

impl SensorKind {
    /// IPSO object id of this kind.
    pub fn object_id(self) -> u16 {
        self as u16
    }

    /// Look up a kind from a raw IPSO object id.
    pub fn from_object_id(id: u16) -> Option<Self> {
        Self::from_repr(id)
    }

    /// Display unit for values of this kind.
    pub fn unit(self) -> &'static str {
        match self {
            SensorKind::DigitalOutput => "",
            SensorKind::Temperature => "°C",
            SensorKind::Humidity => "%",
            SensorKind::Barometer => "hPa",
            SensorKind::Concentration => "ppm",
            SensorKind::Power => "W",
            SensorKind::Distance => "m",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_lookup() {
        assert_eq!(SensorKind::from_object_id(3303), Some(SensorKind::Temperature));
        assert_eq!(SensorKind::from_object_id(3315), Some(SensorKind::Barometer));
        assert_eq!(SensorKind::from_object_id(1234), None);
        assert_eq!(SensorKind::Humidity.object_id(), 3304);
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&SensorKind::DigitalOutput).unwrap();
        assert_eq!(json, "\"digital_output\"");
    }
}
