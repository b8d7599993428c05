//! Data model shared by the store, its sources and observers.
//!
//! Groups and sensors are identified by opaque string identifiers assigned
//! by whatever backend produced them. Both types are plain values: the store
//! hands out clones, so nothing outside it can alias its state.

pub mod group;
pub mod kind;
pub mod sensor;

pub use group::{GroupId, SensorGroup};
pub use kind::SensorKind;
pub use sensor::{Sensor, SensorId};

/// Anything with a stable identifier that change sets can refer to.
pub trait Identified {
    type Id: Clone + Ord + std::hash::Hash;

    fn id(&self) -> &Self::Id;
}
