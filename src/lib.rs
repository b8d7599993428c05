//! Weather store library.
//!
//! This library provides the in-memory sensor store behind a weather
//! display, the sources that refresh it, and snapshot persistence.

pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod model;
pub mod store;

pub use error::{Result, StoreError};
pub use model::{GroupId, Sensor, SensorGroup, SensorId, SensorKind};
pub use store::{ChangeScope, ChangeSet, Position, SensorStore, StoreEvent, Subscription};
