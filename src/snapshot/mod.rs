//! In-memory telemetry snapshots.
//!
//! - [`types`]: per-domain snapshot structs and the derived logging scalars
//! - [`store`]: the concurrent keyed cache shared by every worker

pub mod store;
pub mod types;

pub use store::{SnapshotStore, Stamped};
pub use types::{
    AirHandlerSnapshot, DerivedScalars, Domain, FanMode, HeatPumpSnapshot, HvacMode, Snapshot,
    ThermostatSnapshot,
};
