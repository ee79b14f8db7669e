//! Device-facing abstractions.
//!
//! The HVAC protocol engine is an external collaborator; this module only
//! defines what the pipeline needs from it plus an in-process mock.

pub mod capabilities;
pub mod frame;
pub mod mock;
pub mod tables;

pub use capabilities::HvacDevice;
pub use frame::{AddressRange, Frame, FrameHandler};
pub use mock::MockDevice;
pub use tables::{TStatCurrentParams, TStatZoneParams};
