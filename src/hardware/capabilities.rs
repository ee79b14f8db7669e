//! Device Capabilities
//!
//! The telemetry pipeline never talks to the HVAC bus directly. The protocol
//! engine (connection setup, framing, checksums, table encoding) lives outside
//! this crate and is plugged in by implementing [`HvacDevice`].
//!
//! The trait exposes exactly what the pipeline consumes:
//!
//! - `open` establishes the transport (failure is fatal at startup)
//! - `read_zone_params` / `read_current_params` are synchronous table reads
//!   used by the state poller
//! - `snoop_responses` registers a handler for response frames whose source
//!   address falls in a range (the event-delivery path)
//!
//! # Design Philosophy
//!
//! As with the other capability traits in this crate the methods are async
//! where they perform I/O, the trait is `Send + Sync`, and errors use
//! `anyhow::Result` so any transport can report its own failure detail.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn outdoor_temp<D: HvacDevice>(device: &D) -> anyhow::Result<u8> {
//!     Ok(device.read_current_params().await?.outdoor_air_temp)
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::hardware::frame::{AddressRange, FrameHandler};
use crate::hardware::tables::{TStatCurrentParams, TStatZoneParams};

/// Capability: HVAC bus access
///
/// # Contract
/// - `open` is called once, after handlers are registered
/// - Table reads may fail transiently (bus contention, timeouts); callers treat
///   a failure as "no new data this cycle"
/// - Handlers passed to `snoop_responses` are invoked on the transport's own
///   delivery thread and must return promptly
///
/// # Thread Safety
/// - All methods take `&self`; implementations use interior mutability
#[async_trait]
pub trait HvacDevice: Send + Sync {
    /// Open the transport.
    async fn open(&self) -> Result<()>;

    /// Read the thermostat zone configuration table.
    async fn read_zone_params(&self) -> Result<TStatZoneParams>;

    /// Read the thermostat current-parameters table.
    async fn read_current_params(&self) -> Result<TStatCurrentParams>;

    /// Register a handler for response frames sourced from `range`.
    fn snoop_responses(&self, range: AddressRange, handler: FrameHandler);
}
