//! # HVAC Telemetry Core Library
//!
//! `hvac_daq` keeps an in-memory picture of a residential HVAC system and turns
//! it into durable daily artifacts: an append-only log, dated archives, a chart
//! per day and an index of retained charts.
//!
//! ## Crate Structure
//!
//! - **`hardware`**: the device interface (`HvacDevice`), event frames, raw
//!   thermostat tables and a simulated device.
//! - **`snapshot`**: per-domain snapshot types and the concurrent `SnapshotStore`.
//! - **`decoders`**: event-frame decoders for the air handler and heat pump.
//! - **`poller`**: the periodic thermostat poller.
//! - **`data`**: log record schema, active log, archive replay, chart and index
//!   rendering, artifact layout.
//! - **`scheduler`**: cron cadences and the job engine.
//! - **`jobs`**: append, rotation, retention and log purge.
//! - **`daemon`**: startup wiring and shutdown.
//! - **`config`**, **`logging`**, **`error`**: configuration, tracing setup and
//!   the crate-wide error type.
//!
//! ## Data flow
//!
//! ```text
//! device frames ──► decoders ──►┐
//!                               ├─► SnapshotStore ──► append job ──► active log
//! thermostat reads ─► poller ──►┘                                       │
//!                                                     rotation job ◄────┘
//!                                                        │ archive + chart
//!                                                        ▼
//!                                  retention job ──► expire + index
//! ```

pub mod config;
pub mod daemon;
pub mod data;
pub mod decoders;
pub mod error;
pub mod hardware;
pub mod jobs;
pub mod logging;
pub mod poller;
pub mod scheduler;
pub mod snapshot;

pub use config::HvacConfig;
pub use error::{AppResult, DaqError};
