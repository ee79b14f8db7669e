//! Thermostat tables read synchronously by the state poller.
//!
//! Only the fields the pipeline consumes are modelled; how the transport
//! encodes the full tables on the wire is its own business.

use serde::{Deserialize, Serialize};

/// Thermostat zone configuration table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TStatZoneParams {
    /// Hold bitmap, bit 0 is zone 1
    pub zone_hold: u8,
    /// Zone 1 heat setpoint
    pub z1_heat_setpoint: u8,
    /// Zone 1 cool setpoint
    pub z1_cool_setpoint: u8,
    /// Raw fan mode (0 auto, 1 low, 2 med, 3 high)
    pub z1_fan_mode: u8,
}

/// Thermostat current-parameters table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TStatCurrentParams {
    /// Zone 1 indoor temperature
    pub z1_current_temp: u8,
    /// Zone 1 relative humidity
    pub z1_current_humidity: u8,
    /// Outdoor air temperature
    pub outdoor_air_temp: u8,
    /// Low nibble is the operating mode, bits 5..7 the stage
    pub mode: u8,
}

impl TStatZoneParams {
    /// Whether zone 1 is on hold.
    pub fn zone1_hold(&self) -> bool {
        self.zone_hold & 0x01 == 1
    }
}

impl TStatCurrentParams {
    /// Operating mode with the stage bits masked off.
    pub fn raw_mode(&self) -> u8 {
        self.mode & 0x0f
    }

    /// Active stage, 0 through 3 on two-stage and variable equipment.
    pub fn stage(&self) -> u8 {
        self.mode >> 5
    }
}
