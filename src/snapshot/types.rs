//! Typed telemetry snapshots, one per domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hardware::tables::{TStatCurrentParams, TStatZoneParams};

/// Telemetry domain, the key of the snapshot store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Thermostat state, produced by the poller
    #[serde(rename = "tstat")]
    Thermostat,
    /// Air handler (blower), produced by event decoding
    #[serde(rename = "blower")]
    AirHandler,
    /// Outdoor heat pump, produced by event decoding
    #[serde(rename = "heatpump")]
    HeatPump,
}

impl Domain {
    /// Every domain, in store seeding order.
    pub const ALL: [Domain; 3] = [Domain::Thermostat, Domain::AirHandler, Domain::HeatPump];

    /// String key used by the request-serving layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Thermostat => "tstat",
            Domain::AirHandler => "blower",
            Domain::HeatPump => "heatpump",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|domain| domain.as_str() == s)
            .ok_or_else(|| format!("unknown telemetry domain '{s}'"))
    }
}

/// Thermostat operating mode decoded from the low nibble of the mode byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    /// Heat
    Heat,
    /// Cool
    Cool,
    /// Heat or cool as needed
    Auto,
    /// Electric heat strips only
    Electric,
    /// Heat pump only
    #[serde(rename = "heatpump")]
    HeatPump,
    /// System off
    Off,
    /// Unrecognized raw value
    #[default]
    Unknown,
}

impl HvacMode {
    /// Decode the low nibble of the thermostat mode byte.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => HvacMode::Heat,
            1 => HvacMode::Cool,
            2 => HvacMode::Auto,
            3 => HvacMode::Electric,
            4 => HvacMode::HeatPump,
            5 => HvacMode::Off,
            _ => HvacMode::Unknown,
        }
    }

    /// Lower-case name, as logged.
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::Auto => "auto",
            HvacMode::Electric => "electric",
            HvacMode::HeatPump => "heatpump",
            HvacMode::Off => "off",
            HvacMode::Unknown => "unknown",
        }
    }
}

/// Thermostat fan mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    /// Fan follows demand
    Auto,
    /// Low speed
    Low,
    /// Medium speed
    Med,
    /// High speed
    High,
    /// Unrecognized raw value
    #[default]
    Unknown,
}

impl FanMode {
    /// Decode the raw fan mode byte.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => FanMode::Auto,
            1 => FanMode::Low,
            2 => FanMode::Med,
            3 => FanMode::High,
            _ => FanMode::Unknown,
        }
    }

    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FanMode::Auto => "auto",
            FanMode::Low => "low",
            FanMode::Med => "med",
            FanMode::High => "high",
            FanMode::Unknown => "unknown",
        }
    }
}

/// Latest thermostat state. Replaced wholesale on every successful poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatSnapshot {
    /// Indoor temperature
    pub current_temp: u8,
    /// Indoor relative humidity
    pub current_humidity: u8,
    /// Outdoor temperature
    pub outdoor_temp: u8,
    /// Decoded operating mode
    pub mode: HvacMode,
    /// Active stage
    pub stage: u8,
    /// Fan mode
    pub fan_mode: FanMode,
    /// `None` until the first poll has reported the hold state
    pub hold: Option<bool>,
    /// Heat setpoint
    pub heat_setpoint: u8,
    /// Cool setpoint
    pub cool_setpoint: u8,
    /// Undecoded mode byte, stage bits included
    pub raw_mode: u8,
}

impl ThermostatSnapshot {
    /// Build a snapshot from the two thermostat tables.
    pub fn from_tables(zone: &TStatZoneParams, current: &TStatCurrentParams) -> Self {
        Self {
            current_temp: current.z1_current_temp,
            current_humidity: current.z1_current_humidity,
            outdoor_temp: current.outdoor_air_temp,
            mode: HvacMode::from_raw(current.raw_mode()),
            stage: current.stage(),
            fan_mode: FanMode::from_raw(zone.z1_fan_mode),
            hold: Some(zone.zone1_hold()),
            heat_setpoint: zone.z1_heat_setpoint,
            cool_setpoint: zone.z1_cool_setpoint,
            raw_mode: current.mode,
        }
    }
}

/// Air handler state, merged field by field from event frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirHandlerSnapshot {
    /// Blower speed
    #[serde(rename = "blowerRPM")]
    pub blower_rpm: u16,
    /// Air flow, cubic feet per minute
    #[serde(rename = "airFlowCFM")]
    pub air_flow_cfm: u16,
    /// Electric heat strips energized
    pub elec_heat: bool,
}

/// Heat pump state, merged field by field from event frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatPumpSnapshot {
    /// Degrees, 1/16 resolution
    pub coil_temp: f32,
    /// Degrees, 1/16 resolution
    pub outside_temp: f32,
    /// Compressor stage
    pub stage: u8,
}

/// A value held in one slot of the snapshot store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "value", rename_all = "lowercase")]
pub enum Snapshot {
    /// Thermostat slot
    #[serde(rename = "tstat")]
    Thermostat(ThermostatSnapshot),
    /// Air handler slot
    #[serde(rename = "blower")]
    AirHandler(AirHandlerSnapshot),
    /// Heat pump slot
    #[serde(rename = "heatpump")]
    HeatPump(HeatPumpSnapshot),
}

impl Snapshot {
    /// Zero-value placeholder for a domain.
    pub fn zero(domain: Domain) -> Self {
        match domain {
            Domain::Thermostat => Snapshot::Thermostat(ThermostatSnapshot::default()),
            Domain::AirHandler => Snapshot::AirHandler(AirHandlerSnapshot::default()),
            Domain::HeatPump => Snapshot::HeatPump(HeatPumpSnapshot::default()),
        }
    }

    /// Domain this snapshot belongs to.
    pub fn domain(&self) -> Domain {
        match self {
            Snapshot::Thermostat(_) => Domain::Thermostat,
            Snapshot::AirHandler(_) => Domain::AirHandler,
            Snapshot::HeatPump(_) => Domain::HeatPump,
        }
    }
}

impl From<ThermostatSnapshot> for Snapshot {
    fn from(value: ThermostatSnapshot) -> Self {
        Snapshot::Thermostat(value)
    }
}

impl From<AirHandlerSnapshot> for Snapshot {
    fn from(value: AirHandlerSnapshot) -> Self {
        Snapshot::AirHandler(value)
    }
}

impl From<HeatPumpSnapshot> for Snapshot {
    fn from(value: HeatPumpSnapshot) -> Self {
        Snapshot::HeatPump(value)
    }
}

/// Flat values the append job writes into each log record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedScalars {
    /// Indoor temperature
    pub current_temp: u8,
    /// Outdoor temperature
    pub outdoor_temp: u8,
    /// Heat setpoint
    pub heat_setpoint: u8,
    /// Cool setpoint
    pub cool_setpoint: u8,
    /// Blower RPM
    pub blower_rpm: u16,
    /// Operating mode name
    pub mode: String,
}

impl DerivedScalars {
    /// Project the logged values out of the thermostat and air handler snapshots.
    pub fn project(tstat: &ThermostatSnapshot, blower: &AirHandlerSnapshot) -> Self {
        Self {
            current_temp: tstat.current_temp,
            outdoor_temp: tstat.outdoor_temp,
            heat_setpoint: tstat.heat_setpoint,
            cool_setpoint: tstat.cool_setpoint,
            blower_rpm: blower.blower_rpm,
            mode: tstat.mode.as_str().to_string(),
        }
    }
}
