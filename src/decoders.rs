//! Event decoders for air handler and heat pump response frames.
//!
//! Each decoder matches the three-byte signature at the start of a frame,
//! reads big-endian fields at fixed offsets of the body, and merges only the
//! fields that sub-message carries into its domain's snapshot. Unknown
//! signatures and frames too short for their sub-message are ignored.
//!
//! Decoders run on the transport's delivery path: they touch nothing but the
//! [`SnapshotStore`] and never block on I/O.

use std::sync::Arc;
use tracing::debug;

use crate::hardware::capabilities::HvacDevice;
use crate::hardware::frame::{AddressRange, Frame};
use crate::snapshot::SnapshotStore;

/// Source addresses of the outdoor heat pump.
pub const HEAT_PUMP_RANGE: AddressRange = AddressRange::new(0x5000, 0x51ff);
/// Source addresses of the indoor air handler.
pub const AIR_HANDLER_RANGE: AddressRange = AddressRange::new(0x4000, 0x42ff);

/// Heat pump coil and outside temperatures.
pub const SIG_HEAT_PUMP_TEMPS: [u8; 3] = [0x00, 0x3e, 0x01];
/// Heat pump stage.
pub const SIG_HEAT_PUMP_STAGE: [u8; 3] = [0x00, 0x3e, 0x02];
/// Air handler blower speed.
pub const SIG_BLOWER_RPM: [u8; 3] = [0x00, 0x03, 0x06];
/// Air handler airflow and electric heat.
pub const SIG_AIR_FLOW: [u8; 3] = [0x00, 0x03, 0x16];

/// Read a big-endian u16 at `offset`, or `None` if the body is too short.
fn be_u16(body: &[u8], offset: usize) -> Option<u16> {
    let bytes = body.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// 1/16 degree fixed point to degrees.
fn sixteenths(raw: u16) -> f32 {
    f32::from(raw) / 16.0
}

/// Merge a heat pump frame into the store. Returns whether the frame was applied.
pub fn decode_heat_pump(store: &SnapshotStore, frame: &Frame) -> bool {
    let body = frame.body();
    match frame.signature() {
        Some(SIG_HEAT_PUMP_TEMPS) => {
            let (Some(outside), Some(coil)) = (be_u16(body, 0), be_u16(body, 2)) else {
                debug!(?frame, "short heat pump temperature frame");
                return false;
            };
            let hp = store.modify_heat_pump(|hp| {
                hp.coil_temp = sixteenths(coil);
                hp.outside_temp = sixteenths(outside);
            });
            debug!(coil = hp.coil_temp, outside = hp.outside_temp, "heat pump temperatures");
            true
        }
        Some(SIG_HEAT_PUMP_STAGE) => {
            let Some(&raw) = body.first() else {
                debug!(?frame, "short heat pump stage frame");
                return false;
            };
            let hp = store.modify_heat_pump(|hp| hp.stage = raw >> 1);
            debug!(stage = hp.stage, "heat pump stage");
            true
        }
        _ => false,
    }
}

/// Merge an air handler frame into the store. Returns whether the frame was applied.
pub fn decode_air_handler(store: &SnapshotStore, frame: &Frame) -> bool {
    let body = frame.body();
    match frame.signature() {
        Some(SIG_BLOWER_RPM) => {
            let Some(rpm) = be_u16(body, 1) else {
                debug!(?frame, "short blower frame");
                return false;
            };
            store.modify_air_handler(|blower| blower.blower_rpm = rpm);
            debug!(rpm, "blower RPM");
            true
        }
        Some(SIG_AIR_FLOW) => {
            let (Some(&flags), Some(cfm)) = (body.first(), be_u16(body, 4)) else {
                debug!(?frame, "short airflow frame");
                return false;
            };
            store.modify_air_handler(|blower| {
                blower.air_flow_cfm = cfm;
                blower.elec_heat = flags & 0x03 != 0;
            });
            debug!(cfm, "air flow CFM");
            true
        }
        _ => false,
    }
}

/// Register both decoders with the device's response snooping.
pub fn attach_decoders(device: &dyn HvacDevice, store: Arc<SnapshotStore>) {
    let hp_store = Arc::clone(&store);
    device.snoop_responses(
        HEAT_PUMP_RANGE,
        Arc::new(move |frame: &Frame| {
            decode_heat_pump(&hp_store, frame);
        }),
    );

    device.snoop_responses(
        AIR_HANDLER_RANGE,
        Arc::new(move |frame: &Frame| {
            decode_air_handler(&store, frame);
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{AirHandlerSnapshot, HeatPumpSnapshot};

    fn frame(source: u16, data: &[u8]) -> Frame {
        Frame::new(source, 0x2001, data.to_vec())
    }

    #[test]
    fn heat_pump_temperatures_are_sixteenths() {
        let store = SnapshotStore::with_placeholders();
        // outside 0x0210 = 528 -> 33.0, coil 0x0248 = 584 -> 36.5
        let applied = decode_heat_pump(
            &store,
            &frame(0x5001, &[0x00, 0x3e, 0x01, 0x02, 0x10, 0x02, 0x48]),
        );
        assert!(applied);
        let hp = store.heat_pump().unwrap();
        assert_eq!(hp.outside_temp, 33.0);
        assert_eq!(hp.coil_temp, 36.5);
        assert_eq!(hp.stage, 0);
    }

    #[test]
    fn heat_pump_stage_keeps_temperatures() {
        let store = SnapshotStore::with_placeholders();
        store.update(
            crate::snapshot::Domain::HeatPump,
            HeatPumpSnapshot {
                coil_temp: 40.0,
                outside_temp: 30.0,
                stage: 0,
            },
        );
        decode_heat_pump(&store, &frame(0x5001, &[0x00, 0x3e, 0x02, 0x04]));
        let hp = store.heat_pump().unwrap();
        assert_eq!(hp.stage, 2);
        assert_eq!(hp.coil_temp, 40.0);
        assert_eq!(hp.outside_temp, 30.0);
    }

    #[test]
    fn blower_rpm_leaves_airflow_untouched() {
        let store = SnapshotStore::with_placeholders();
        store.update(
            crate::snapshot::Domain::AirHandler,
            AirHandlerSnapshot {
                blower_rpm: 0,
                air_flow_cfm: 900,
                elec_heat: true,
            },
        );
        decode_air_handler(&store, &frame(0x4001, &[0x00, 0x03, 0x06, 0x00, 0x02, 0x58]));
        assert_eq!(
            store.air_handler().unwrap(),
            AirHandlerSnapshot {
                blower_rpm: 600,
                air_flow_cfm: 900,
                elec_heat: true,
            }
        );
    }

    #[test]
    fn airflow_leaves_rpm_untouched() {
        let store = SnapshotStore::with_placeholders();
        store.modify_air_handler(|b| b.blower_rpm = 750);
        decode_air_handler(
            &store,
            &frame(0x4001, &[0x00, 0x03, 0x16, 0x01, 0x00, 0x00, 0x00, 0x03, 0x20]),
        );
        let blower = store.air_handler().unwrap();
        assert_eq!(blower.blower_rpm, 750);
        assert_eq!(blower.air_flow_cfm, 800);
        assert!(blower.elec_heat);
    }

    #[test]
    fn unmatched_and_short_frames_are_ignored() {
        let store = SnapshotStore::with_placeholders();
        assert!(!decode_air_handler(&store, &frame(0x4001, &[0x00, 0x03, 0x99, 1, 2, 3])));
        assert!(!decode_air_handler(&store, &frame(0x4001, &[0x00, 0x03, 0x06, 0x00])));
        assert!(!decode_heat_pump(&store, &frame(0x5001, &[0x00, 0x3e])));
        assert!(!decode_heat_pump(&store, &frame(0x5001, &[0x00, 0x3e, 0x02])));
        assert_eq!(store.air_handler(), Some(AirHandlerSnapshot::default()));
        assert_eq!(store.heat_pump(), Some(HeatPumpSnapshot::default()));
    }
}
