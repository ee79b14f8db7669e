//! Concurrent access to the snapshot store from decoders, poller and readers.

use hvac_daq::decoders::{attach_decoders, SIG_AIR_FLOW, SIG_HEAT_PUMP_TEMPS};
use hvac_daq::hardware::{Frame, MockDevice};
use hvac_daq::snapshot::{AirHandlerSnapshot, Domain, Snapshot, SnapshotStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn readers_never_see_torn_snapshots() {
    let store = Arc::new(SnapshotStore::with_placeholders());
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..4u16)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..2_000u16 {
                    let v = w * 10_000 + i;
                    store.update(
                        Domain::AirHandler,
                        AirHandlerSnapshot {
                            blower_rpm: v,
                            air_flow_cfm: v,
                            elec_heat: v % 2 == 0,
                        },
                    );
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checked = 0usize;
                while !done.load(Ordering::Relaxed) {
                    if let Some(Snapshot::AirHandler(s)) = store.get(Domain::AirHandler) {
                        assert_eq!(s.blower_rpm, s.air_flow_cfm);
                        assert_eq!(s.elec_heat, s.blower_rpm % 2 == 0);
                        checked += 1;
                    }
                }
                checked
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn decoders_on_many_threads_merge_fields() {
    let device = Arc::new(MockDevice::new());
    let store = Arc::new(SnapshotStore::with_placeholders());
    attach_decoders(device.as_ref(), Arc::clone(&store));

    let airflow = {
        let mut data = SIG_AIR_FLOW.to_vec();
        data.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x02, 0x58]);
        Frame::new(0x4001, 0x2001, data)
    };
    let temps = {
        let mut data = SIG_HEAT_PUMP_TEMPS.to_vec();
        data.extend_from_slice(&[0x02, 0x80, 0x01, 0x40]);
        Frame::new(0x5001, 0x2001, data)
    };

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let device = Arc::clone(&device);
            let frame = if t % 2 == 0 { airflow.clone() } else { temps.clone() };
            thread::spawn(move || {
                for _ in 0..500 {
                    device.emit(&frame);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let blower = store.air_handler().unwrap();
    assert_eq!(blower.air_flow_cfm, 600);
    assert!(blower.elec_heat);
    assert_eq!(blower.blower_rpm, 0);

    let hp = store.heat_pump().unwrap();
    assert_eq!(hp.outside_temp, 40.0);
    assert_eq!(hp.coil_temp, 20.0);
}
