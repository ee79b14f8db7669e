//! Periodic thermostat poller.
//!
//! The poller is the only producer of the thermostat snapshot. Each cycle reads
//! the zone and current-parameter tables; when both succeed the snapshot is
//! replaced, otherwise the cycle is skipped and the previous snapshot stays
//! visible. Failures are only observable as staleness of the slot's timestamp.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::hardware::capabilities::HvacDevice;
use crate::snapshot::{Domain, SnapshotStore, ThermostatSnapshot};

/// Read both thermostat tables and publish the resulting snapshot.
pub async fn poll_once(device: &dyn HvacDevice, store: &SnapshotStore) -> Result<ThermostatSnapshot> {
    let zone = device
        .read_zone_params()
        .await
        .context("thermostat zone table read failed")?;
    let current = device
        .read_current_params()
        .await
        .context("thermostat current-parameters read failed")?;

    let snapshot = ThermostatSnapshot::from_tables(&zone, &current);
    store.update(Domain::Thermostat, snapshot);
    Ok(snapshot)
}

/// Poll forever, sleeping `period` after every cycle, until `shutdown` flips.
pub async fn state_poller(
    device: Arc<dyn HvacDevice>,
    store: Arc<SnapshotStore>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(?period, "state poller started");
    let mut skipped: u64 = 0;

    loop {
        match poll_once(device.as_ref(), &store).await {
            Ok(_) if skipped > 0 => {
                debug!(skipped, "thermostat reads recovered");
                skipped = 0;
            }
            Ok(_) => {}
            Err(err) => {
                skipped += 1;
                debug!(error = %err, skipped, "poll cycle skipped");
            }
        }

        tokio::select! {
            _ = sleep(period) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!("state poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MockDevice;
    use crate::hardware::tables::{TStatCurrentParams, TStatZoneParams};
    use crate::snapshot::HvacMode;

    #[tokio::test]
    async fn successful_poll_publishes_snapshot() {
        let device = MockDevice::new();
        device.set_tables(
            TStatZoneParams {
                zone_hold: 1,
                z1_heat_setpoint: 66,
                z1_cool_setpoint: 78,
                z1_fan_mode: 3,
            },
            TStatCurrentParams {
                z1_current_temp: 72,
                z1_current_humidity: 38,
                outdoor_air_temp: 90,
                mode: 0x01,
            },
        );
        let store = SnapshotStore::with_placeholders();

        let snap = poll_once(&device, &store).await.unwrap();
        assert_eq!(snap.mode, HvacMode::Cool);
        assert_eq!(store.thermostat(), Some(snap));

        let scalars = store.derived_scalars();
        assert_eq!(scalars.outdoor_temp, 90);
        assert_eq!(scalars.cool_setpoint, 78);
        assert_eq!(scalars.mode, "cool");
    }

    #[tokio::test]
    async fn failed_poll_keeps_previous_snapshot() {
        let device = MockDevice::new();
        let store = SnapshotStore::with_placeholders();
        let first = poll_once(&device, &store).await.unwrap();

        device.set_fail_reads(true);
        device.set_tables(
            TStatZoneParams::default(),
            TStatCurrentParams {
                z1_current_temp: 99,
                ..Default::default()
            },
        );
        assert!(poll_once(&device, &store).await.is_err());
        assert_eq!(store.thermostat(), Some(first));
    }

    #[tokio::test(start_paused = true)]
    async fn poller_repeats_and_stops_on_shutdown() {
        let device = Arc::new(MockDevice::new());
        let store = Arc::new(SnapshotStore::with_placeholders());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(state_poller(
            device.clone(),
            store.clone(),
            Duration::from_secs(1),
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        // Cycles at t=0, 1, 2, 3: two reads each.
        assert_eq!(device.read_count(), 8);
        assert_eq!(store.thermostat().unwrap().current_temp, 70);
    }
}
