//! Shared keyed cache of the latest snapshot per telemetry domain.
//!
//! # Thread Safety
//!
//! Slots live behind a single `parking_lot::RwLock`. Snapshots are small `Copy`
//! values that are replaced whole while the write lock is held, so a reader can
//! never observe a value assembled from two different updates. `parking_lot`
//! avoids lock poisoning, which keeps the event-delivery path panic-free.
//!
//! Each slot remembers when it was last written. The store does not judge
//! staleness; callers compare [`Stamped::updated_at`] with their own clock.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::types::{
    AirHandlerSnapshot, DerivedScalars, Domain, HeatPumpSnapshot, Snapshot, ThermostatSnapshot,
};

/// A snapshot together with the time it was stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped {
    /// Stored snapshot
    pub value: Snapshot,
    /// When it was stored
    pub updated_at: DateTime<Local>,
}

/// Concurrent snapshot store. Entries are never removed.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slots: RwLock<HashMap<Domain, Stamped>>,
}

impl SnapshotStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a zero-value placeholder for every domain.
    pub fn with_placeholders() -> Self {
        let store = Self::new();
        for domain in Domain::ALL {
            store.update(domain, Snapshot::zero(domain));
        }
        store
    }

    /// Latest value for `domain`, if any.
    pub fn get(&self, domain: Domain) -> Option<Snapshot> {
        self.slots.read().get(&domain).map(|slot| slot.value)
    }

    /// Latest value for `domain` with its update time.
    pub fn get_stamped(&self, domain: Domain) -> Option<Stamped> {
        self.slots.read().get(&domain).copied()
    }

    /// Replace the slot for `domain` with `value`.
    pub fn update(&self, domain: Domain, value: impl Into<Snapshot>) {
        let stamped = Stamped {
            value: value.into(),
            updated_at: Local::now(),
        };
        self.slots.write().insert(domain, stamped);
    }

    /// Latest thermostat snapshot.
    pub fn thermostat(&self) -> Option<ThermostatSnapshot> {
        match self.get(Domain::Thermostat)? {
            Snapshot::Thermostat(tstat) => Some(tstat),
            _ => None,
        }
    }

    /// Latest air handler snapshot.
    pub fn air_handler(&self) -> Option<AirHandlerSnapshot> {
        match self.get(Domain::AirHandler)? {
            Snapshot::AirHandler(blower) => Some(blower),
            _ => None,
        }
    }

    /// Latest heat pump snapshot.
    pub fn heat_pump(&self) -> Option<HeatPumpSnapshot> {
        match self.get(Domain::HeatPump)? {
            Snapshot::HeatPump(hp) => Some(hp),
            _ => None,
        }
    }

    /// Read-modify-write of the air handler slot under one write lock.
    ///
    /// Starts from the zero value when the slot is empty or holds another type.
    pub fn modify_air_handler<F>(&self, f: F) -> AirHandlerSnapshot
    where
        F: FnOnce(&mut AirHandlerSnapshot),
    {
        let mut slots = self.slots.write();
        let mut current = match slots.get(&Domain::AirHandler).map(|slot| slot.value) {
            Some(Snapshot::AirHandler(blower)) => blower,
            _ => AirHandlerSnapshot::default(),
        };
        f(&mut current);
        slots.insert(
            Domain::AirHandler,
            Stamped {
                value: current.into(),
                updated_at: Local::now(),
            },
        );
        current
    }

    /// Read-modify-write of the heat pump slot under one write lock.
    pub fn modify_heat_pump<F>(&self, f: F) -> HeatPumpSnapshot
    where
        F: FnOnce(&mut HeatPumpSnapshot),
    {
        let mut slots = self.slots.write();
        let mut current = match slots.get(&Domain::HeatPump).map(|slot| slot.value) {
            Some(Snapshot::HeatPump(hp)) => hp,
            _ => HeatPumpSnapshot::default(),
        };
        f(&mut current);
        slots.insert(
            Domain::HeatPump,
            Stamped {
                value: current.into(),
                updated_at: Local::now(),
            },
        );
        current
    }

    /// Values for the next log record, taken from one consistent read.
    pub fn derived_scalars(&self) -> DerivedScalars {
        let slots = self.slots.read();
        let tstat = match slots.get(&Domain::Thermostat).map(|slot| slot.value) {
            Some(Snapshot::Thermostat(tstat)) => tstat,
            _ => ThermostatSnapshot::default(),
        };
        let blower = match slots.get(&Domain::AirHandler).map(|slot| slot.value) {
            Some(Snapshot::AirHandler(blower)) => blower,
            _ => AirHandlerSnapshot::default(),
        };
        DerivedScalars::project(&tstat, &blower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::types::HvacMode;

    #[test]
    fn placeholders_exist_for_every_domain() {
        let store = SnapshotStore::with_placeholders();
        for domain in Domain::ALL {
            assert_eq!(store.get(domain), Some(Snapshot::zero(domain)));
        }
    }

    #[test]
    fn empty_store_returns_none() {
        let store = SnapshotStore::new();
        assert!(store.get(Domain::HeatPump).is_none());
        assert!(store.thermostat().is_none());
    }

    #[test]
    fn update_replaces_the_whole_slot() {
        let store = SnapshotStore::with_placeholders();
        let tstat = ThermostatSnapshot {
            current_temp: 70,
            mode: HvacMode::Heat,
            ..Default::default()
        };
        store.update(Domain::Thermostat, tstat);
        assert_eq!(store.thermostat(), Some(tstat));
    }

    #[test]
    fn modify_starts_from_zero_when_slot_has_wrong_type() {
        let store = SnapshotStore::new();
        store.update(Domain::AirHandler, HeatPumpSnapshot::default());
        let blower = store.modify_air_handler(|b| b.blower_rpm = 500);
        assert_eq!(blower.blower_rpm, 500);
        assert_eq!(blower.air_flow_cfm, 0);
        assert_eq!(store.air_handler(), Some(blower));
    }

    #[test]
    fn stamps_move_forward() {
        let store = SnapshotStore::with_placeholders();
        let before = store.get_stamped(Domain::HeatPump).unwrap().updated_at;
        store.modify_heat_pump(|hp| hp.stage = 2);
        let after = store.get_stamped(Domain::HeatPump).unwrap().updated_at;
        assert!(after >= before);
    }

    #[test]
    fn derived_scalars_fall_back_to_zero() {
        let store = SnapshotStore::new();
        let scalars = store.derived_scalars();
        assert_eq!(scalars.blower_rpm, 0);
        assert_eq!(scalars.mode, "unknown");
    }
}
