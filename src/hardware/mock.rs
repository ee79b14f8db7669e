//! Mock Hardware Implementation
//!
//! Provides a simulated HVAC bus for testing without a physical thermostat.
//!
//! # Behaviour
//!
//! - Table reads return the values last set with [`MockDevice::set_tables`]
//! - Reads can be forced to fail to exercise the poller's skip path
//! - [`MockDevice::emit`] delivers a frame to every handler whose range
//!   contains the frame's source, synchronously on the caller's thread
//! - [`MockDevice::spawn_simulation`] drifts temperatures and emits blower and
//!   heat pump frames so the daemon can run end to end with `--simulate`

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use crate::decoders::{
    AIR_HANDLER_RANGE, HEAT_PUMP_RANGE, SIG_AIR_FLOW, SIG_BLOWER_RPM, SIG_HEAT_PUMP_STAGE,
    SIG_HEAT_PUMP_TEMPS,
};
use crate::hardware::capabilities::HvacDevice;
use crate::hardware::frame::{AddressRange, Frame, FrameHandler};
use crate::hardware::tables::{TStatCurrentParams, TStatZoneParams};

/// Bus address the simulated thermostat answers from.
const THERMOSTAT_ADDRESS: u16 = 0x2001;

/// Simulated HVAC bus.
pub struct MockDevice {
    tables: RwLock<(TStatZoneParams, TStatCurrentParams)>,
    handlers: Mutex<Vec<(AddressRange, FrameHandler)>>,
    fail_reads: AtomicBool,
    fail_open: AtomicBool,
    opened: AtomicBool,
    reads: AtomicUsize,
}

impl MockDevice {
    /// Heating on a cool morning: 70F inside, 45F outside.
    pub fn new() -> Self {
        let zone = TStatZoneParams {
            zone_hold: 0,
            z1_heat_setpoint: 68,
            z1_cool_setpoint: 76,
            z1_fan_mode: 0,
        };
        let current = TStatCurrentParams {
            z1_current_temp: 70,
            z1_current_humidity: 42,
            outdoor_air_temp: 45,
            mode: 0x20,
        };
        Self {
            tables: RwLock::new((zone, current)),
            handlers: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            opened: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }

    /// Replace both thermostat tables.
    pub fn set_tables(&self, zone: TStatZoneParams, current: TStatCurrentParams) {
        *self.tables.write() = (zone, current);
    }

    /// Make subsequent table reads fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `open` fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Whether `open` has succeeded.
    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of table reads attempted so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Deliver a frame to every registered handler whose range matches.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, frame: &Frame) -> usize {
        // Clone the handler list so a handler may register further handlers.
        let handlers: Vec<FrameHandler> = self
            .handlers
            .lock()
            .iter()
            .filter(|(range, _)| range.contains(frame.source))
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in &handlers {
            handler(frame);
        }
        handlers.len()
    }

    /// Drift the thermostat tables and emit equipment frames every `period`.
    pub fn spawn_simulation(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(?period, "mock HVAC simulation running");

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.simulate_step(),
                    _ = shutdown.changed() => break,
                }
            }
            info!("mock HVAC simulation stopped");
        })
    }

    fn simulate_step(&self) {
        let (indoor, outdoor, heating) = {
            let mut rng = rand::thread_rng();
            let mut tables = self.tables.write();
            let (zone, current) = &mut *tables;
            let outdoor = current
                .outdoor_air_temp
                .saturating_add_signed(rng.gen_range(-1..=1))
                .clamp(10, 100);
            let heating = current.z1_current_temp < zone.z1_heat_setpoint;
            let indoor_step: i8 = if heating { 1 } else { rng.gen_range(-1..=0) };
            current.outdoor_air_temp = outdoor;
            current.z1_current_temp = current
                .z1_current_temp
                .saturating_add_signed(indoor_step)
                .clamp(50, 90);
            current.mode = if heating { 0x20 } else { 0x00 };
            (current.z1_current_temp, outdoor, heating)
        };

        let rpm: u16 = if heating { 780 } else { 180 };
        let [rpm_hi, rpm_lo] = rpm.to_be_bytes();
        let hp_source = HEAT_PUMP_RANGE.low + 1;
        let ah_source = AIR_HANDLER_RANGE.low + 1;

        let mut blower = SIG_BLOWER_RPM.to_vec();
        blower.extend_from_slice(&[0x00, rpm_hi, rpm_lo]);
        self.emit(&Frame::new(ah_source, THERMOSTAT_ADDRESS, blower));

        let cfm: u16 = if heating { 850 } else { 0 };
        let [cfm_hi, cfm_lo] = cfm.to_be_bytes();
        let mut airflow = SIG_AIR_FLOW.to_vec();
        airflow.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, cfm_hi, cfm_lo]);
        self.emit(&Frame::new(ah_source, THERMOSTAT_ADDRESS, airflow));

        let outside = u16::from(outdoor) * 16;
        let coil = u16::from(indoor) * 16;
        let mut temps = SIG_HEAT_PUMP_TEMPS.to_vec();
        temps.extend_from_slice(&outside.to_be_bytes());
        temps.extend_from_slice(&coil.to_be_bytes());
        self.emit(&Frame::new(hp_source, THERMOSTAT_ADDRESS, temps));

        let stage = if heating { 1u8 << 1 } else { 0 };
        let mut stage_frame = SIG_HEAT_PUMP_STAGE.to_vec();
        stage_frame.push(stage);
        self.emit(&Frame::new(hp_source, THERMOSTAT_ADDRESS, stage_frame));
    }

    fn check_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("MockDevice: table read timed out"));
        }
        Ok(())
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HvacDevice for MockDevice {
    async fn open(&self) -> Result<()> {
        if self.fail_open.load(Ordering::SeqCst) {
            anyhow::bail!("MockDevice: transport unavailable");
        }
        self.opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn read_zone_params(&self) -> Result<TStatZoneParams> {
        self.check_read()?;
        Ok(self.tables.read().0)
    }

    async fn read_current_params(&self) -> Result<TStatCurrentParams> {
        self.check_read()?;
        Ok(self.tables.read().1)
    }

    fn snoop_responses(&self, range: AddressRange, handler: FrameHandler) {
        self.handlers.lock().push((range, handler));
    }
}
