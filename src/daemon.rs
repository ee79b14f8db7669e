//! Process wiring: startup, workers and shutdown.
//!
//! Startup order:
//!
//! 1. seed the snapshot store with placeholders
//! 2. register the event decoders with the device
//! 3. open the device (fatal on failure)
//! 4. open the active log (fatal on failure)
//! 5. start the scheduled jobs and the state poller
//!
//! Workers stop when the shutdown future resolves; in-flight job runs finish first.

use chrono::Local;
use parking_lot::Mutex;
use std::fs;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::HvacConfig;
use crate::data::{ActiveLog, ArtifactLayout};
use crate::decoders::attach_decoders;
use crate::error::{AppResult, DaqError};
use crate::hardware::HvacDevice;
use crate::jobs::{AppendJob, LogPurgeJob, RetentionJob, RotationJob, SharedLog};
use crate::poller::state_poller;
use crate::scheduler::{Cadence, Scheduler};
use crate::snapshot::SnapshotStore;

/// Register the four jobs with their configured cadences.
pub fn build_scheduler(
    config: &HvacConfig,
    store: Arc<SnapshotStore>,
    log: SharedLog,
) -> AppResult<Scheduler> {
    let layout = ArtifactLayout::from_config(&config.storage);
    let cadences = &config.schedule;
    let mut scheduler = Scheduler::new();

    scheduler.add(
        Cadence::parse(&cadences.append)?,
        Arc::new(AppendJob::new(store, Arc::clone(&log))),
    );
    scheduler.add(
        Cadence::parse(&cadences.rotation)?,
        Arc::new(RotationJob::new(log, layout.clone())),
    );
    scheduler.add(
        Cadence::parse(&cadences.retention)?,
        Arc::new(RetentionJob::new(layout, config.storage.retention_days)),
    );
    scheduler.add(
        Cadence::parse(&cadences.log_purge)?,
        Arc::new(LogPurgeJob::new(config.logging.dir.clone())),
    );

    Ok(scheduler)
}

/// Open the active log, creating the data directory if needed.
pub fn open_active_log(config: &HvacConfig) -> AppResult<SharedLog> {
    let layout = ArtifactLayout::from_config(&config.storage);
    let path = layout.active_log_path();
    fs::create_dir_all(layout.data_dir())
        .map_err(|source| DaqError::StartupLogCreate { path: path.clone(), source })?;
    Ok(Arc::new(Mutex::new(ActiveLog::open(path)?)))
}

/// The long-running telemetry process.
pub struct Daemon {
    config: HvacConfig,
    device: Arc<dyn HvacDevice>,
    store: Arc<SnapshotStore>,
}

impl Daemon {
    /// Daemon over `device`, with a placeholder-seeded store.
    pub fn new(config: HvacConfig, device: Arc<dyn HvacDevice>) -> Self {
        Self {
            config,
            device,
            store: Arc::new(SnapshotStore::with_placeholders()),
        }
    }

    /// Shared snapshot store, for an external request-serving layer.
    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Run until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "cannot listen for Ctrl-C, stopping");
            }
        })
        .await
    }

    /// Run until `stop` resolves, then shut every worker down and wait for them.
    pub async fn run_until<F>(self, stop: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        let Daemon {
            config,
            device,
            store,
        } = self;

        attach_decoders(device.as_ref(), Arc::clone(&store));
        device
            .open()
            .await
            .map_err(|e| DaqError::Device(format!("{e:#}")))?;
        info!(transport = %config.device.transport, "device open");

        let log = open_active_log(&config)?;

        if config.logging.to_file {
            if let Err(err) = fs::create_dir_all(&config.logging.dir) {
                warn!(dir = %config.logging.dir.display(), error = %err, "cannot create log directory");
            }
        }

        let scheduler = build_scheduler(&config, Arc::clone(&store), log)?;
        let now = Local::now();
        for (job, next) in scheduler.upcoming(&now) {
            match next {
                Some(next) => info!(job, next = %next.format("%Y-%m-%d %H:%M:%S"), "job scheduled"),
                None => warn!(job, "job will never fire"),
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut workers = scheduler.start(shutdown_rx.clone());
        workers.push(tokio::spawn(state_poller(
            device,
            store,
            config.poll_interval(),
            shutdown_rx,
        )));
        info!(workers = workers.len(), "hvac_daq running");

        stop.await;
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);

        for worker in workers {
            if let Err(err) = worker.await {
                error!(error = %err, "worker ended abnormally");
            }
        }
        info!("hvac_daq stopped");
        Ok(())
    }
}
