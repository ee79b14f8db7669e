//! Cron-driven job scheduler.
//!
//! Every registered job gets its own tokio task. The task sleeps until the
//! job's next fire time (or shutdown), runs the job to completion on the
//! blocking pool, logs the outcome and repeats. A job therefore never overlaps
//! with itself, and an error in one run never stops later runs.

use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::error::{AppResult, DaqError};

/// A seconds-granularity cron expression (`sec min hour dom month dow [year]`).
#[derive(Debug, Clone)]
pub struct Cadence {
    expr: String,
    schedule: cron::Schedule,
}

impl Cadence {
    /// Parse a cron expression.
    pub fn parse(expr: &str) -> AppResult<Self> {
        let schedule = cron::Schedule::from_str(expr)?;
        Ok(Self {
            expr: expr.to_string(),
            schedule,
        })
    }

    /// The expression as configured.
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(after).next()
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

/// What a job run did, for the log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job did its work; the detail is logged
    Completed(String),
    /// Nothing to do this time
    Skipped(String),
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(detail) => write!(f, "completed: {detail}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// A unit of scheduled work.
///
/// `run` may block freely; it is always called off the async worker threads.
/// `now` is the scheduled fire time, so runs are reproducible in tests.
pub trait Job: Send + Sync {
    /// Stable name used in logs and by [`Scheduler::run_now`].
    fn name(&self) -> &'static str;
    /// Do one unit of work for the fire time `now`.
    fn run(&self, now: DateTime<Local>) -> AppResult<JobOutcome>;
}

struct Entry {
    cadence: Cadence,
    job: Arc<dyn Job>,
}

/// Registry of jobs and their cadences.
#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl Scheduler {
    /// Empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` to fire on `cadence`.
    pub fn add(&mut self, cadence: Cadence, job: Arc<dyn Job>) {
        info!(job = job.name(), cadence = %cadence, "job registered");
        self.entries.push(Entry { cadence, job });
    }

    /// Registered job names, in registration order.
    pub fn job_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.job.name()).collect()
    }

    /// Next fire time of every job after `after`.
    pub fn upcoming(&self, after: &DateTime<Local>) -> Vec<(&'static str, Option<DateTime<Local>>)> {
        self.entries
            .iter()
            .map(|e| (e.job.name(), e.cadence.next_after(after)))
            .collect()
    }

    /// Run the named job once, synchronously.
    pub fn run_now(&self, name: &str, now: DateTime<Local>) -> AppResult<JobOutcome> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.job.name() == name)
            .ok_or_else(|| DaqError::Schedule(format!("no job named '{name}'")))?;
        entry.job.run(now)
    }

    /// Spawn one worker per job. Workers exit when `shutdown` changes or its sender drops.
    pub fn start(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.entries
            .into_iter()
            .map(|entry| tokio::spawn(job_loop(entry, shutdown.clone())))
            .collect()
    }
}

async fn job_loop(entry: Entry, mut shutdown: watch::Receiver<bool>) {
    let name = entry.job.name();
    let mut last_fire: Option<DateTime<Local>> = None;

    loop {
        if *shutdown.borrow() {
            break;
        }

        // A timer can wake a little early; never fire the same instant twice.
        let now = Local::now();
        let from = match last_fire {
            Some(last) if last > now => last,
            _ => now,
        };
        let Some(next) = entry.cadence.next_after(&from) else {
            warn!(job = name, "cadence has no further fire times");
            break;
        };

        let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = sleep(wait) => {}
            _ = shutdown.changed() => break,
        }
        last_fire = Some(next);

        let job = Arc::clone(&entry.job);
        match tokio::task::spawn_blocking(move || job.run(next)).await {
            Ok(Ok(outcome)) => info!(job = name, %outcome, "job finished"),
            Ok(Err(err)) => error!(job = name, error = %err, "job failed"),
            Err(err) => error!(job = name, error = %err, "job panicked"),
        }
    }

    info!(job = name, "job worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Recorder {
        name: &'static str,
        runs: Mutex<Vec<DateTime<Local>>>,
        fail: bool,
        delay: Duration,
        busy: AtomicBool,
        overlapped: AtomicBool,
    }

    impl Job for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run(&self, now: DateTime<Local>) -> AppResult<JobOutcome> {
            if self.busy.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.runs.lock().push(now);
            std::thread::sleep(self.delay);
            self.busy.store(false, Ordering::SeqCst);
            if self.fail {
                Err(DaqError::Schedule("boom".into()))
            } else {
                Ok(JobOutcome::Completed("ok".into()))
            }
        }
    }

    fn recorder(fail: bool) -> Arc<Recorder> {
        sleeper("recorder", Duration::ZERO, fail)
    }

    fn sleeper(name: &'static str, delay: Duration, fail: bool) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            runs: Mutex::new(Vec::new()),
            fail,
            delay,
            busy: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
        })
    }

    #[test]
    fn daily_cadences() {
        let at = Local.with_ymd_and_hms(2024, 3, 17, 12, 0, 0).unwrap();

        let rotation = Cadence::parse("2 59 23 * * *").unwrap();
        assert_eq!(
            rotation.next_after(&at),
            Some(Local.with_ymd_and_hms(2024, 3, 17, 23, 59, 2).unwrap())
        );

        let retention = Cadence::parse("3 5 0 * * *").unwrap();
        assert_eq!(
            retention.next_after(&at),
            Some(Local.with_ymd_and_hms(2024, 3, 18, 0, 5, 3).unwrap())
        );

        let purge = Cadence::parse("4 0 1 1,15 * *").unwrap();
        assert_eq!(
            purge.next_after(&at),
            Some(Local.with_ymd_and_hms(2024, 4, 1, 1, 0, 4).unwrap())
        );
    }

    #[test]
    fn append_cadence_every_four_minutes() {
        let cadence = Cadence::parse("0 */4 * * * *").unwrap();
        let at = Local.with_ymd_and_hms(2024, 3, 17, 12, 1, 30).unwrap();
        let first = cadence.next_after(&at).unwrap();
        let second = cadence.next_after(&first).unwrap();
        assert_eq!(first, Local.with_ymd_and_hms(2024, 3, 17, 12, 4, 0).unwrap());
        assert_eq!(second - first, chrono::Duration::minutes(4));
    }

    #[test]
    fn bad_expression_is_rejected() {
        assert!(matches!(
            Cadence::parse("every tuesday"),
            Err(DaqError::Cron(_))
        ));
    }

    #[test]
    fn run_now_by_name() {
        let job = recorder(false);
        let mut scheduler = Scheduler::new();
        scheduler.add(Cadence::parse("0 0 0 * * *").unwrap(), job.clone());

        let now = Local::now();
        assert_eq!(
            scheduler.run_now("recorder", now).unwrap(),
            JobOutcome::Completed("ok".into())
        );
        assert_eq!(*job.runs.lock(), vec![now]);
        assert!(matches!(
            scheduler.run_now("missing", now),
            Err(DaqError::Schedule(_))
        ));
        assert_eq!(scheduler.job_names(), vec!["recorder"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_job_keeps_firing_until_shutdown() {
        let job = recorder(true);
        let mut scheduler = Scheduler::new();
        scheduler.add(Cadence::parse("* * * * * *").unwrap(), job.clone());

        let (tx, rx) = watch::channel(false);
        let handles = scheduler.start(rx);

        sleep(Duration::from_millis(2600)).await;
        tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        let runs = job.runs.lock().clone();
        assert!(runs.len() >= 2, "expected repeated runs, got {}", runs.len());
        assert!(runs.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_job_does_not_hold_up_others() {
        let slow = sleeper("slow", Duration::from_millis(1500), false);
        let fast = sleeper("fast", Duration::ZERO, false);
        let mut scheduler = Scheduler::new();
        scheduler.add(Cadence::parse("* * * * * *").unwrap(), slow.clone());
        scheduler.add(Cadence::parse("* * * * * *").unwrap(), fast.clone());

        let (tx, rx) = watch::channel(false);
        let handles = scheduler.start(rx);

        sleep(Duration::from_millis(3600)).await;
        tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        let fast_runs = fast.runs.lock().clone();
        let slow_runs = slow.runs.lock().clone();
        assert!(fast_runs.len() >= 3, "fast job ran {} times", fast_runs.len());
        assert!(fast_runs.windows(2).all(|w| w[0] < w[1]));
        assert!(slow_runs.len() < fast_runs.len());
        assert!(!slow.overlapped.load(Ordering::SeqCst));
    }
}
