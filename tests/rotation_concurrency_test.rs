//! Appends racing a rotation: every record lands in exactly one file and
//! neither file gains a second header.

use chrono::{Duration, Local, TimeZone};
use hvac_daq::data::log_record::HEADER;
use hvac_daq::data::{ActiveLog, ArtifactLayout};
use hvac_daq::jobs::{AppendJob, RotationJob};
use hvac_daq::scheduler::{Job, JobOutcome};
use hvac_daq::snapshot::SnapshotStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

const WRITERS: usize = 4;
const APPENDS_PER_WRITER: usize = 150;

#[test]
fn appends_racing_a_rotation_land_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let log = Arc::new(Mutex::new(ActiveLog::open(layout.active_log_path()).unwrap()));
    let store = Arc::new(SnapshotStore::with_placeholders());

    let append = Arc::new(AppendJob::new(store, Arc::clone(&log)));
    let rotation = RotationJob::new(Arc::clone(&log), layout.clone());
    let base = Local.with_ymd_and_hms(2024, 3, 17, 0, 0, 0).unwrap();
    let rotate_at = Local.with_ymd_and_hms(2024, 3, 17, 23, 59, 2).unwrap();
    let start = Arc::new(Barrier::new(WRITERS + 1));

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let append = Arc::clone(&append);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let mut written = Vec::with_capacity(APPENDS_PER_WRITER);
                for i in 0..APPENDS_PER_WRITER {
                    let seconds = i64::try_from(w * APPENDS_PER_WRITER + i).unwrap();
                    match append.run(base + Duration::seconds(seconds)).unwrap() {
                        JobOutcome::Completed(line) => written.push(line),
                        other => panic!("append did not complete: {other}"),
                    }
                }
                written
            })
        })
        .collect();

    start.wait();
    thread::sleep(std::time::Duration::from_millis(5));
    rotation.run(rotate_at).unwrap();

    let written: Vec<String> = writers
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(written.len(), WRITERS * APPENDS_PER_WRITER);

    let archive = fs::read_to_string(layout.archive_path(rotate_at.date_naive())).unwrap();
    let active = fs::read_to_string(layout.active_log_path()).unwrap();

    for (name, text) in [("archive", &archive), ("active log", &active)] {
        assert!(text.starts_with(&format!("{HEADER}\n")), "{name} lacks a leading header");
        assert_eq!(
            text.lines().filter(|l| *l == HEADER).count(),
            1,
            "{name} has more than one header"
        );
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for line in archive.lines().chain(active.lines()).filter(|l| *l != HEADER) {
        *seen.entry(line).or_default() += 1;
    }
    assert_eq!(seen.len(), written.len(), "unexpected or torn lines in the log files");
    for line in &written {
        assert_eq!(seen.get(line.as_str()), Some(&1), "{line}");
    }
}
