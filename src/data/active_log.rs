//! The active append-only log file.
//!
//! The file handle is owned by [`ActiveLog`]; the append and rotation jobs
//! share it behind one mutex so a rotation's close/rename/reopen sequence can
//! never interleave with an append.
//!
//! The header is written only when the file is created empty, so reopening
//! after a restart (including a restart between rename and reopen during a
//! rotation) never duplicates it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::log_record::HEADER;
use crate::error::{AppResult, DaqError};

/// Active log handle.
#[derive(Debug)]
pub struct ActiveLog {
    path: PathBuf,
    file: Option<File>,
}

impl ActiveLog {
    /// Open (or create, with header) the active log at startup.
    ///
    /// Failure here is fatal to the process.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let file = open_with_header(&path).map_err(|source| DaqError::StartupLogCreate {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "active log open");
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Location of the active log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a file handle is currently held.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Append one formatted record line.
    ///
    /// If a previous rotation failed to reopen the file, the reopen is retried here.
    pub fn append(&mut self, line: &str) -> AppResult<()> {
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => {
                warn!(path = %self.path.display(), "active log was closed, reopening");
                self.file.insert(open_with_header(&self.path)?)
            }
        };
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    /// Close the file, move it to `archive`, and start a fresh file with a header.
    ///
    /// Refuses to overwrite an existing archive; in that case the active log is
    /// left untouched and keeps accumulating.
    pub fn rotate(&mut self, archive: &Path) -> AppResult<()> {
        if archive.exists() {
            return Err(DaqError::RotationTargetExists(archive.to_path_buf()));
        }

        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }

        if let Err(err) = fs::rename(&self.path, archive) {
            // Keep logging to the old file rather than losing records.
            self.file = Some(open_with_header(&self.path)?);
            return Err(err.into());
        }
        info!(from = %self.path.display(), to = %archive.display(), "active log archived");

        self.file = Some(open_with_header(&self.path)?);
        Ok(())
    }
}

/// Open `path` for appending, writing the header if the file is new or empty.
fn open_with_header(path: &Path) -> io::Result<File> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if file.metadata()?.len() == 0 {
        writeln!(file, "{HEADER}")?;
        file.sync_data()?;
    }
    Ok(file)
}
