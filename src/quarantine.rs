//! Append-only log of images that failed to load during a session.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use tracing::{error, warn};

/// Session-scoped failure log. The file is named after the session start
/// timestamp and created lazily on the first failure, so clean sessions
/// leave nothing behind.
pub struct Quarantine {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl Quarantine {
    pub fn new(dir: &Path) -> Self {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        Self {
            path: dir.join(format!("bad_images_{stamp}.log")),
            file: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one failure line: `<timestamp> - <message>`. Logging must not
    /// take the show down, so write errors are reported and swallowed.
    pub fn record(&self, message: &str) {
        warn!(log = %self.path.display(), "quarantined: {message}");
        let mut slot = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            match self.create_with_header() {
                Ok(file) => *slot = Some(file),
                Err(err) => {
                    error!(path = %self.path.display(), "cannot create quarantine log: {err}");
                    return;
                }
            }
        }
        if let Some(file) = slot.as_mut() {
            let line = format!("{} - {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
            if let Err(err) = file.write_all(line.as_bytes()) {
                error!(path = %self.path.display(), "quarantine write failed: {err}");
            }
        }
    }

    fn create_with_header(&self) -> std::io::Result<File> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "# Corrupted images log")?;
        writeln!(file, "# Created: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file)?;
        Ok(file)
    }
}
