//! Journal writer
//!
//! Events land in `<dir>/<YYYY-MM-DD>.jsonl`, keyed by the UTC day of the
//! event timestamp. Every append is flushed before it returns.

use crate::error::EventError;
use crate::event::VaultEvent;
use chrono::NaiveDate;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const JOURNAL_EXT: &str = "jsonl";

/// Path of the journal file for `day`
pub fn day_file_path(dir: &Path, day: NaiveDate) -> PathBuf {
    dir.join(format!("{day}.{JOURNAL_EXT}"))
}

/// Journal files under `dir`, oldest day first. A missing directory has none.
pub fn journal_files(dir: &Path) -> Result<Vec<PathBuf>, EventError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    files.retain(|path| path.extension().is_some_and(|ext| ext == JOURNAL_EXT));
    files.sort();
    Ok(files)
}

struct DayFile {
    day: NaiveDate,
    writer: BufWriter<File>,
}

impl DayFile {
    fn open(dir: &Path, day: NaiveDate) -> Result<Self, EventError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(day_file_path(dir, day))?;
        Ok(Self {
            day,
            writer: BufWriter::new(file),
        })
    }
}

/// Append-only writer over a journal directory
pub struct EventStore {
    dir: PathBuf,
    open: Option<DayFile>,
    appended: u64,
}

impl EventStore {
    /// Open (creating if needed) the journal directory
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, EventError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            open: None,
            appended: 0,
        })
    }

    /// Write one event as a single JSON line
    pub fn append(&mut self, event: &VaultEvent) -> Result<(), EventError> {
        let day = event.timestamp().date_naive();
        let file = match self.open.take() {
            Some(current) if current.day == day => current,
            previous => {
                if let Some(mut previous) = previous {
                    previous.writer.flush()?;
                }
                DayFile::open(&self.dir, day)?
            }
        };
        let file = self.open.insert(file);

        serde_json::to_writer(&mut file.writer, event)?;
        file.writer.write_all(b"\n")?;
        file.writer.flush()?;

        self.appended += 1;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Events written through this handle
    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn flush(&mut self) -> Result<(), EventError> {
        if let Some(file) = self.open.as_mut() {
            file.writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
