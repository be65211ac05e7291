//! Journal reader for audit queries
//!
//! The journal is an audit trail only. Nothing here feeds vault state.

use crate::error::EventError;
use crate::event::{EventKind, VaultEvent};
use crate::store::journal_files;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Reads every journal file under a directory in day order
pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, EventError> {
        Ok(Self {
            files: journal_files(dir.as_ref())?,
        })
    }

    /// Feed each decoded event to `visit`, oldest first. Blank lines are skipped.
    fn scan(&self, mut visit: impl FnMut(VaultEvent)) -> Result<(), EventError> {
        for path in &self.files {
            let lines = BufReader::new(File::open(path)?).lines();
            for (offset, line) in lines.enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let event = serde_json::from_str(&line).map_err(|e| EventError::InvalidFile {
                    file: path.display().to_string(),
                    line: offset + 1,
                    reason: e.to_string(),
                })?;
                visit(event);
            }
        }
        Ok(())
    }

    fn collect_where(
        &self,
        keep: impl Fn(&VaultEvent) -> bool,
    ) -> Result<Vec<VaultEvent>, EventError> {
        let mut events = Vec::new();
        self.scan(|event| {
            if keep(&event) {
                events.push(event);
            }
        })?;
        Ok(events)
    }

    pub fn read_all(&self) -> Result<Vec<VaultEvent>, EventError> {
        self.collect_where(|_| true)
    }

    /// Events that refer to `tx_index`
    pub fn for_transaction(&self, tx_index: usize) -> Result<Vec<VaultEvent>, EventError> {
        self.collect_where(|e| e.tx_index() == Some(tx_index))
    }

    pub fn of_kind(&self, kind: EventKind) -> Result<Vec<VaultEvent>, EventError> {
        self.collect_where(|e| e.kind() == kind)
    }

    /// Number of events, validating every line on the way
    pub fn count(&self) -> Result<usize, EventError> {
        let mut count = 0;
        self.scan(|_| count += 1)?;
        Ok(count)
    }
}
