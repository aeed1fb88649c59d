//! Event history adapters.
//!
//! - [`JsonlEventStore`]: append-only JSON Lines file, one [`WaterEvent`]
//!   per line. Appends open the file in append mode and write a whole line
//!   at once, so a crash can at worst leave a truncated last line, which
//!   readers skip.
//! - [`MemoryEventStore`]: in-process history for tests and dry runs.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::app::ports::{EventStore, WaterEvent};
use crate::error::RemoteError;

// ── JSON Lines file ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JsonlEventStore {
    path: PathBuf,
}

impl JsonlEventStore {
    /// Use `path`, creating parent directories. The file itself is created
    /// on the first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RemoteError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        debug!("Event log at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStore for JsonlEventStore {
    fn log_event(&mut self, event: &WaterEvent) -> Result<(), RemoteError> {
        let mut line =
            serde_json::to_vec(event).map_err(|e| RemoteError::Storage(e.to_string()))?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<WaterEvent>, RemoteError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WaterEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    "Skipping unreadable line {} of {}: {e}",
                    index + 1,
                    self.path.display()
                ),
            }
        }

        // File order is append order; newest first means reversed.
        events.reverse();
        events.truncate(limit);
        Ok(events)
    }
}

// ── In-memory ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    events: Vec<WaterEvent>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event in append order.
    pub fn all(&self) -> &[WaterEvent] {
        &self.events
    }
}

impl EventStore for MemoryEventStore {
    fn log_event(&mut self, event: &WaterEvent) -> Result<(), RemoteError> {
        self.events.push(event.clone());
        Ok(())
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<WaterEvent>, RemoteError> {
        Ok(self.events.iter().rev().take(limit).cloned().collect())
    }
}
