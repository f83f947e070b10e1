// src/capture.rs
//! Latest-fix storage and on-demand capture to the session log

use crate::{
    error::{CaptureError, LoggerError, Result},
    gps::data::{CapturedRecord, Position, RECORD_HEADER},
};
use chrono::Local;
use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, RwLock},
};

/// The most recent fix, written by the ingestion loop and read by capture
/// and the display.
#[derive(Debug, Clone, Default)]
pub struct FixStore {
    latest: Arc<RwLock<Option<Position>>>,
}

impl FixStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored fix. Last write wins.
    pub fn set_latest(&self, pos: Position) {
        // A poisoned slot still holds a plain Copy value, so keep going
        let mut guard = self.latest.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(pos);
    }

    /// Copy of the stored fix, if any. Never clears it.
    pub fn latest(&self) -> Option<Position> {
        *self.latest.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn has_fix(&self) -> bool {
        self.latest().is_some()
    }
}

/// Append-only destination for captured records.
pub trait RecordSink: Send {
    fn append(&mut self, record: &CapturedRecord) -> io::Result<()>;
}

/// CSV session log: header once, then one flushed line per record.
pub struct CsvLog<W: Write> {
    writer: W,
}

impl<W: Write> CsvLog<W> {
    /// Wrap a writer and emit the header row.
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{}", RECORD_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RecordSink for CsvLog<W> {
    fn append(&mut self, record: &CapturedRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", record.to_csv_line())?;
        self.writer.flush()
    }
}

/// A CSV log backed by a session file on disk.
pub struct SessionLog {
    path: PathBuf,
    log: CsvLog<BufWriter<File>>,
}

impl SessionLog {
    /// Create `session_YYYYMMDD_HHMMSS.csv` (local time) in `dir`, appending
    /// if it already exists.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| LoggerError::Other(format!("Failed to create output directory: {}", e)))?;

        let name = format!("session_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::Other(format!("Failed to open {}: {}", path.display(), e)))?;

        let log = CsvLog::new(BufWriter::new(file))?;
        Ok(Self { path, log })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl RecordSink for SessionLog {
    fn append(&mut self, record: &CapturedRecord) -> io::Result<()> {
        self.log.append(record)
    }
}

/// Capture path: reads the fix store and writes to the record sink.
pub struct Capture {
    fixes: FixStore,
    sink: Mutex<Box<dyn RecordSink>>,
}

impl Capture {
    pub fn new(fixes: FixStore, sink: Box<dyn RecordSink>) -> Self {
        Self {
            fixes,
            sink: Mutex::new(sink),
        }
    }

    /// Record the latest fix. The fix stays in the store afterwards.
    pub fn capture(&self) -> std::result::Result<CapturedRecord, CaptureError> {
        let pos = self.fixes.latest().ok_or(CaptureError::NoFixAvailable)?;
        let record = CapturedRecord::from(pos);

        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        sink.append(&record)?;

        Ok(record)
    }
}
