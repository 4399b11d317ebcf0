use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;

use crate::record::{IterationRecord, SessionHeader, SessionSummary};

/// File name of the journal written by [`JsonLinesSink`].
pub const JOURNAL: &str = "journal.jsonl";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("journal i/o failed")]
    Io(#[from] std::io::Error),

    #[error("journal entry could not be serialized")]
    Json(#[from] serde_json::Error),

    #[error("session is already finished")]
    Finished,
}

/// Destination of an [`OptimizationLogger`](crate::OptimizationLogger).
///
/// A session is one `begin`, any number of `record`s, then one `finish`.
pub trait LogSink: Send {
    /// Opens the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be stored.
    fn begin(&mut self, header: &SessionHeader) -> Result<(), SinkError>;

    /// Stores the record of one iteration.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    fn record(&mut self, record: &IterationRecord) -> Result<(), SinkError>;

    /// Closes the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary cannot be stored or flushed.
    fn finish(&mut self, summary: &SessionSummary) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
struct Journal {
    header: Option<SessionHeader>,
    records: Vec<IterationRecord>,
    summary: Option<SessionSummary>,
}

/// Keeps the session in memory.
///
/// Clones share storage, so a handle kept by the caller sees what a logger
/// moved into a solver has recorded.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    journal: Arc<Mutex<Journal>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(&self) -> Option<SessionHeader> {
        self.with(|journal| journal.header.clone())
    }

    #[must_use]
    pub fn records(&self) -> Vec<IterationRecord> {
        self.with(|journal| journal.records.clone())
    }

    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.with(|journal| journal.summary.clone())
    }

    /// Takes the stored records, leaving the sink empty.
    #[must_use]
    pub fn drain(&self) -> Vec<IterationRecord> {
        self.with(|journal| mem::take(&mut journal.records))
    }

    fn with<T>(&self, f: impl FnOnce(&mut Journal) -> T) -> T {
        // A panic while holding the lock cannot leave a journal half-written.
        let mut journal = self.journal.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut journal)
    }
}

impl LogSink for MemorySink {
    fn begin(&mut self, header: &SessionHeader) -> Result<(), SinkError> {
        self.with(|journal| {
            journal.header = Some(header.clone());
            journal.records.clear();
            journal.summary = None;
        });
        Ok(())
    }

    fn record(&mut self, record: &IterationRecord) -> Result<(), SinkError> {
        self.with(|journal| journal.records.push(record.clone()));
        Ok(())
    }

    fn finish(&mut self, summary: &SessionSummary) -> Result<(), SinkError> {
        self.with(|journal| journal.summary = Some(summary.clone()));
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Entry<'a> {
    Begin(&'a SessionHeader),
    Iteration(&'a IterationRecord),
    Finish(&'a SessionSummary),
}

/// Writes the session as JSON lines to `journal.jsonl` in a directory.
///
/// Each line is an object tagged by an `event` field: one `begin` line, one
/// `iteration` line per record, and a closing `finish` line.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Creates `directory` if needed and truncates its journal.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be created.
    pub fn create(directory: impl AsRef<Path>) -> Result<Self, SinkError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        let path = directory.join(JOURNAL);
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&mut self, entry: &Entry<'_>) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Finished)?;
        serde_json::to_writer(&mut *writer, entry)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl LogSink for JsonLinesSink {
    fn begin(&mut self, header: &SessionHeader) -> Result<(), SinkError> {
        self.write(&Entry::Begin(header))
    }

    fn record(&mut self, record: &IterationRecord) -> Result<(), SinkError> {
        self.write(&Entry::Iteration(record))
    }

    fn finish(&mut self, summary: &SessionSummary) -> Result<(), SinkError> {
        self.write(&Entry::Finish(summary))?;
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
