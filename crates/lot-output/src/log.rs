//! `AssignmentLog`: an append-only CSV sink for agent assignments.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use csv::{Writer, WriterBuilder};
use parking_lot::Mutex;

use lot_core::{AgentId, Pos};
use lot_motion::LotObserver;

use crate::{AssignmentRow, OutputError, OutputResult};

struct Inner {
    writer:     Writer<File>,
    last_error: Option<OutputError>,
}

/// A [`LotObserver`] that appends one row per admitted agent.
///
/// The file is opened in append mode; the header is written only when the
/// file is new (or empty), so several runs can share one log.  Rows are
/// flushed as they are written.
///
/// Errors are stored internally because observer hooks have no return
/// value.  Check for them with [`take_error`][Self::take_error].
pub struct AssignmentLog {
    run_id: String,
    inner:  Mutex<Inner>,
}

impl AssignmentLog {
    pub fn open(path: &Path, run_id: impl Into<String>) -> OutputResult<Self> {
        let is_new = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(AssignmentRow::HEADER)?;
            writer.flush()?;
        }
        Ok(Self {
            run_id: run_id.into(),
            inner:  Mutex::new(Inner { writer, last_error: None }),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Append one row.
    pub fn append(&self, row: &AssignmentRow) -> OutputResult<()> {
        let mut inner = self.inner.lock();
        inner.writer.write_record(row.fields())?;
        inner.writer.flush()?;
        Ok(())
    }

    /// Take the stored write error (if any).  Returns `None` if all writes
    /// succeeded.
    pub fn take_error(&self) -> Option<OutputError> {
        self.inner.lock().last_error.take()
    }

    fn store_err(&self, result: OutputResult<()>) {
        if let Err(e) = result {
            let mut inner = self.inner.lock();
            // Keep only the first error.
            if inner.last_error.is_none() {
                inner.last_error = Some(e);
            }
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

impl LotObserver for AssignmentLog {
    fn on_assignment(&self, agent: AgentId, space: Pos) {
        let row = AssignmentRow {
            run_id:       self.run_id.clone(),
            agent_id:     agent.0,
            row:          space.row,
            col:          space.col,
            timestamp_ms: unix_millis(),
        };
        let result = self.append(&row);
        self.store_err(result);
    }
}
