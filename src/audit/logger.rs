use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::event::{AuditEvent, AuditRecord};
use super::{AuditError, AuditSink};

/// Append-only JSON-lines audit trail on the local filesystem.
///
/// One record per line. The file is reopened in append mode for every record,
/// so a deleted or rotated log is recreated instead of written to an unlinked
/// inode. Appends are serialized by a mutex and each record goes out in a
/// single `write_all`, so concurrent cases never interleave partial records.
pub struct JsonlAuditLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAuditLogger {
    /// Create a logger for `path`. The file (and its parent directory) is
    /// created on append whenever it is missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back in write order, for compliance review.
    pub fn read_all(&self) -> Result<Vec<Value>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value = serde_json::from_str(&line).map_err(|e| AuditError::Corrupt {
                line: idx + 1,
                reason: e.to_string(),
            })?;
            records.push(value);
        }
        Ok(records)
    }

    fn open(&self) -> Result<File, AuditError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(file)
    }
}

impl AuditSink for JsonlAuditLogger {
    fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        let _guard = self.write_lock.lock().map_err(|_| AuditError::Poisoned)?;
        // Stamped under the lock so file order and timestamp order agree.
        let line = render_line(&event)?;

        let written = self.open().and_then(|mut file| {
            file.write_all(line.as_bytes())?;
            file.flush()?;
            Ok(())
        });
        if let Err(e) = written {
            tracing::error!(path = %self.path.display(), error = %e, "Audit append failed");
            return Err(e);
        }
        Ok(())
    }
}

/// In-memory trail, for tests and embedding without a filesystem.
#[derive(Default)]
pub struct MemoryAuditSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw records, each newline-terminated, in append order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Parsed records in append order.
    pub fn records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }

    /// Records carrying the given type tag.
    pub fn records_of_type(&self, event_type: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r.get("type").and_then(Value::as_str) == Some(event_type))
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut lines = self.lines.lock().map_err(|_| AuditError::Poisoned)?;
        lines.push(render_line(&event)?);
        Ok(())
    }
}

/// Stamp the event with a server-side UTC timestamp and serialize it as one line.
fn render_line(event: &AuditEvent) -> Result<String, AuditError> {
    let record = AuditRecord {
        ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        event_type: event.event_type(),
        fields: event.fields(),
    };
    let mut line = serde_json::to_string(&record)?;
    line.push('\n');
    Ok(line)
}
