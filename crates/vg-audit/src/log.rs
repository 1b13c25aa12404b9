// log.rs — Append-only JSONL audit log.
//
// One AuditRecord per line. Each record carries the SHA-256 hash of the
// previous raw line in `previous_hash`, so any insertion, deletion or edit
// breaks the chain and is caught by `verify_chain`.
//
// The writer sits behind a Mutex so the log can be shared as an
// `Arc<dyn EventSink>` between the registry and the executor.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use vg_core::Address;

use crate::error::AuditError;
use crate::event::{AuditRecord, GuardEvent};
use crate::hasher;
use crate::sink::EventSink;

struct ChainWriter {
    writer: BufWriter<File>,
    /// Hash of the last line written; becomes `previous_hash` of the next record.
    last_hash: Option<String>,
}

/// An append-only audit log backed by a JSONL file.
pub struct AuditLog {
    path: PathBuf,
    inner: Mutex<ChainWriter>,
}

impl AuditLog {
    /// Open (or create) an audit log at the given path.
    ///
    /// An existing log is scanned for its last line so new records continue
    /// the same hash chain.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let last_hash = if path.exists() {
            Self::read_last_hash(&path)?
        } else {
            None
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            inner: Mutex::new(ChainWriter {
                writer: BufWriter::new(file),
                last_hash,
            }),
        })
    }

    /// Append a record, linking it to the previous one. Flushes after writing.
    pub fn append(&self, record: &mut AuditRecord) -> Result<(), AuditError> {
        let mut chain = self.inner.lock().map_err(|_| AuditError::LockPoisoned)?;

        record.previous_hash = chain.last_hash.clone();
        let line = serde_json::to_string(record)?;

        writeln!(chain.writer, "{}", line)?;
        chain.writer.flush()?;
        chain.last_hash = Some(hasher::hash_line(&line));

        Ok(())
    }

    /// Read every record from a log file, oldest first. Blank lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, AuditError> {
        let reader = Self::reader(path.as_ref())?;
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        Ok(records)
    }

    /// Verify the hash chain of a log file.
    ///
    /// Returns `Ok(n)` with the number of verified records, or
    /// `IntegrityViolation` naming the first broken line.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<usize, AuditError> {
        let reader = Self::reader(path.as_ref())?;
        let mut previous_hash: Option<String> = None;
        let mut verified = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record: AuditRecord = serde_json::from_str(&line)?;
            if record.previous_hash != previous_hash {
                return Err(AuditError::IntegrityViolation {
                    line: line_num + 1,
                    expected: previous_hash.unwrap_or_else(|| "None".to_string()),
                    actual: record.previous_hash.unwrap_or_else(|| "None".to_string()),
                });
            }

            // Hash the raw line, not a re-serialization: field order must not matter.
            previous_hash = Some(hasher::hash_line(&line));
            verified += 1;
        }

        Ok(verified)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(path: &Path) -> Result<BufReader<File>, AuditError> {
        let file = File::open(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(BufReader::new(file))
    }

    fn read_last_hash(path: &Path) -> Result<Option<String>, AuditError> {
        let mut last_line: Option<String> = None;
        for line in Self::reader(path)?.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                last_line = Some(line);
            }
        }
        Ok(last_line.map(|line| hasher::hash_line(&line)))
    }
}

impl EventSink for AuditLog {
    fn record(&self, source: Address, event: GuardEvent) -> Result<(), AuditError> {
        let mut record = AuditRecord::new(source, event);
        self.append(&mut record)
    }
}
