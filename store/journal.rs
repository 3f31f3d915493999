use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use thiserror::Error;

use crate::record::TripleRecord;

/// Errors emitted by the durable journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Filesystem I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Records recovered from a journal, in append order.
#[derive(Debug, Default)]
pub struct Replay {
    /// Successfully decoded records.
    pub records: Vec<TripleRecord>,
    /// Lines that failed to decode and were skipped.
    pub skipped: usize,
}

/// Durable append-only journal of triple records, one JSON line each.
///
/// A record is written and flushed under a single lock acquisition, so a
/// reader replaying the file sees whole records or nothing.
#[derive(Debug)]
pub struct DurableLog {
    path: PathBuf,
    writer: Mutex<File>,
}

impl DurableLog {
    /// Creates or opens a journal at the desired path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Appends one record as a flushed JSON line.
    pub fn append(&self, record: &TripleRecord) -> Result<(), JournalError> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Reads back every decodable record at `path`, in append order.
    ///
    /// A missing file is an empty journal. Undecodable lines (torn tail
    /// after a crash) are skipped and counted, not fatal.
    pub fn replay(path: impl AsRef<Path>) -> Result<Replay, JournalError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Replay::default());
        }
        let content = fs::read_to_string(path)?;
        let mut replay = Replay::default();
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            match serde_json::from_str::<TripleRecord>(line) {
                Ok(record) => replay.records.push(record),
                Err(_) => replay.skipped += 1,
            }
        }
        Ok(replay)
    }

    /// Returns the underlying file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn record(subject: &str) -> TripleRecord {
        TripleRecord {
            id: Uuid::new_v4(),
            subject: subject.into(),
            predicate: "test".into(),
            object: "o".into(),
            confidence: 1.0,
            timestamp: Utc::now(),
            source: "test".into(),
            context: String::new(),
        }
    }

    #[test]
    fn appends_and_replays_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("triples.log");
        let journal = DurableLog::open(&path).unwrap();
        journal.append(&record("first")).unwrap();
        journal.append(&record("second")).unwrap();
        let replay = DurableLog::replay(&path).unwrap();
        assert_eq!(replay.records.len(), 2);
        assert_eq!(replay.records[0].subject, "first");
        assert_eq!(replay.records[1].subject, "second");
        assert_eq!(replay.skipped, 0);
    }

    #[test]
    fn replay_skips_torn_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("triples.log");
        let journal = DurableLog::open(&path).unwrap();
        journal.append(&record("whole")).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{\"id\":\"torn")
            .unwrap();
        let replay = DurableLog::replay(&path).unwrap();
        assert_eq!(replay.records.len(), 1);
        assert_eq!(replay.skipped, 1);
    }

    #[test]
    fn replay_of_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let replay = DurableLog::replay(dir.path().join("absent.log")).unwrap();
        assert!(replay.records.is_empty());
    }
}
