use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use shared_logging::{LogLevel, Telemetry};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    journal::{DurableLog, JournalError},
    record::{TripleDraft, TriplePattern, TripleRecord},
};

/// Errors emitted by the triple store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A bound or required field was violated before append.
    #[error("validation error: {0}")]
    Validation(String),
    /// No record matched the reference.
    #[error("triple not found: {0}")]
    NotFound(String),
    /// The durable journal could not be opened.
    #[error("durable journal unavailable: {0}")]
    Storage(#[from] JournalError),
}

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<TripleRecord>,
    latest: HashMap<(String, String), usize>,
}

impl StoreState {
    /// Appends to the in-memory log and maintains the latest-value index.
    /// Ties on timestamp resolve to the later append.
    fn insert(&mut self, record: TripleRecord) {
        let key = (record.subject.clone(), record.predicate.clone());
        let position = self.records.len();
        let replace = self
            .latest
            .get(&key)
            .map_or(true, |&existing| {
                record.timestamp >= self.records[existing].timestamp
            });
        self.records.push(record);
        if replace {
            self.latest.insert(key, position);
        }
    }
}

struct StoreInner {
    state: RwLock<StoreState>,
    journal: Mutex<Option<DurableLog>>,
    degraded: AtomicBool,
    telemetry: Option<Telemetry>,
}

/// Durable, append-only log of triple records shared by every service.
///
/// Cloning shares the same underlying store. Append is the only mutation;
/// reads see whole records or nothing.
#[derive(Clone)]
pub struct TripleStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for TripleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripleStore")
            .field("len", &self.len())
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

impl TripleStore {
    /// Creates a store with no durable journal.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(StoreState::default()),
                journal: Mutex::new(None),
                degraded: AtomicBool::new(false),
                telemetry: None,
            }),
        }
    }

    /// Opens a store backed by a JSON-lines journal, replaying any prior
    /// records to rebuild the in-memory log and latest-value index.
    pub fn open(path: impl AsRef<Path>, telemetry: Option<Telemetry>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let replay = DurableLog::replay(path)?;
        if replay.skipped > 0 {
            if let Some(tel) = &telemetry {
                let _ = tel.log(
                    LogLevel::Warn,
                    "store.replay.skipped",
                    json!({ "lines": replay.skipped, "path": path.display().to_string() }),
                );
            }
        }
        let journal = DurableLog::open(path)?;
        let mut state = StoreState::default();
        for record in replay.records {
            state.insert(record);
        }
        Ok(Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(state),
                journal: Mutex::new(Some(journal)),
                degraded: AtomicBool::new(false),
                telemetry,
            }),
        })
    }

    /// Appends a triple, returning its id.
    ///
    /// Confidence outside [0, 1] is rejected before any write. A durable
    /// journal failure degrades the store to memory-only instead of failing
    /// the call; the degradation is surfaced on the operator channel.
    pub fn append(&self, draft: TripleDraft) -> Result<Uuid, StoreError> {
        if !(0.0..=1.0).contains(&draft.confidence) {
            return Err(StoreError::Validation(format!(
                "confidence {} outside [0, 1]",
                draft.confidence
            )));
        }
        if draft.subject.trim().is_empty() || draft.predicate.trim().is_empty() {
            return Err(StoreError::Validation(
                "subject and predicate are required".into(),
            ));
        }
        let record = TripleRecord {
            id: Uuid::new_v4(),
            subject: draft.subject,
            predicate: draft.predicate,
            object: draft.object,
            confidence: draft.confidence,
            timestamp: Utc::now(),
            source: draft.source,
            context: draft.context,
        };
        self.inner.state.write().insert(record.clone());
        self.persist(&record);
        Ok(record.id)
    }

    /// Retrieves a record by id.
    pub fn get(&self, id: Uuid) -> Result<TripleRecord, StoreError> {
        self.inner
            .state
            .read()
            .records
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Lazily yields records matching the pattern, in no particular order.
    pub fn search(&self, pattern: &TriplePattern) -> impl Iterator<Item = TripleRecord> {
        let matched: Vec<TripleRecord> = self
            .inner
            .state
            .read()
            .records
            .iter()
            .filter(|record| pattern.matches(record))
            .cloned()
            .collect();
        matched.into_iter()
    }

    /// Returns the current value for (subject, predicate): the record with
    /// the maximum timestamp, ties broken by later append order.
    pub fn latest(&self, subject: &str, predicate: &str) -> Result<TripleRecord, StoreError> {
        let state = self.inner.state.read();
        state
            .latest
            .get(&(subject.to_string(), predicate.to_string()))
            .map(|&position| state.records[position].clone())
            .ok_or_else(|| StoreError::NotFound(format!("({subject}, {predicate})")))
    }

    /// Number of appended records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.read().records.len()
    }

    /// True when nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.read().records.is_empty()
    }

    /// Snapshot of the full log in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TripleRecord> {
        self.inner.state.read().records.clone()
    }

    /// True once the durable journal has been disabled after a write failure.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.inner.degraded.load(Ordering::Relaxed)
    }

    fn persist(&self, record: &TripleRecord) {
        let mut journal = self.inner.journal.lock();
        if let Some(log) = journal.as_ref() {
            if let Err(err) = log.append(record) {
                *journal = None;
                self.degrade(&err.to_string());
            }
        }
    }

    /// Switches to memory-only operation and raises the one-shot operator
    /// alarm. Availability is kept; durability is traded away.
    fn degrade(&self, reason: &str) {
        self.inner.degraded.store(true, Ordering::Relaxed);
        if let Some(tel) = &self.inner.telemetry {
            let _ = tel.log(
                LogLevel::Warn,
                "store.degraded",
                json!({ "reason": reason }),
            );
            let _ = tel.event("store.degraded", json!({ "reason": reason }));
        }
    }
}
