use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;
use shared_event_bus::ErrorSink;
use tokio::runtime::Handle;

use crate::{record::TripleDraft, triples::TripleStore};

/// Fire-and-forget audit writer in front of the triple store.
///
/// `record` never fails and never blocks the primary call: drafts enter a
/// bounded queue and drain to the store on a background task when a tokio
/// runtime is present, inline otherwise. Queue overflow and append failures
/// land in the [`ErrorSink`], not in the caller.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    store: TripleStore,
    pending: Arc<Mutex<VecDeque<TripleDraft>>>,
    capacity: usize,
    errors: ErrorSink,
}

impl AuditTrail {
    /// Creates a trail with the given queue capacity.
    #[must_use]
    pub fn new(store: TripleStore, capacity: usize, errors: ErrorSink) -> Self {
        Self {
            store,
            pending: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            errors,
        }
    }

    /// Enqueues an audit triple. When the queue is full the oldest entry is
    /// shed to the error sink to keep the primary path unblocked.
    pub fn record(&self, draft: TripleDraft) {
        {
            let mut pending = self.pending.lock();
            if pending.len() >= self.capacity {
                if let Some(shed) = pending.pop_front() {
                    self.errors.push(
                        "audit",
                        format!(
                            "queue full, shed ({}, {})",
                            shed.subject, shed.predicate
                        ),
                    );
                }
            }
            pending.push_back(draft);
        }
        self.schedule_drain();
    }

    /// Drains every queued draft into the store immediately.
    pub fn flush(&self) {
        self.drain();
    }

    /// The sink collecting shed entries and append failures.
    #[must_use]
    pub fn errors(&self) -> &ErrorSink {
        &self.errors
    }

    fn schedule_drain(&self) {
        if let Ok(handle) = Handle::try_current() {
            let trail = self.clone();
            handle.spawn(async move {
                trail.drain();
            });
        } else {
            self.drain();
        }
    }

    fn drain(&self) {
        loop {
            let next = self.pending.lock().pop_front();
            let Some(draft) = next else { break };
            let label = (draft.subject.clone(), draft.predicate.clone());
            if let Err(err) = self.store.append(draft) {
                self.errors.push(
                    "audit",
                    format!("append ({}, {}) failed: {err}", label.0, label.1),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_inline_without_runtime() {
        let store = TripleStore::in_memory();
        let trail = AuditTrail::new(store.clone(), 8, ErrorSink::default());
        trail.record(TripleDraft::new("agent-1", "bdi.belief", "sky is blue"));
        assert_eq!(store.len(), 1);
        assert!(trail.errors().is_empty());
    }

    #[test]
    fn append_failure_lands_in_sink_not_caller() {
        let store = TripleStore::in_memory();
        let trail = AuditTrail::new(store.clone(), 8, ErrorSink::default());
        trail.record(TripleDraft::new("agent-1", "bdi.belief", "bad").confidence(2.0));
        assert!(store.is_empty());
        assert_eq!(trail.errors().len(), 1);
    }

    #[tokio::test]
    async fn bounded_queue_sheds_oldest_to_sink() {
        let store = TripleStore::in_memory();
        let trail = AuditTrail::new(store.clone(), 2, ErrorSink::default());
        trail.record(TripleDraft::new("a", "p", "1"));
        trail.record(TripleDraft::new("b", "p", "2"));
        trail.record(TripleDraft::new("c", "p", "3"));
        trail.flush();
        assert_eq!(store.len(), 2);
        let sink = trail.errors().snapshot();
        assert_eq!(sink.len(), 1);
        assert!(sink[0].detail.contains("(a, p)"));
    }
}
