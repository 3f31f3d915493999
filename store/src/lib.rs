#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Append-only triple store: the single durable trail every Noema service
//! reads and writes through. Records are immutable once appended; "current"
//! values are reductions over the ordered log.

/// Triple record, draft, and search pattern types.
#[path = "../record.rs"]
pub mod record;

/// Durable JSON-lines journal with crash-recovery replay.
#[path = "../journal.rs"]
pub mod journal;

/// The triple store itself.
#[path = "../triples.rs"]
pub mod triples;

/// Fire-and-forget audit trail queue in front of the store.
#[path = "../audit.rs"]
pub mod audit;

pub use audit::AuditTrail;
pub use journal::{DurableLog, JournalError, Replay};
pub use record::{TripleDraft, TriplePattern, TripleRecord};
pub use triples::{StoreError, TripleStore};
