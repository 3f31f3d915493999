#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Belief-desire-intention agent manager. The in-memory agent map is
//! authoritative for the process lifetime; the triple store carries the
//! durable audit trail.

/// BDI data structures and the intention state machine.
#[path = "../module.rs"]
pub mod module;

/// The agent manager service surface.
#[path = "../manager.rs"]
pub mod manager;

pub use manager::{AgentError, AgentManager};
pub use module::{Agent, Belief, Desire, Intention, IntentionStatus};
