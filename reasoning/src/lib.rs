#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Semantic reasoning service: records and translates reasoning artifacts
//! in three paradigms (axiomatic, operational, denotational). Deliberately
//! a bookkeeping engine, not a solver.

/// Paradigm-tagged artifact types and state-map assignment handling.
#[path = "../module.rs"]
pub mod module;

/// LLM completion client seam.
#[path = "../completion.rs"]
pub mod completion;

/// The record-and-verify service surface.
#[path = "../service.rs"]
pub mod service;

/// Bidirectional paradigm translation.
#[path = "../bridge.rs"]
pub mod bridge;

pub use bridge::SemanticBridge;
pub use completion::{CompletionClient, CompletionError, LoopbackCompletionClient};
pub use module::{
    parse_assignments, render_assignments, OperationalStep, Paradigm, ReasoningArtifact,
    ReasoningLimitation, StateMap,
};
pub use service::{
    AxiomaticVerdict, DenotationalValue, OperationalTrace, ReasoningError, SemanticReasoner,
};
