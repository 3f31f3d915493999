#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Knowledge base service: validated facts and priority-ordered rules over
//! the append-only triple store.

/// Fact types and their triple encoding.
#[path = "../facts.rs"]
pub mod facts;

/// Rule types, the condition grammar, and the ordered rule set.
#[path = "../rules.rs"]
pub mod rules;

/// The knowledge base service surface.
#[path = "../service.rs"]
pub mod service;

pub use facts::{Fact, FACT_PREDICATE};
pub use rules::{Condition, Rule, RuleContext, RuleError, RuleSet, RULE_PREDICATE};
pub use service::{KnowledgeError, KnowledgeService, RuleOutcome, ValidationReport};
