#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Cognitive validation service: scans code segments against a fixed,
//! ordered error-pattern registry under a per-segment thinking-token
//! budget.

/// Error patterns and the ordered registry.
#[path = "../patterns.rs"]
pub mod patterns;

/// Thinking-token budget allocation and spending.
#[path = "../tokens.rs"]
pub mod tokens;

/// The validator service surface.
#[path = "../service.rs"]
pub mod service;

pub use patterns::{DetectionRule, ErrorPattern, PatternError, PatternRegistry};
pub use service::{
    CognitiveValidator, PatternFinding, ValidationOutcome, PATTERN_CHECK_COST,
};
pub use tokens::{complexity_score, ThinkingToken};
