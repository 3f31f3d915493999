use serde::{Deserialize, Serialize};
use serde_json::json;

use noema_store::TripleDraft;

/// Predicate under which facts are appended to the store.
pub const FACT_PREDICATE: &str = "kb.fact";

/// A statement with supporting evidence, before it is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    /// The asserted statement.
    pub statement: String,
    /// Evidence items supporting the statement.
    pub evidence: Vec<String>,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Producing system or operator.
    pub source: String,
    /// External references (URLs, ticket ids).
    pub references: Vec<String>,
}

impl Fact {
    /// Creates a fact with no evidence or references.
    #[must_use]
    pub fn new(
        statement: impl Into<String>,
        confidence: f32,
        source: impl Into<String>,
    ) -> Self {
        Self {
            statement: statement.into(),
            evidence: Vec::new(),
            confidence,
            source: source.into(),
            references: Vec::new(),
        }
    }

    /// Attaches evidence items.
    #[must_use]
    pub fn with_evidence(mut self, evidence: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.evidence = evidence.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches external references.
    #[must_use]
    pub fn with_references(
        mut self,
        references: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    /// Encodes the fact as a triple draft linking statement to evidence.
    #[must_use]
    pub fn to_draft(&self) -> TripleDraft {
        TripleDraft::new(
            self.statement.clone(),
            FACT_PREDICATE,
            json!({ "evidence": self.evidence, "references": self.references }).to_string(),
        )
        .confidence(self.confidence)
        .source(self.source.clone())
        .context("knowledge")
    }
}
