use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Variable assignments named by a condition, keyed deterministically.
pub type StateMap = BTreeMap<String, String>;

/// Extracts the variable assignments of a condition text.
///
/// The grammar is `&&`-joined `name = value` clauses; clauses carrying
/// comparison operators (`<=`, `>=`, `!=`, `==`) or malformed names are
/// constraints, not assignments, and are ignored.
#[must_use]
pub fn parse_assignments(text: &str) -> StateMap {
    let mut map = StateMap::new();
    for clause in text.split("&&") {
        let clause = clause.trim();
        if clause.is_empty()
            || clause.contains("<=")
            || clause.contains(">=")
            || clause.contains("!=")
            || clause.contains("==")
        {
            continue;
        }
        if let Some((name, value)) = clause.split_once('=') {
            let name = name.trim();
            let value = value.trim();
            let well_formed = !name.is_empty()
                && !value.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if well_formed {
                map.insert(name.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Renders a state map back to canonical condition text, in key order.
#[must_use]
pub fn render_assignments(state: &StateMap) -> String {
    state
        .iter()
        .map(|(name, value)| format!("{name} = {value}"))
        .collect::<Vec<_>>()
        .join(" && ")
}

/// The three reasoning paradigms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paradigm {
    /// Hoare-triple style assertions.
    Axiomatic,
    /// Step-by-step state transitions.
    Operational,
    /// Expression-to-meaning mappings.
    Denotational,
}

impl Paradigm {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Axiomatic => "axiomatic",
            Self::Operational => "operational",
            Self::Denotational => "denotational",
        }
    }
}

/// A scope boundary this engine deliberately does not cross. Returned
/// inside success payloads, never raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningLimitation {
    /// Supplied proofs are stored verbatim, never checked.
    ProofNotChecked,
    /// Transitions come from the caller; `action` text is never interpreted.
    NotAnInterpreter,
    /// Denotations are recorded; evaluation is delegated to the caller.
    EvaluationDelegated,
}

impl ReasoningLimitation {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProofNotChecked => "proof-not-checked",
            Self::NotAnInterpreter => "not-an-interpreter",
            Self::EvaluationDelegated => "evaluation-delegated",
        }
    }
}

/// One caller-declared transition of an operational artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalStep {
    /// What the caller says happened.
    pub action: String,
    /// The state the caller declares after the action.
    pub next_state: StateMap,
}

impl OperationalStep {
    /// Creates a step.
    #[must_use]
    pub fn new(action: impl Into<String>, next_state: StateMap) -> Self {
        Self {
            action: action.into(),
            next_state,
        }
    }
}

/// A reasoning artifact in exactly one paradigm. Translation boundaries
/// match exhaustively; a variant is never partially populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "paradigm", rename_all = "snake_case")]
pub enum ReasoningArtifact {
    /// Hoare triple with an optional, unchecked proof.
    Axiomatic {
        /// Assertion before the command.
        precondition: String,
        /// The command text.
        command: String,
        /// Assertion after the command.
        postcondition: String,
        /// Stored verbatim, never checked.
        proof: Option<String>,
    },
    /// Caller-declared state walk.
    Operational {
        /// Starting state.
        initial_state: StateMap,
        /// Declared transitions, in order.
        steps: Vec<OperationalStep>,
        /// State after the last step.
        final_state: StateMap,
    },
    /// Expression-to-denotation mapping.
    Denotational {
        /// The expression text.
        expression: String,
        /// Semantic domain the denotation lives in.
        domain: String,
        /// The caller-assigned meaning.
        denotation: String,
        /// Accepted and stored, never enforced.
        is_composable: Option<bool>,
    },
}

impl ReasoningArtifact {
    /// The paradigm of this artifact.
    #[must_use]
    pub const fn paradigm(&self) -> Paradigm {
        match self {
            Self::Axiomatic { .. } => Paradigm::Axiomatic,
            Self::Operational { .. } => Paradigm::Operational,
            Self::Denotational { .. } => Paradigm::Denotational,
        }
    }

    /// Store predicate artifacts of this paradigm are appended under.
    #[must_use]
    pub const fn predicate(&self) -> &'static str {
        match self {
            Self::Axiomatic { .. } => "reasoning.axiomatic",
            Self::Operational { .. } => "reasoning.operational",
            Self::Denotational { .. } => "reasoning.denotational",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_round_trip_canonically() {
        let parsed = parse_assignments("y = 2 && x = 1");
        assert_eq!(render_assignments(&parsed), "x = 1 && y = 2");
        assert_eq!(parse_assignments(&render_assignments(&parsed)), parsed);
    }

    #[test]
    fn comparison_clauses_are_not_assignments() {
        let parsed = parse_assignments("x = 1 && y >= 2 && z != 3 && w == 4");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get("x").map(String::as_str), Some("1"));
    }

    #[test]
    fn empty_condition_has_no_assignments() {
        assert!(parse_assignments("").is_empty());
        assert_eq!(render_assignments(&StateMap::new()), "");
    }

    #[test]
    fn artifact_reports_its_paradigm() {
        let artifact = ReasoningArtifact::Denotational {
            expression: "1 + 1".into(),
            domain: "arithmetic".into(),
            denotation: "2".into(),
            is_composable: None,
        };
        assert_eq!(artifact.paradigm(), Paradigm::Denotational);
        assert_eq!(artifact.predicate(), "reasoning.denotational");
    }
}
