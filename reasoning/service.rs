use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use noema_store::{StoreError, TripleDraft, TripleStore};
use shared_logging::{LogLevel, Telemetry};

use crate::{
    completion::CompletionClient,
    module::{OperationalStep, ReasoningArtifact, ReasoningLimitation, StateMap},
};

/// Errors emitted by the reasoning service.
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// A required field was missing.
    #[error("validation error: {0}")]
    Validation(String),
    /// The underlying store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of recording an axiomatic artifact.
#[derive(Debug, Clone)]
pub struct AxiomaticVerdict {
    /// Store id of the persisted artifact.
    pub artifact_id: Uuid,
    /// True when precondition, command, and postcondition are all present.
    pub is_valid: bool,
    /// The proof text stored with the artifact, if any.
    pub proof: Option<String>,
    /// Always [`ReasoningLimitation::ProofNotChecked`].
    pub limitation: ReasoningLimitation,
}

/// One observed transition of an operational walk.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    /// The caller-declared action.
    pub action: String,
    /// State after the action.
    pub state_after: StateMap,
}

/// Result of recording an operational artifact.
#[derive(Debug, Clone)]
pub struct OperationalTrace {
    /// Store id of the persisted artifact.
    pub artifact_id: Uuid,
    /// State after the last declared step.
    pub final_state: StateMap,
    /// Per-step audit trail.
    pub transitions: Vec<TraceEntry>,
    /// Always [`ReasoningLimitation::NotAnInterpreter`].
    pub limitation: ReasoningLimitation,
}

/// Result of recording a denotational artifact.
#[derive(Debug, Clone)]
pub struct DenotationalValue {
    /// Store id of the persisted artifact.
    pub artifact_id: Uuid,
    /// Semantic domain the value is tagged with.
    pub domain: String,
    /// Domain-tagged placeholder; real evaluation stays with the caller.
    pub placeholder: String,
    /// Always [`ReasoningLimitation::EvaluationDelegated`].
    pub limitation: ReasoningLimitation,
}

/// Record-and-verify engine over the three reasoning paradigms.
///
/// Every operation persists its artifact as a triple for later audit and
/// translation. None of them prove, interpret, or evaluate anything; the
/// returned limitation says which boundary applies.
#[derive(Clone)]
pub struct SemanticReasoner {
    store: TripleStore,
    completion: Option<Arc<dyn CompletionClient>>,
    telemetry: Option<Telemetry>,
}

impl std::fmt::Debug for SemanticReasoner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticReasoner")
            .field("completion", &self.completion.is_some())
            .finish()
    }
}

impl SemanticReasoner {
    /// Creates a reasoner over the store.
    #[must_use]
    pub fn new(store: TripleStore) -> Self {
        Self {
            store,
            completion: None,
            telemetry: None,
        }
    }

    /// Attaches a completion client used to draft proof annotations.
    #[must_use]
    pub fn with_completion(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }

    /// Attaches an operator channel.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Records a Hoare triple. Valid iff all three core fields are
    /// non-empty; a proof is stored but never checked. Without a supplied
    /// proof, a wired completion client drafts an annotation.
    pub async fn verify_axiomatically(
        &self,
        precondition: &str,
        command: &str,
        postcondition: &str,
        proof: Option<String>,
    ) -> Result<AxiomaticVerdict, ReasoningError> {
        let is_valid = !precondition.trim().is_empty()
            && !command.trim().is_empty()
            && !postcondition.trim().is_empty();
        let proof = match (proof, &self.completion) {
            (Some(supplied), _) => Some(supplied),
            (None, Some(client)) if is_valid => client
                .complete(&format!(
                    "Draft a proof sketch for {{{precondition}}} {command} {{{postcondition}}}"
                ))
                .await
                .ok(),
            (None, _) => None,
        };
        let artifact = ReasoningArtifact::Axiomatic {
            precondition: precondition.to_string(),
            command: command.to_string(),
            postcondition: postcondition.to_string(),
            proof: proof.clone(),
        };
        let artifact_id = self.persist(&artifact, if is_valid { 1.0 } else { 0.0 })?;
        Ok(AxiomaticVerdict {
            artifact_id,
            is_valid,
            proof,
            limitation: ReasoningLimitation::ProofNotChecked,
        })
    }

    /// Walks caller-declared transitions in order: each step's `next_state`
    /// becomes the current state. Action text is never interpreted.
    pub fn execute_operationally(
        &self,
        initial_state: StateMap,
        steps: Vec<OperationalStep>,
    ) -> Result<OperationalTrace, ReasoningError> {
        let mut current = initial_state.clone();
        let mut transitions = Vec::with_capacity(steps.len());
        for step in &steps {
            current = step.next_state.clone();
            transitions.push(TraceEntry {
                action: step.action.clone(),
                state_after: current.clone(),
            });
        }
        let artifact = ReasoningArtifact::Operational {
            initial_state,
            steps,
            final_state: current.clone(),
        };
        let artifact_id = self.persist(&artifact, 1.0)?;
        Ok(OperationalTrace {
            artifact_id,
            final_state: current,
            transitions,
            limitation: ReasoningLimitation::NotAnInterpreter,
        })
    }

    /// Records an expression-to-denotation mapping and returns a
    /// domain-tagged placeholder. Evaluation is the caller's job.
    pub fn evaluate_denotationally(
        &self,
        expression: &str,
        domain: &str,
        denotation: &str,
        is_composable: Option<bool>,
    ) -> Result<DenotationalValue, ReasoningError> {
        if domain.trim().is_empty() {
            return Err(ReasoningError::Validation("domain is required".into()));
        }
        let artifact = ReasoningArtifact::Denotational {
            expression: expression.to_string(),
            domain: domain.to_string(),
            denotation: denotation.to_string(),
            is_composable,
        };
        let artifact_id = self.persist(&artifact, 1.0)?;
        Ok(DenotationalValue {
            artifact_id,
            domain: domain.to_string(),
            placeholder: format!("[[{expression}]] : {domain}"),
            limitation: ReasoningLimitation::EvaluationDelegated,
        })
    }

    fn persist(
        &self,
        artifact: &ReasoningArtifact,
        confidence: f32,
    ) -> Result<Uuid, ReasoningError> {
        let subject = format!("reasoning-{}", Uuid::new_v4());
        let id = self.store.append(
            TripleDraft::new(
                subject,
                artifact.predicate(),
                serde_json::to_string(artifact).unwrap_or_default(),
            )
            .confidence(confidence)
            .source("reasoning"),
        )?;
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Debug,
                "reasoning.artifact.recorded",
                json!({ "id": id, "paradigm": artifact.paradigm().as_str() }),
            );
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::LoopbackCompletionClient;
    use noema_store::TriplePattern;
    use std::collections::BTreeMap;

    fn state(entries: &[(&str, &str)]) -> StateMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn axiomatic_requires_all_core_fields() {
        let reasoner = SemanticReasoner::new(TripleStore::in_memory());
        let verdict = reasoner
            .verify_axiomatically("x = 1", "x := x + 1", "", None)
            .await
            .unwrap();
        assert!(!verdict.is_valid);
        assert_eq!(verdict.limitation, ReasoningLimitation::ProofNotChecked);
    }

    #[tokio::test]
    async fn missing_proof_is_drafted_by_completion_client() {
        let reasoner = SemanticReasoner::new(TripleStore::in_memory())
            .with_completion(Arc::new(LoopbackCompletionClient));
        let verdict = reasoner
            .verify_axiomatically("x = 1", "x := x + 1", "x = 2", None)
            .await
            .unwrap();
        assert!(verdict.is_valid);
        let proof = verdict.proof.unwrap();
        assert!(proof.starts_with("[loopback]"));
    }

    #[tokio::test]
    async fn supplied_proof_is_stored_verbatim() {
        let store = TripleStore::in_memory();
        let reasoner = SemanticReasoner::new(store.clone());
        let verdict = reasoner
            .verify_axiomatically("x = 1", "skip", "x = 1", Some("by inspection".into()))
            .await
            .unwrap();
        assert_eq!(verdict.proof.as_deref(), Some("by inspection"));
        let persisted = store.get(verdict.artifact_id).unwrap();
        assert!(persisted.object.contains("by inspection"));
    }

    #[test]
    fn operational_walk_follows_declared_states_not_actions() {
        let reasoner = SemanticReasoner::new(TripleStore::in_memory());
        let trace = reasoner
            .execute_operationally(
                state(&[("x", "0")]),
                vec![
                    OperationalStep::new("x := 99", state(&[("x", "1")])),
                    OperationalStep::new("noise", state(&[("x", "2")])),
                ],
            )
            .unwrap();
        assert_eq!(trace.final_state, state(&[("x", "2")]));
        assert_eq!(trace.transitions.len(), 2);
        assert_eq!(trace.limitation, ReasoningLimitation::NotAnInterpreter);
    }

    #[test]
    fn operational_walk_with_no_steps_keeps_initial_state() {
        let reasoner = SemanticReasoner::new(TripleStore::in_memory());
        let trace = reasoner
            .execute_operationally(state(&[("x", "7")]), Vec::new())
            .unwrap();
        assert_eq!(trace.final_state, state(&[("x", "7")]));
        assert!(trace.transitions.is_empty());
    }

    #[test]
    fn denotational_value_is_a_tagged_placeholder() {
        let store = TripleStore::in_memory();
        let reasoner = SemanticReasoner::new(store.clone());
        let value = reasoner
            .evaluate_denotationally("1 + 1", "arithmetic", "2", Some(true))
            .unwrap();
        assert_eq!(value.placeholder, "[[1 + 1]] : arithmetic");
        assert_eq!(value.limitation, ReasoningLimitation::EvaluationDelegated);
        let hits: Vec<_> = store
            .search(&TriplePattern::any().predicate("reasoning.denotational"))
            .collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn denotational_requires_a_domain() {
        let reasoner = SemanticReasoner::new(TripleStore::in_memory());
        let err = reasoner
            .evaluate_denotationally("1 + 1", "  ", "2", None)
            .unwrap_err();
        assert!(matches!(err, ReasoningError::Validation(_)));
    }

    #[test]
    fn artifacts_are_persisted_for_audit() {
        let store = TripleStore::in_memory();
        let reasoner = SemanticReasoner::new(store.clone());
        reasoner
            .execute_operationally(BTreeMap::new(), Vec::new())
            .unwrap();
        let hits: Vec<_> = store
            .search(&TriplePattern::any().predicate("reasoning.operational"))
            .collect();
        assert_eq!(hits.len(), 1);
    }
}
