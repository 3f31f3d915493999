use crate::module::{
    parse_assignments, render_assignments, OperationalStep, Paradigm, ReasoningArtifact,
};

/// Domain tag given to artifacts translated into the denotational paradigm.
pub const STATE_TRANSFORM_DOMAIN: &str = "state-transform";

/// Translates reasoning artifacts between paradigms.
///
/// The correctness contract: a full round trip
/// axiomatic → operational → denotational → axiomatic preserves the set of
/// variable assignments named in the original pre- and postcondition, even
/// though the rendered text may differ. Assignments are carried through
/// canonical state maps at every hop.
#[derive(Debug, Default, Clone, Copy)]
pub struct SemanticBridge;

impl SemanticBridge {
    /// Translates the artifact into the target paradigm. Translating into
    /// the artifact's own paradigm is the identity.
    #[must_use]
    pub fn translate(&self, artifact: &ReasoningArtifact, target: Paradigm) -> ReasoningArtifact {
        match (artifact, target) {
            (source, target) if source.paradigm() == target => source.clone(),
            (
                ReasoningArtifact::Axiomatic {
                    precondition,
                    command,
                    postcondition,
                    ..
                },
                Paradigm::Operational,
            ) => {
                let initial_state = parse_assignments(precondition);
                let final_state = parse_assignments(postcondition);
                ReasoningArtifact::Operational {
                    initial_state,
                    steps: vec![OperationalStep::new(command.clone(), final_state.clone())],
                    final_state,
                }
            }
            (
                ReasoningArtifact::Axiomatic {
                    precondition,
                    postcondition,
                    ..
                },
                Paradigm::Denotational,
            ) => ReasoningArtifact::Denotational {
                expression: render_assignments(&parse_assignments(precondition)),
                domain: STATE_TRANSFORM_DOMAIN.into(),
                denotation: render_assignments(&parse_assignments(postcondition)),
                is_composable: None,
            },
            (
                ReasoningArtifact::Operational {
                    initial_state,
                    steps,
                    final_state,
                },
                Paradigm::Axiomatic,
            ) => ReasoningArtifact::Axiomatic {
                precondition: render_assignments(initial_state),
                command: join_actions(steps),
                postcondition: render_assignments(final_state),
                proof: None,
            },
            (
                ReasoningArtifact::Operational {
                    initial_state,
                    final_state,
                    ..
                },
                Paradigm::Denotational,
            ) => ReasoningArtifact::Denotational {
                expression: render_assignments(initial_state),
                domain: STATE_TRANSFORM_DOMAIN.into(),
                denotation: render_assignments(final_state),
                is_composable: None,
            },
            (
                ReasoningArtifact::Denotational {
                    expression,
                    domain,
                    denotation,
                    ..
                },
                Paradigm::Axiomatic,
            ) => ReasoningArtifact::Axiomatic {
                precondition: render_assignments(&parse_assignments(expression)),
                command: format!("interpret in {domain}"),
                postcondition: render_assignments(&parse_assignments(denotation)),
                proof: None,
            },
            (
                ReasoningArtifact::Denotational {
                    expression,
                    domain,
                    denotation,
                    ..
                },
                Paradigm::Operational,
            ) => {
                let initial_state = parse_assignments(expression);
                let final_state = parse_assignments(denotation);
                ReasoningArtifact::Operational {
                    initial_state,
                    steps: vec![OperationalStep::new(
                        format!("interpret in {domain}"),
                        final_state.clone(),
                    )],
                    final_state,
                }
            }
            // Same-paradigm pairs are handled by the identity guard above.
            (source, _) => source.clone(),
        }
    }
}

fn join_actions(steps: &[OperationalStep]) -> String {
    if steps.is_empty() {
        return "no-op".into();
    }
    steps
        .iter()
        .map(|step| step.action.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::StateMap;

    fn axiom(pre: &str, cmd: &str, post: &str) -> ReasoningArtifact {
        ReasoningArtifact::Axiomatic {
            precondition: pre.into(),
            command: cmd.into(),
            postcondition: post.into(),
            proof: None,
        }
    }

    #[test]
    fn same_paradigm_translation_is_identity() {
        let bridge = SemanticBridge;
        let artifact = axiom("x = 1", "x := x + 1", "x = 2");
        assert_eq!(bridge.translate(&artifact, Paradigm::Axiomatic), artifact);
    }

    #[test]
    fn axiomatic_to_operational_carries_the_command() {
        let bridge = SemanticBridge;
        let operational = bridge.translate(&axiom("x = 1", "x := x + 1", "x = 2"), Paradigm::Operational);
        match operational {
            ReasoningArtifact::Operational {
                initial_state,
                steps,
                final_state,
            } => {
                assert_eq!(initial_state.get("x").map(String::as_str), Some("1"));
                assert_eq!(steps.len(), 1);
                assert_eq!(steps[0].action, "x := x + 1");
                assert_eq!(final_state.get("x").map(String::as_str), Some("2"));
            }
            other => panic!("expected operational artifact, got {other:?}"),
        }
    }

    #[test]
    fn operational_to_axiomatic_joins_actions() {
        let bridge = SemanticBridge;
        let mut final_state = StateMap::new();
        final_state.insert("x".into(), "2".into());
        let operational = ReasoningArtifact::Operational {
            initial_state: StateMap::new(),
            steps: vec![
                OperationalStep::new("alloc", final_state.clone()),
                OperationalStep::new("store", final_state.clone()),
            ],
            final_state,
        };
        match bridge.translate(&operational, Paradigm::Axiomatic) {
            ReasoningArtifact::Axiomatic {
                precondition,
                command,
                postcondition,
                ..
            } => {
                assert_eq!(precondition, "");
                assert_eq!(command, "alloc; store");
                assert_eq!(postcondition, "x = 2");
            }
            other => panic!("expected axiomatic artifact, got {other:?}"),
        }
    }

    #[test]
    fn full_round_trip_preserves_assignment_sets() {
        let bridge = SemanticBridge;
        let original = axiom("y = 2 && x = 1", "swap-then-bump", "x = 2 && y = 1");
        let operational = bridge.translate(&original, Paradigm::Operational);
        let denotational = bridge.translate(&operational, Paradigm::Denotational);
        match bridge.translate(&denotational, Paradigm::Axiomatic) {
            ReasoningArtifact::Axiomatic {
                precondition,
                postcondition,
                ..
            } => {
                assert_eq!(
                    parse_assignments(&precondition),
                    parse_assignments("x = 1 && y = 2")
                );
                assert_eq!(
                    parse_assignments(&postcondition),
                    parse_assignments("x = 2 && y = 1")
                );
            }
            other => panic!("expected axiomatic artifact, got {other:?}"),
        }
    }
}
