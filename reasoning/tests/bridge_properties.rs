//! Property-based tests for the semantic bridge.
//!
//! The central contract: a full round trip
//! axiomatic -> operational -> denotational -> axiomatic preserves the set
//! of variable assignments named in the original pre- and postcondition,
//! for randomized state maps.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use noema_reasoning::{
    parse_assignments, render_assignments, Paradigm, ReasoningArtifact, SemanticBridge, StateMap,
};

fn state_map_strategy() -> impl Strategy<Value = StateMap> {
    proptest::collection::btree_map("[a-z][a-z0-9_]{0,7}", "[A-Za-z0-9]{1,8}", 0..6)
}

fn axiomatic(pre: &StateMap, command: String, post: &StateMap) -> ReasoningArtifact {
    ReasoningArtifact::Axiomatic {
        precondition: render_assignments(pre),
        command,
        postcondition: render_assignments(post),
        proof: None,
    }
}

proptest! {
    /// A -> O -> D -> A keeps the pre/postcondition assignment sets intact.
    #[test]
    fn round_trip_preserves_assignment_sets(
        pre in state_map_strategy(),
        post in state_map_strategy(),
        command in "[a-z][a-z ]{0,19}",
    ) {
        let bridge = SemanticBridge;
        let original = axiomatic(&pre, command, &post);
        let operational = bridge.translate(&original, Paradigm::Operational);
        let denotational = bridge.translate(&operational, Paradigm::Denotational);
        let back = bridge.translate(&denotational, Paradigm::Axiomatic);
        match back {
            ReasoningArtifact::Axiomatic { precondition, postcondition, .. } => {
                prop_assert_eq!(parse_assignments(&precondition), pre);
                prop_assert_eq!(parse_assignments(&postcondition), post);
            }
            other => prop_assert!(false, "expected axiomatic artifact, got {:?}", other),
        }
    }

    /// Rendering then parsing a state map is the identity.
    #[test]
    fn render_parse_is_identity(state in state_map_strategy()) {
        prop_assert_eq!(parse_assignments(&render_assignments(&state)), state);
    }

    /// Translating into the artifact's own paradigm changes nothing.
    #[test]
    fn same_paradigm_translation_is_identity(
        pre in state_map_strategy(),
        post in state_map_strategy(),
    ) {
        let bridge = SemanticBridge;
        let original = axiomatic(&pre, "step".into(), &post);
        prop_assert_eq!(bridge.translate(&original, Paradigm::Axiomatic), original);
    }

    /// The reverse trip A -> D -> O -> A preserves assignment sets too.
    #[test]
    fn reverse_trip_preserves_assignment_sets(
        pre in state_map_strategy(),
        post in state_map_strategy(),
    ) {
        let bridge = SemanticBridge;
        let original = axiomatic(&pre, "step".into(), &post);
        let denotational = bridge.translate(&original, Paradigm::Denotational);
        let operational = bridge.translate(&denotational, Paradigm::Operational);
        let back = bridge.translate(&operational, Paradigm::Axiomatic);
        match back {
            ReasoningArtifact::Axiomatic { precondition, postcondition, .. } => {
                prop_assert_eq!(parse_assignments(&precondition), pre);
                prop_assert_eq!(parse_assignments(&postcondition), post);
            }
            other => prop_assert!(false, "expected axiomatic artifact, got {:?}", other),
        }
    }
}
