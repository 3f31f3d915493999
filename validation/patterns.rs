use regex::Regex;
use thiserror::Error;

/// Errors emitted while building detection rules.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A regex in the rule did not parse.
    #[error("invalid detection rule: {0}")]
    Rule(String),
}

/// Heuristic matcher for one error pattern: a trigger regex plus an
/// optional guard. The pattern fires when the trigger matches and the
/// guard does not.
#[derive(Debug, Clone)]
pub struct DetectionRule {
    trigger: Regex,
    guard: Option<Regex>,
}

impl DetectionRule {
    /// Creates a rule from a trigger regex.
    pub fn new(trigger: &str) -> Result<Self, PatternError> {
        Ok(Self {
            trigger: Regex::new(trigger).map_err(|err| PatternError::Rule(err.to_string()))?,
            guard: None,
        })
    }

    /// Adds a guard regex that suppresses the trigger.
    pub fn with_guard(mut self, guard: &str) -> Result<Self, PatternError> {
        self.guard =
            Some(Regex::new(guard).map_err(|err| PatternError::Rule(err.to_string()))?);
        Ok(self)
    }

    /// True when the code trips the trigger and no guard suppresses it.
    #[must_use]
    pub fn matches(&self, code: &str) -> bool {
        if !self.trigger.is_match(code) {
            return false;
        }
        self.guard
            .as_ref()
            .map_or(true, |guard| !guard.is_match(code))
    }
}

/// A known failure mode with its prior probability and prevention advice.
#[derive(Debug, Clone)]
pub struct ErrorPattern {
    /// Stable pattern name.
    pub name: String,
    /// What the pattern catches.
    pub description: String,
    /// Prior probability in [0, 1] that a match is a real defect.
    pub probability: f32,
    /// Axioms the pattern is derived from.
    pub axioms: Vec<String>,
    /// The matcher.
    pub detection: DetectionRule,
    /// How to avoid the failure mode.
    pub prevention_strategy: String,
}

impl ErrorPattern {
    /// Creates a pattern; probability is clamped into [0, 1].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        probability: f32,
        detection: DetectionRule,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            probability: probability.clamp(0.0, 1.0),
            axioms: Vec::new(),
            detection,
            prevention_strategy: String::new(),
        }
    }

    /// Attaches the axioms the pattern rests on.
    #[must_use]
    pub fn with_axioms(mut self, axioms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.axioms = axioms.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches prevention advice.
    #[must_use]
    pub fn prevention(mut self, strategy: impl Into<String>) -> Self {
        self.prevention_strategy = strategy.into();
        self
    }

    /// True when the code trips this pattern.
    #[must_use]
    pub fn matches(&self, code: &str) -> bool {
        self.detection.matches(code)
    }
}

/// Fixed, ordered pattern registry. Order is scan priority: under a tight
/// token budget only earlier patterns get checked.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<ErrorPattern>,
}

impl PatternRegistry {
    /// Creates a registry from an ordered pattern list.
    #[must_use]
    pub fn new(patterns: Vec<ErrorPattern>) -> Self {
        Self { patterns }
    }

    /// The packaged registry, most consequential patterns first.
    #[must_use]
    pub fn builtin() -> Self {
        let null_reference = ErrorPattern::new(
            "null-reference",
            "chained member access without a null check",
            0.35,
            DetectionRule::new(r"\w+\.\w+\.\w+\s*\(")
                .unwrap()
                .with_guard(r"(?i)(is_some|is_none|!=\s*null|==\s*null|\?\.|unwrap_or|\.and_then|if\s*\(\s*\w+\s*\))")
                .unwrap(),
        )
        .with_axioms(["every dereference needs a proof of presence"])
        .prevention("check the receiver before chaining member access");

        let unhandled_error = ErrorPattern::new(
            "unhandled-error",
            "failure path swallowed or force-unwrapped",
            0.3,
            DetectionRule::new(r"(?i)(\.unwrap\(\)|catch\s*\(\s*\)\s*\{\s*\}|except\s*:\s*pass)")
                .unwrap(),
        )
        .with_axioms(["errors propagate or are handled, never ignored"])
        .prevention("propagate the failure or handle it explicitly");

        let unbounded_loop = ErrorPattern::new(
            "unbounded-loop",
            "loop with no visible exit",
            0.3,
            DetectionRule::new(r"(?i)(while\s*\(?\s*true|loop\s*\{)")
                .unwrap()
                .with_guard(r"(?i)(break|return)")
                .unwrap(),
        )
        .with_axioms(["every loop needs a variant that decreases"])
        .prevention("add a termination condition or an explicit break");

        let unchecked_index = ErrorPattern::new(
            "unchecked-index",
            "direct indexing without a bounds check",
            0.25,
            DetectionRule::new(r"\w+\[[\w\s+*-]+\]")
                .unwrap()
                .with_guard(r"(?i)(\.len\(\)|\.get\(|bounds)")
                .unwrap(),
        )
        .with_axioms(["indices are valid only under a bounds proof"])
        .prevention("compare against the collection length or use a checked accessor");

        let division_by_zero = ErrorPattern::new(
            "division-by-zero",
            "division by a value not proven non-zero",
            0.2,
            DetectionRule::new(r"[\w)]\s*/\s*[A-Za-z_]\w*")
                .unwrap()
                .with_guard(r"(?i)(!=\s*0|>\s*0|==\s*0|is_zero|checked_div)")
                .unwrap(),
        )
        .with_axioms(["division requires a non-zero divisor"])
        .prevention("guard the divisor or use a checked division");

        Self::new(vec![
            null_reference,
            unhandled_error,
            unbounded_loop,
            unchecked_index,
            division_by_zero,
        ])
    }

    /// Iterates patterns in scan-priority order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorPattern> {
        self.patterns.iter()
    }

    /// The ordered pattern slice.
    #[must_use]
    pub fn patterns(&self) -> &[ErrorPattern] {
        &self.patterns
    }

    /// Number of registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when no patterns are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
