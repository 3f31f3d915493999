use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use noema_reasoning::CompletionClient;
use noema_store::{AuditTrail, TripleDraft};
use shared_logging::{LogLevel, Telemetry};

use crate::{
    patterns::{ErrorPattern, PatternRegistry},
    tokens::{complexity_score, ThinkingToken},
};

/// Fixed token cost of checking one pattern against a segment.
pub const PATTERN_CHECK_COST: u32 = 2;

/// One matched error pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternFinding {
    /// Name of the matched pattern.
    pub pattern: String,
    /// What the pattern catches.
    pub description: String,
    /// Prior probability the match is a real defect.
    pub probability: f32,
    /// How to avoid the failure mode.
    pub prevention_strategy: String,
}

impl PatternFinding {
    fn from_pattern(pattern: &ErrorPattern) -> Self {
        Self {
            pattern: pattern.name.clone(),
            description: pattern.description.clone(),
            probability: pattern.probability,
            prevention_strategy: pattern.prevention_strategy.clone(),
        }
    }
}

/// Result of validating one code segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// True when the capped defect probability stays under 0.3.
    pub is_valid: bool,
    /// `1 - capped defect probability`.
    pub confidence: f32,
    /// Findings recorded within the token budget, in registry order.
    pub errors: Vec<PatternFinding>,
    /// Tokens spent on pattern checks.
    pub tokens_used: u32,
    /// `confidence` scaled by the fraction of budget left.
    pub reward: f32,
}

/// Risk-budgeted code validator over a fixed error-pattern registry.
#[derive(Clone)]
pub struct CognitiveValidator {
    registry: PatternRegistry,
    audit: Option<AuditTrail>,
    completion: Option<Arc<dyn CompletionClient>>,
    telemetry: Option<Telemetry>,
}

impl std::fmt::Debug for CognitiveValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitiveValidator")
            .field("patterns", &self.registry.len())
            .finish()
    }
}

impl CognitiveValidator {
    /// Creates a validator over an injected registry.
    #[must_use]
    pub fn new(registry: PatternRegistry) -> Self {
        Self {
            registry,
            audit: None,
            completion: None,
            telemetry: None,
        }
    }

    /// Attaches a best-effort audit trail.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditTrail) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Attaches a completion client used by [`Self::explain`].
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

    /// Allocates a thinking-token budget for the segment:
    /// `round(10 + complexity*2 + risk*20)`, where risk is the capped sum
    /// of matching pattern probabilities.
    #[must_use]
    pub fn allocate_tokens(&self, code: &str) -> ThinkingToken {
        ThinkingToken::allocate(complexity_score(code), self.risk(code))
    }

    /// Scans the registry in order, spending [`PATTERN_CHECK_COST`] per
    /// matching pattern. Scanning stops when the remaining budget cannot
    /// cover another check, so under tight budgets only earlier-registered
    /// patterns are examined.
    #[must_use]
    pub fn validate(&self, segment: &str) -> ValidationOutcome {
        let mut token = self.allocate_tokens(segment);
        let mut errors = Vec::new();
        for pattern in self.registry.iter() {
            if !pattern.matches(segment) {
                continue;
            }
            // The cost is uniform, so the first refusal ends the scan.
            if !token.spend(PATTERN_CHECK_COST) {
                break;
            }
            errors.push(PatternFinding::from_pattern(pattern));
        }
        let total: f32 = errors
            .iter()
            .map(|finding| finding.probability)
            .sum::<f32>()
            .min(1.0);
        let is_valid = total < 0.3;
        let confidence = 1.0 - total;
        let reward = if token.allocation == 0 {
            0.0
        } else {
            confidence * (token.remaining as f32 / token.allocation as f32)
        };
        let outcome = ValidationOutcome {
            is_valid,
            confidence,
            errors,
            tokens_used: token.used,
            reward,
        };
        self.record_audit(&outcome);
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Debug,
                "validation.run",
                json!({
                    "is_valid": outcome.is_valid,
                    "findings": outcome.errors.len(),
                    "tokens_used": outcome.tokens_used,
                }),
            );
        }
        outcome
    }

    /// Asks the completion client for a prose explanation of a finding.
    /// Purely advisory; `None` when no client is wired or the call fails.
    pub async fn explain(&self, finding: &PatternFinding) -> Option<String> {
        let client = self.completion.as_ref()?;
        client
            .complete(&format!(
                "Explain the '{}' error pattern: {}",
                finding.pattern, finding.description
            ))
            .await
            .ok()
    }

    fn risk(&self, code: &str) -> f32 {
        self.registry
            .iter()
            .filter(|pattern| pattern.matches(code))
            .map(|pattern| pattern.probability)
            .sum::<f32>()
            .min(1.0)
    }

    fn record_audit(&self, outcome: &ValidationOutcome) {
        let Some(audit) = &self.audit else { return };
        let names: Vec<&str> = outcome
            .errors
            .iter()
            .map(|finding| finding.pattern.as_str())
            .collect();
        audit.record(
            TripleDraft::new(
                format!("segment-{}", Uuid::new_v4()),
                "validation.run",
                json!({
                    "is_valid": outcome.is_valid,
                    "findings": names,
                    "tokens_used": outcome.tokens_used,
                })
                .to_string(),
            )
            .confidence(outcome.confidence.clamp(0.0, 1.0))
            .source("validation"),
        );
    }
}
