use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use noema_store::{StoreError, TripleDraft, TriplePattern, TripleStore};
use shared_logging::{LogLevel, Telemetry};

use crate::{
    facts::{Fact, FACT_PREDICATE},
    rules::{Condition, Rule, RuleContext, RuleError, RuleSet, RULE_PREDICATE},
};

/// Errors emitted by the knowledge base service.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// A bound or required field was violated.
    #[error("validation error: {0}")]
    Validation(String),
    /// The rule condition did not parse.
    #[error(transparent)]
    Rule(#[from] RuleError),
    /// The underlying store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of applying the rule set to a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleOutcome {
    /// The highest-priority satisfied rule's consequence.
    Consequence {
        /// Name of the matched rule.
        rule_name: String,
        /// Its consequence.
        consequence: String,
    },
    /// No rule condition was satisfied.
    Inconclusive,
}

/// Result of validating a statement against stored knowledge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the statement is considered supported.
    pub is_valid: bool,
    /// Aggregate confidence in [0, 1].
    pub confidence: f32,
    /// Why the verdict was reached.
    pub reasons: Vec<String>,
    /// Follow-ups for the caller.
    pub suggestions: Vec<String>,
}

/// Knowledge base service over the triple store: validated facts plus
/// priority-ordered rule application.
#[derive(Debug, Clone)]
pub struct KnowledgeService {
    store: TripleStore,
    rules: Arc<RwLock<RuleSet>>,
    half_life_hours: f32,
    telemetry: Option<Telemetry>,
}

impl KnowledgeService {
    /// Creates a service with the default one-week recency half-life.
    #[must_use]
    pub fn new(store: TripleStore) -> Self {
        Self {
            store,
            rules: Arc::new(RwLock::new(RuleSet::default())),
            half_life_hours: 168.0,
            telemetry: None,
        }
    }

    /// Overrides the recency half-life used by `validate_fact`.
    #[must_use]
    pub fn with_half_life(mut self, hours: f32) -> Self {
        self.half_life_hours = hours;
        self
    }

    /// Attaches an operator channel.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Validates and appends a fact, returning the triple id.
    pub fn add_fact(&self, fact: &Fact) -> Result<Uuid, KnowledgeError> {
        if fact.statement.trim().is_empty() {
            return Err(KnowledgeError::Validation("statement is required".into()));
        }
        if !(0.0..=1.0).contains(&fact.confidence) {
            return Err(KnowledgeError::Validation(format!(
                "confidence {} outside [0, 1]",
                fact.confidence
            )));
        }
        let id = self.store.append(fact.to_draft())?;
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Debug,
                "knowledge.fact.added",
                json!({ "id": id, "statement": fact.statement }),
            );
        }
        Ok(id)
    }

    /// Validates and admits a rule, mirroring it to the store.
    pub fn add_rule(&self, rule: Rule) -> Result<Uuid, KnowledgeError> {
        if rule.priority > 10 {
            return Err(KnowledgeError::Validation(format!(
                "priority {} outside [0, 10]",
                rule.priority
            )));
        }
        if rule.domain.trim().is_empty() {
            return Err(KnowledgeError::Validation("domain is required".into()));
        }
        let condition = Condition::parse(&rule.condition)?;
        let draft = TripleDraft::new(
            rule.name.clone(),
            RULE_PREDICATE,
            serde_json::to_string(&rule).unwrap_or_default(),
        )
        .source("knowledge")
        .context(rule.domain.clone());
        let sequence = self.rules.write().insert(rule, condition);
        let id = self.store.append(draft)?;
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Debug,
                "knowledge.rule.added",
                json!({ "id": id, "sequence": sequence }),
            );
        }
        Ok(id)
    }

    /// Returns the consequence of the highest-priority satisfied rule, or
    /// `Inconclusive` when none match. Ties resolve to the earliest rule.
    #[must_use]
    pub fn apply_rules(&self, context: &RuleContext) -> RuleOutcome {
        let rules = self.rules.read();
        rules.best_match(context).map_or(RuleOutcome::Inconclusive, |stored| {
            RuleOutcome::Consequence {
                rule_name: stored.rule.name.clone(),
                consequence: stored.rule.consequence.clone(),
            }
        })
    }

    /// Validates a statement against stored facts; aggregate confidence is
    /// the recency-decay weighted mean of matches. Falls back to the rule
    /// set when no fact matches.
    #[must_use]
    pub fn validate_fact(&self, statement: &str) -> ValidationReport {
        let needle = statement.to_lowercase();
        let now = Utc::now();
        let mut weighted = 0.0f32;
        let mut weight_sum = 0.0f32;
        let mut reasons = Vec::new();
        for record in self
            .store
            .search(&TriplePattern::any().predicate(FACT_PREDICATE))
        {
            let subject = record.subject.to_lowercase();
            if !subject.contains(&needle) && !needle.contains(&subject) {
                continue;
            }
            let age_hours = (now - record.timestamp).num_minutes() as f32 / 60.0;
            let weight = 0.5f32.powf(age_hours.max(0.0) / self.half_life_hours);
            weighted += weight * record.confidence;
            weight_sum += weight;
            reasons.push(format!(
                "fact '{}' (confidence {:.2}, age {:.1}h)",
                record.subject, record.confidence, age_hours
            ));
        }
        if weight_sum > 0.0 {
            let confidence = weighted / weight_sum;
            let is_valid = confidence >= 0.5;
            let mut suggestions = Vec::new();
            if !is_valid {
                suggestions.push("record stronger supporting evidence".to_string());
            }
            return ValidationReport {
                is_valid,
                confidence,
                reasons,
                suggestions,
            };
        }
        let mut context = RuleContext::new();
        context.insert("statement".into(), json!(statement));
        self.rule_report(&context)
    }

    /// Builds a validation report from the rule set alone. Shared with the
    /// agent manager's belief-validation fallback.
    #[must_use]
    pub fn rule_report(&self, context: &RuleContext) -> ValidationReport {
        let rules = self.rules.read();
        rules.best_match(context).map_or_else(
            || ValidationReport {
                is_valid: false,
                confidence: 0.0,
                reasons: vec!["no matching facts or rules".into()],
                suggestions: vec!["record supporting facts before relying on this".into()],
            },
            |stored| ValidationReport {
                is_valid: true,
                confidence: f32::from(stored.rule.priority) / 10.0,
                reasons: vec![format!("rule '{}' matched", stored.rule.name)],
                suggestions: vec![stored.rule.consequence.clone()],
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use noema_store::TripleRecord;
    use std::io::Write;
    use tempfile::tempdir;

    fn fact_line(statement: &str, confidence: f32, age_hours: i64) -> String {
        let record = TripleRecord {
            id: Uuid::new_v4(),
            subject: statement.into(),
            predicate: FACT_PREDICATE.into(),
            object: json!({ "evidence": [], "references": [] }).to_string(),
            confidence,
            timestamp: Utc::now() - Duration::hours(age_hours),
            source: "test".into(),
            context: "knowledge".into(),
        };
        serde_json::to_string(&record).unwrap()
    }

    #[test]
    fn add_fact_rejects_confidence_out_of_bounds() {
        let service = KnowledgeService::new(TripleStore::in_memory());
        let err = service
            .add_fact(&Fact::new("statement", 1.2, "test"))
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Validation(_)));
    }

    #[test]
    fn add_rule_rejects_bad_priority_and_empty_domain() {
        let service = KnowledgeService::new(TripleStore::in_memory());
        let err = service
            .add_rule(Rule::new("r", "env=prod", "block", "deploy").priority(11))
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Validation(_)));
        let err = service
            .add_rule(Rule::new("r", "env=prod", "block", "  "))
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Validation(_)));
    }

    #[test]
    fn apply_rules_blocks_underapproved_prod_deploy() {
        let service = KnowledgeService::new(TripleStore::in_memory());
        service
            .add_rule(
                Rule::new("gate", "env=prod && approvals<2", "block-deploy", "deploy")
                    .priority(9),
            )
            .unwrap();
        let mut context = RuleContext::new();
        context.insert("env".into(), json!("prod"));
        context.insert("approvals".into(), json!(1));
        assert_eq!(
            service.apply_rules(&context),
            RuleOutcome::Consequence {
                rule_name: "gate".into(),
                consequence: "block-deploy".into(),
            }
        );
    }

    #[test]
    fn apply_rules_prefers_higher_priority() {
        let service = KnowledgeService::new(TripleStore::in_memory());
        service
            .add_rule(Rule::new("soft", "env=prod", "warn", "deploy").priority(3))
            .unwrap();
        service
            .add_rule(Rule::new("hard", "env=prod", "block", "deploy").priority(9))
            .unwrap();
        let mut context = RuleContext::new();
        context.insert("env".into(), json!("prod"));
        match service.apply_rules(&context) {
            RuleOutcome::Consequence { consequence, .. } => assert_eq!(consequence, "block"),
            RuleOutcome::Inconclusive => panic!("expected a consequence"),
        }
    }

    #[test]
    fn apply_rules_is_inconclusive_without_matches() {
        let service = KnowledgeService::new(TripleStore::in_memory());
        let context = RuleContext::new();
        assert_eq!(service.apply_rules(&context), RuleOutcome::Inconclusive);
    }

    #[test]
    fn validate_fact_weights_recent_matches_higher() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("triples.log");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", fact_line("deploys are safe", 0.9, 1)).unwrap();
        writeln!(file, "{}", fact_line("deploys are safe", 0.1, 2000)).unwrap();
        let store = TripleStore::open(&path, None).unwrap();
        let service = KnowledgeService::new(store);
        let report = service.validate_fact("deploys are safe");
        assert!(report.is_valid);
        assert!(report.confidence > 0.8, "recent fact should dominate");
        assert_eq!(report.reasons.len(), 2);
    }

    #[test]
    fn validate_fact_falls_back_to_rules() {
        let service = KnowledgeService::new(TripleStore::in_memory());
        service
            .add_rule(Rule::new("known", "statement=deploy", "proceed", "deploy").priority(8))
            .unwrap();
        let report = service.validate_fact("deploy");
        assert!(report.is_valid);
        assert!((report.confidence - 0.8).abs() < f32::EPSILON);
        assert_eq!(report.suggestions, vec!["proceed".to_string()]);
    }

    #[test]
    fn rules_are_mirrored_to_the_store() {
        let store = TripleStore::in_memory();
        let service = KnowledgeService::new(store.clone());
        service
            .add_rule(Rule::new("gate", "env=prod", "block", "deploy"))
            .unwrap();
        let hits: Vec<_> = store
            .search(&TriplePattern::any().predicate(RULE_PREDICATE))
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subject, "gate");
    }
}
