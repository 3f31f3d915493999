use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Predicate under which rules are mirrored to the store.
pub const RULE_PREDICATE: &str = "kb.rule";

/// Context a rule condition is evaluated against.
pub type RuleContext = IndexMap<String, Value>;

/// Errors emitted while parsing rule conditions.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A clause did not match the condition grammar.
    #[error("invalid condition clause: {0}")]
    Clause(String),
}

/// A condition/consequence pair applied in priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Rule name, used as the triple subject.
    pub name: String,
    /// Condition text (`&&`-joined comparison clauses).
    pub condition: String,
    /// Consequence returned when the condition is satisfied.
    pub consequence: String,
    /// Priority in [0, 10]; higher wins.
    pub priority: u8,
    /// Domain the rule belongs to; must be non-empty.
    pub domain: String,
    /// Free-form metadata.
    pub metadata: IndexMap<String, Value>,
}

impl Rule {
    /// Creates a rule with default priority 5.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        condition: impl Into<String>,
        consequence: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
            consequence: consequence.into(),
            priority: 5,
            domain: domain.into(),
            metadata: IndexMap::new(),
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Comparison operator allowed in a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Strictly less than (numeric).
    Lt,
    /// Less than or equal (numeric).
    Le,
    /// Strictly greater than (numeric).
    Gt,
    /// Greater than or equal (numeric).
    Ge,
}

/// Single `key OP literal` clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    /// Context key the clause reads.
    pub key: String,
    /// Comparison operator.
    pub op: CompareOp,
    /// Literal the context value is compared against.
    pub literal: String,
}

impl Clause {
    fn eval(&self, context: &RuleContext) -> bool {
        let Some(value) = context.get(&self.key) else {
            return false;
        };
        let actual = value_text(value);
        let numeric = actual
            .parse::<f64>()
            .ok()
            .zip(self.literal.parse::<f64>().ok());
        match self.op {
            CompareOp::Eq => numeric.map_or(actual == self.literal, |(a, b)| {
                (a - b).abs() < f64::EPSILON
            }),
            CompareOp::Ne => numeric.map_or(actual != self.literal, |(a, b)| {
                (a - b).abs() >= f64::EPSILON
            }),
            CompareOp::Lt => numeric.is_some_and(|(a, b)| a < b),
            CompareOp::Le => numeric.is_some_and(|(a, b)| a <= b),
            CompareOp::Gt => numeric.is_some_and(|(a, b)| a > b),
            CompareOp::Ge => numeric.is_some_and(|(a, b)| a >= b),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Parsed condition: a conjunction of comparison clauses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    clauses: Vec<Clause>,
}

impl Condition {
    /// Parses `&&`-joined `key OP literal` clauses.
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        let grammar = clause_grammar();
        let mut clauses = Vec::new();
        for raw in text.split("&&") {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(RuleError::Clause("empty clause".into()));
            }
            let captures = grammar
                .captures(raw)
                .ok_or_else(|| RuleError::Clause(raw.to_string()))?;
            let op = match &captures[2] {
                "!=" => CompareOp::Ne,
                "<=" => CompareOp::Le,
                ">=" => CompareOp::Ge,
                "<" => CompareOp::Lt,
                ">" => CompareOp::Gt,
                _ => CompareOp::Eq,
            };
            clauses.push(Clause {
                key: captures[1].to_string(),
                op,
                literal: captures[3].trim().to_string(),
            });
        }
        Ok(Self { clauses })
    }

    /// True when every clause holds against the context.
    #[must_use]
    pub fn eval(&self, context: &RuleContext) -> bool {
        self.clauses.iter().all(|clause| clause.eval(context))
    }
}

fn clause_grammar() -> Regex {
    Regex::new(r"^([A-Za-z_][\w.-]*)\s*(<=|>=|!=|=|<|>)\s*(.+)$").unwrap()
}

/// A rule admitted to the set, with its insertion sequence and parsed
/// condition. Sequence breaks priority ties: earlier wins.
#[derive(Debug, Clone)]
pub struct StoredRule {
    /// Insertion sequence number.
    pub sequence: usize,
    /// The rule as supplied.
    pub rule: Rule,
    /// Parsed condition.
    pub condition: Condition,
}

/// Ordered, append-only set of rules.
///
/// Duplicate (condition, consequence) pairs are allowed; the tie-break
/// favors the earlier insertion.
#[derive(Debug, Default)]
pub struct RuleSet {
    entries: Vec<StoredRule>,
}

impl RuleSet {
    /// Admits a rule, returning its sequence number.
    pub fn insert(&mut self, rule: Rule, condition: Condition) -> usize {
        let sequence = self.entries.len();
        self.entries.push(StoredRule {
            sequence,
            rule,
            condition,
        });
        sequence
    }

    /// Number of admitted rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no rules were admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-priority rule satisfied by the context; priority ties
    /// resolve to the earliest insertion.
    #[must_use]
    pub fn best_match(&self, context: &RuleContext) -> Option<&StoredRule> {
        let mut best: Option<&StoredRule> = None;
        for entry in &self.entries {
            if !entry.condition.eval(context) {
                continue;
            }
            let better = best.map_or(true, |current| entry.rule.priority > current.rule.priority);
            if better {
                best = Some(entry);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(entries: &[(&str, Value)]) -> RuleContext {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn parses_and_evaluates_conjunction() {
        let condition = Condition::parse("env=prod && approvals<2").unwrap();
        assert!(condition.eval(&context(&[
            ("env", json!("prod")),
            ("approvals", json!(1)),
        ])));
        assert!(!condition.eval(&context(&[
            ("env", json!("prod")),
            ("approvals", json!(2)),
        ])));
        assert!(!condition.eval(&context(&[("env", json!("staging"))])));
    }

    #[test]
    fn unknown_key_fails_the_clause() {
        let condition = Condition::parse("region!=eu").unwrap();
        assert!(!condition.eval(&context(&[])));
        assert!(condition.eval(&context(&[("region", json!("us"))])));
    }

    #[test]
    fn rejects_malformed_clause() {
        assert!(Condition::parse("env ~ prod").is_err());
        assert!(Condition::parse("env=prod && ").is_err());
    }

    #[test]
    fn best_match_prefers_priority_then_insertion() {
        let mut set = RuleSet::default();
        let ctx = context(&[("env", json!("prod"))]);
        set.insert(
            Rule::new("low", "env=prod", "warn", "deploy").priority(3),
            Condition::parse("env=prod").unwrap(),
        );
        set.insert(
            Rule::new("high", "env=prod", "block", "deploy").priority(9),
            Condition::parse("env=prod").unwrap(),
        );
        set.insert(
            Rule::new("high-later", "env=prod", "halt", "deploy").priority(9),
            Condition::parse("env=prod").unwrap(),
        );
        let best = set.best_match(&ctx).unwrap();
        assert_eq!(best.rule.name, "high");
    }

    #[test]
    fn duplicate_rules_are_admitted() {
        let mut set = RuleSet::default();
        let rule = Rule::new("dup", "env=prod", "block", "deploy");
        set.insert(rule.clone(), Condition::parse("env=prod").unwrap());
        set.insert(rule, Condition::parse("env=prod").unwrap());
        assert_eq!(set.len(), 2);
    }
}
