use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable fact record with confidence and provenance.
///
/// Once appended a record is never mutated or deleted; revisions are new
/// records with the same (subject, predicate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleRecord {
    /// Unique identifier assigned at append time.
    pub id: Uuid,
    /// Subject of the statement.
    pub subject: String,
    /// Predicate relating subject and object.
    pub predicate: String,
    /// Object payload (free text or JSON).
    pub object: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Append timestamp.
    pub timestamp: DateTime<Utc>,
    /// Producing system or operator.
    pub source: String,
    /// Originating context label.
    pub context: String,
}

/// Caller-supplied fields of a triple before it is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleDraft {
    /// Subject of the statement.
    pub subject: String,
    /// Predicate relating subject and object.
    pub predicate: String,
    /// Object payload.
    pub object: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Producing system or operator.
    pub source: String,
    /// Originating context label.
    pub context: String,
}

impl TripleDraft {
    /// Creates a draft with full confidence and no provenance.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            confidence: 1.0,
            source: "core".into(),
            context: String::new(),
        }
    }

    /// Sets the confidence.
    #[must_use]
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the source.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the context label.
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Search pattern over the log. Unset fields match everything; text fields
/// match by case-insensitive substring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriplePattern {
    /// Subject substring.
    pub subject: Option<String>,
    /// Predicate substring.
    pub predicate: Option<String>,
    /// Object substring.
    pub object: Option<String>,
    /// Minimum confidence (inclusive).
    pub min_confidence: Option<f32>,
    /// Inclusive timestamp range.
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl TriplePattern {
    /// Empty pattern matching every record.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Restricts the predicate.
    #[must_use]
    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Restricts the object.
    #[must_use]
    pub fn object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Restricts the minimum confidence.
    #[must_use]
    pub fn min_confidence(mut self, min: f32) -> Self {
        self.min_confidence = Some(min);
        self
    }

    /// Restricts the timestamp range (inclusive).
    #[must_use]
    pub fn time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.time_range = Some((from, to));
        self
    }

    /// True when the record satisfies every set field.
    #[must_use]
    pub fn matches(&self, record: &TripleRecord) -> bool {
        if let Some(subject) = &self.subject {
            if !contains_ci(&record.subject, subject) {
                return false;
            }
        }
        if let Some(predicate) = &self.predicate {
            if !contains_ci(&record.predicate, predicate) {
                return false;
            }
        }
        if let Some(object) = &self.object {
            if !contains_ci(&record.object, object) {
                return false;
            }
        }
        if let Some(min) = self.min_confidence {
            if record.confidence < min {
                return false;
            }
        }
        if let Some((from, to)) = self.time_range {
            if record.timestamp < from || record.timestamp > to {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TripleRecord {
        TripleRecord {
            id: Uuid::new_v4(),
            subject: "Deploy Pipeline".into(),
            predicate: "kb.fact".into(),
            object: "requires two approvals".into(),
            confidence: 0.8,
            timestamp: Utc::now(),
            source: "ops".into(),
            context: "release".into(),
        }
    }

    #[test]
    fn pattern_matches_case_insensitive_substrings() {
        let record = sample();
        let pattern = TriplePattern::any()
            .subject("deploy")
            .object("APPROVALS");
        assert!(pattern.matches(&record));
    }

    #[test]
    fn pattern_rejects_on_confidence_floor() {
        let record = sample();
        let pattern = TriplePattern::any().min_confidence(0.9);
        assert!(!pattern.matches(&record));
    }

    #[test]
    fn draft_builders_fill_provenance() {
        let draft = TripleDraft::new("s", "p", "o")
            .confidence(0.4)
            .source("agents")
            .context("bdi");
        assert_eq!(draft.source, "agents");
        assert!((draft.confidence - 0.4).abs() < f32::EPSILON);
    }
}
