use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A held proposition with confidence and evidence links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Belief {
    /// Unique identifier.
    pub id: Uuid,
    /// Proposition text.
    pub content: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Triple ids supporting the belief.
    pub evidence_ids: Vec<Uuid>,
    /// Capture timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Belief {
    /// Creates a belief stamped now.
    #[must_use]
    pub fn new(content: impl Into<String>, confidence: f32, evidence_ids: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            confidence,
            evidence_ids,
            timestamp: Utc::now(),
        }
    }
}

/// A goal with priority and utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Desire {
    /// Unique identifier.
    pub id: Uuid,
    /// Goal text.
    pub goal: String,
    /// Priority in [0, 10]; higher is more urgent.
    pub priority: u8,
    /// Expected utility of achieving the goal.
    pub utility: f32,
    /// Capture timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Desire {
    /// Creates a desire stamped now.
    #[must_use]
    pub fn new(goal: impl Into<String>, priority: u8, utility: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal: goal.into(),
            priority,
            utility,
            timestamp: Utc::now(),
        }
    }
}

/// Lifecycle state of an intention.
///
/// The only legal transitions are `Pending → Active`,
/// `Active → Completed`, and `Active → Failed`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentionStatus {
    /// Committed but not yet started.
    Pending,
    /// Being worked on.
    Active,
    /// Finished successfully. Terminal.
    Completed,
    /// Abandoned or broken. Terminal.
    Failed,
}

impl IntentionStatus {
    /// True for states that permit no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// True when moving from `self` to `next` is legal.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Active, Self::Completed)
                | (Self::Active, Self::Failed)
        )
    }

    /// Stable label used in audit triples.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// A committed plan toward a desire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intention {
    /// Unique identifier.
    pub id: Uuid,
    /// The desire this intention serves.
    pub desire_id: Uuid,
    /// Ordered plan steps.
    pub plan: Vec<String>,
    /// Current lifecycle state.
    pub status: IntentionStatus,
    /// Completion fraction in [0, 1].
    pub progress: f32,
    /// Timestamp of the last state change.
    pub timestamp: DateTime<Utc>,
}

impl Intention {
    /// Creates a pending intention with zero progress.
    #[must_use]
    pub fn new(desire_id: Uuid, plan: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            desire_id,
            plan,
            status: IntentionStatus::Pending,
            progress: 0.0,
            timestamp: Utc::now(),
        }
    }
}

/// Per-agent BDI state. The manager's map of these is authoritative for
/// the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Domains the agent operates in.
    pub domains: Vec<String>,
    /// Declared capabilities.
    pub capabilities: Vec<String>,
    /// Held beliefs.
    pub beliefs: Vec<Belief>,
    /// Held desires.
    pub desires: Vec<Desire>,
    /// Committed intentions.
    pub intentions: Vec<Intention>,
}

impl Agent {
    /// Creates an empty agent.
    #[must_use]
    pub fn new(name: impl Into<String>, domains: Vec<String>, capabilities: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            domains,
            capabilities,
            beliefs: Vec::new(),
            desires: Vec::new(),
            intentions: Vec::new(),
        }
    }
}
