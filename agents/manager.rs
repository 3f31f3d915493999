use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use noema_knowledge::{KnowledgeService, RuleContext, ValidationReport};
use noema_store::{AuditTrail, TripleDraft};
use shared_logging::{LogLevel, Telemetry};

use crate::module::{Agent, Belief, Desire, Intention, IntentionStatus};

/// Errors emitted by the agent manager.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A bound or required field was violated.
    #[error("validation error: {0}")]
    Validation(String),
    /// Reference to an unknown agent, desire, or intention.
    #[error("not found: {0}")]
    NotFound(String),
    /// The requested intention transition is not legal.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: &'static str,
        /// Requested state.
        to: &'static str,
    },
}

/// BDI agent manager.
///
/// Every mutating call updates the in-memory agent and enqueues an audit
/// triple. The two are deliberately not transactional: an audit failure is
/// reported through the trail's error sink, never rolled back into the
/// primary call.
#[derive(Debug, Clone)]
pub struct AgentManager {
    agents: Arc<RwLock<HashMap<Uuid, Agent>>>,
    audit: AuditTrail,
    knowledge: KnowledgeService,
    telemetry: Option<Telemetry>,
}

impl AgentManager {
    /// Creates a manager over the given audit trail and knowledge service.
    #[must_use]
    pub fn new(audit: AuditTrail, knowledge: KnowledgeService) -> Self {
        Self {
            agents: Arc::new(RwLock::new(HashMap::new())),
            audit,
            knowledge,
            telemetry: None,
        }
    }

    /// Attaches an operator channel.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Registers a new agent and returns its id.
    pub fn create_agent(
        &self,
        name: impl Into<String>,
        domains: Vec<String>,
        capabilities: Vec<String>,
    ) -> Uuid {
        let agent = Agent::new(name, domains, capabilities);
        let id = agent.id;
        self.audit.record(
            TripleDraft::new(
                id.to_string(),
                "bdi.agent",
                json!({
                    "name": agent.name,
                    "domains": agent.domains,
                    "capabilities": agent.capabilities,
                })
                .to_string(),
            )
            .source("agents"),
        );
        self.agents.write().insert(id, agent);
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(LogLevel::Info, "agents.created", json!({ "agent": id }));
        }
        id
    }

    /// Adds a belief, returning its id.
    pub fn add_belief(
        &self,
        agent_id: Uuid,
        content: impl Into<String>,
        confidence: f32,
        evidence_ids: Vec<Uuid>,
    ) -> Result<Uuid, AgentError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AgentError::Validation(format!(
                "confidence {confidence} outside [0, 1]"
            )));
        }
        let belief = Belief::new(content, confidence, evidence_ids);
        let belief_id = belief.id;
        let mut agents = self.agents.write();
        let agent = agents
            .get_mut(&agent_id)
            .ok_or_else(|| AgentError::NotFound(format!("agent {agent_id}")))?;
        self.audit.record(
            TripleDraft::new(
                agent_id.to_string(),
                "bdi.belief",
                serde_json::to_string(&belief).unwrap_or_default(),
            )
            .confidence(confidence)
            .source("agents"),
        );
        agent.beliefs.push(belief);
        Ok(belief_id)
    }

    /// Adds a desire, returning its id.
    pub fn add_desire(
        &self,
        agent_id: Uuid,
        goal: impl Into<String>,
        priority: u8,
        utility: f32,
    ) -> Result<Uuid, AgentError> {
        if priority > 10 {
            return Err(AgentError::Validation(format!(
                "priority {priority} outside [0, 10]"
            )));
        }
        let desire = Desire::new(goal, priority, utility);
        let desire_id = desire.id;
        let mut agents = self.agents.write();
        let agent = agents
            .get_mut(&agent_id)
            .ok_or_else(|| AgentError::NotFound(format!("agent {agent_id}")))?;
        self.audit.record(
            TripleDraft::new(
                agent_id.to_string(),
                "bdi.desire",
                serde_json::to_string(&desire).unwrap_or_default(),
            )
            .source("agents"),
        );
        agent.desires.push(desire);
        Ok(desire_id)
    }

    /// Commits a plan toward an existing desire. The new intention starts
    /// `Pending` with zero progress.
    pub fn form_intention(
        &self,
        agent_id: Uuid,
        desire_id: Uuid,
        plan: Vec<String>,
    ) -> Result<Uuid, AgentError> {
        let mut agents = self.agents.write();
        let agent = agents
            .get_mut(&agent_id)
            .ok_or_else(|| AgentError::NotFound(format!("agent {agent_id}")))?;
        if !agent.desires.iter().any(|desire| desire.id == desire_id) {
            return Err(AgentError::NotFound(format!("desire {desire_id}")));
        }
        let intention = Intention::new(desire_id, plan);
        let intention_id = intention.id;
        self.audit.record(
            TripleDraft::new(
                intention_id.to_string(),
                "bdi.intention",
                serde_json::to_string(&intention).unwrap_or_default(),
            )
            .source("agents")
            .context(agent_id.to_string()),
        );
        self.audit.record(
            TripleDraft::new(
                intention_id.to_string(),
                "bdi.intention.status",
                intention.status.as_str(),
            )
            .source("agents")
            .context(agent_id.to_string()),
        );
        agent.intentions.push(intention);
        Ok(intention_id)
    }

    /// Moves an intention through its state machine.
    ///
    /// Terminal intentions refuse every transition; `Completed` requires
    /// progress 1.0.
    pub fn update_intention_status(
        &self,
        agent_id: Uuid,
        intention_id: Uuid,
        status: IntentionStatus,
        progress: f32,
    ) -> Result<(), AgentError> {
        if !(0.0..=1.0).contains(&progress) {
            return Err(AgentError::Validation(format!(
                "progress {progress} outside [0, 1]"
            )));
        }
        if status == IntentionStatus::Completed && progress < 1.0 {
            return Err(AgentError::Validation(format!(
                "cannot complete at progress {progress}"
            )));
        }
        let mut agents = self.agents.write();
        let agent = agents
            .get_mut(&agent_id)
            .ok_or_else(|| AgentError::NotFound(format!("agent {agent_id}")))?;
        let intention = agent
            .intentions
            .iter_mut()
            .find(|intention| intention.id == intention_id)
            .ok_or_else(|| AgentError::NotFound(format!("intention {intention_id}")))?;
        if !intention.status.can_transition(status) {
            return Err(AgentError::InvalidTransition {
                from: intention.status.as_str(),
                to: status.as_str(),
            });
        }
        intention.status = status;
        intention.progress = progress;
        intention.timestamp = chrono::Utc::now();
        self.audit.record(
            TripleDraft::new(
                intention_id.to_string(),
                "bdi.intention.status",
                status.as_str(),
            )
            .source("agents")
            .context(agent_id.to_string()),
        );
        Ok(())
    }

    /// Validates a statement against the agent's confident beliefs,
    /// falling back to the knowledge rule set when none match.
    pub fn validate_against_beliefs(
        &self,
        agent_id: Uuid,
        statement: &str,
    ) -> Result<ValidationReport, AgentError> {
        let agents = self.agents.read();
        let agent = agents
            .get(&agent_id)
            .ok_or_else(|| AgentError::NotFound(format!("agent {agent_id}")))?;
        let needle = statement.to_lowercase();
        let matching: Vec<&Belief> = agent
            .beliefs
            .iter()
            .filter(|belief| {
                belief.confidence > 0.5 && belief.content.to_lowercase().contains(&needle)
            })
            .collect();
        if matching.is_empty() {
            let mut context = RuleContext::new();
            context.insert("statement".into(), json!(statement));
            return Ok(self.knowledge.rule_report(&context));
        }
        let confidence =
            matching.iter().map(|belief| belief.confidence).sum::<f32>() / matching.len() as f32;
        Ok(ValidationReport {
            is_valid: true,
            confidence,
            reasons: matching
                .iter()
                .map(|belief| format!("belief '{}' ({:.2})", belief.content, belief.confidence))
                .collect(),
            suggestions: Vec::new(),
        })
    }

    /// Snapshot of one agent.
    #[must_use]
    pub fn agent(&self, agent_id: Uuid) -> Option<Agent> {
        self.agents.read().get(&agent_id).cloned()
    }

    /// Number of registered agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.read().len()
    }
}
