//! Normalized types at the collaborator boundary.
//!
//! Every collaborator, whatever its internal shape, produces one
//! [`AgentResult`]: a name, generated text, and optional structured metadata.
//! The synthesizer depends only on this shape and never mutates it.

use crate::classify::Classification;
use crate::routing::{ResponseTrigger, Route};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The specialized collaborators the core can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorKind {
    /// Domain-knowledge responder.
    Knowledge,
    /// Socratic question generator.
    Question,
    /// Cognitive-challenge generator.
    Challenge,
    /// Image analyzer for uploaded sketches and models.
    Vision,
    /// Knowledge-base retriever.
    Retriever,
}

impl CollaboratorKind {
    /// Stable lowercase identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Knowledge => "knowledge",
            Self::Question => "question",
            Self::Challenge => "challenge",
            Self::Vision => "vision",
            Self::Retriever => "retriever",
        }
    }

    /// All collaborator kinds, in a stable order.
    pub fn all() -> [CollaboratorKind; 5] {
        [
            Self::Knowledge,
            Self::Question,
            Self::Challenge,
            Self::Vision,
            Self::Retriever,
        ]
    }
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Forward-looking guidance from the progression state machine.
///
/// Consumed opportunistically by prompt builders; never read by the routing
/// rule table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseGuidance {
    /// Current learning phase name.
    pub phase: String,
    /// What the next milestone asks the student to demonstrate.
    pub focus: String,
    /// Milestone the student is working toward.
    pub next_milestone: Option<String>,
}

/// Everything a collaborator needs to build its prompt for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptContext {
    /// The student's utterance, verbatim.
    pub utterance: String,
    /// Classification for the turn.
    pub classification: Classification,
    /// The chosen route.
    pub route: Route,
    /// Auxiliary response-shaping triggers from the routing decision.
    #[serde(default)]
    pub triggers: Vec<ResponseTrigger>,
    /// Progression guidance, when the state machine has any.
    #[serde(default)]
    pub guidance: Option<PhaseGuidance>,
    /// Sticky detected project type, when established.
    #[serde(default)]
    pub project_type: Option<String>,
    /// Current conversation topic, when known.
    #[serde(default)]
    pub topic: Option<String>,
}

/// Structured metadata a collaborator may attach to its text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Source citations from the retriever.
    #[serde(default)]
    pub citations: Vec<String>,
    /// Question text embedded in the response, when the collaborator
    /// reports it separately.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_question: Option<String>,
}

/// One collaborator's contribution to a turn.
///
/// Owned by the invoker boundary; the synthesizer reads it and produces a
/// new combined string, never mutating results in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Which collaborator produced this.
    pub collaborator: CollaboratorKind,
    /// Generated text. May be empty on failure; empty means "no
    /// contribution", never a hard error.
    pub text: String,
    /// Optional structured metadata.
    #[serde(default)]
    pub metadata: AgentMetadata,
    /// When the result arrived.
    pub received_at: DateTime<Utc>,
    /// Wall-clock duration of the call in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AgentResult {
    /// Create a result with text and default metadata.
    pub fn new(collaborator: CollaboratorKind, text: impl Into<String>) -> Self {
        Self {
            collaborator,
            text: text.into(),
            metadata: AgentMetadata::default(),
            received_at: Utc::now(),
            duration_ms: None,
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: AgentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach the call duration.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Check whether this result actually contributes text.
    pub fn has_contribution(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Find a named collaborator's result in a turn's result set.
///
/// The synthesizer consumes results by name, not arrival order.
pub fn result_for(results: &[AgentResult], kind: CollaboratorKind) -> Option<&AgentResult> {
    results
        .iter()
        .find(|r| r.collaborator == kind && r.has_contribution())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_kind_as_str_matches_serde() {
        for kind in CollaboratorKind::all() {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_agent_result_contribution() {
        let full = AgentResult::new(CollaboratorKind::Knowledge, "Adaptive reuse keeps...");
        assert!(full.has_contribution());

        let empty = AgentResult::new(CollaboratorKind::Question, "   ");
        assert!(!empty.has_contribution());
    }

    #[test]
    fn test_result_for_finds_by_name() {
        let results = vec![
            AgentResult::new(CollaboratorKind::Question, "What drives the section?"),
            AgentResult::new(CollaboratorKind::Knowledge, "Load paths resolve down."),
        ];
        let found = result_for(&results, CollaboratorKind::Knowledge).unwrap();
        assert_eq!(found.collaborator, CollaboratorKind::Knowledge);
    }

    #[test]
    fn test_result_for_skips_empty_contributions() {
        let results = vec![AgentResult::new(CollaboratorKind::Knowledge, "")];
        assert!(result_for(&results, CollaboratorKind::Knowledge).is_none());
    }

    #[test]
    fn test_agent_result_builder() {
        let meta = AgentMetadata {
            citations: vec!["Tate Modern".to_string()],
            embedded_question: Some("What would you keep?".to_string()),
        };
        let result = AgentResult::new(CollaboratorKind::Retriever, "See the Tate Modern.")
            .with_metadata(meta.clone())
            .with_duration_ms(420);
        assert_eq!(result.metadata, meta);
        assert_eq!(result.duration_ms, Some(420));
    }

    #[test]
    fn test_agent_result_serialization_round_trip() {
        let result = AgentResult::new(CollaboratorKind::Challenge, "Defend the column grid.");
        let json = serde_json::to_string(&result).unwrap();
        let back: AgentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.collaborator, CollaboratorKind::Challenge);
        assert_eq!(back.text, result.text);
    }
}
