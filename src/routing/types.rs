//! Routing decision types.
//!
//! A [`Route`] is the strategy for a single turn: which collaborators to
//! invoke and how the synthesizer assembles their output. The
//! [`RoutingDecision`] records the route together with the rule that fired,
//! a confidence score, and the auxiliary response-shaping triggers.

use crate::classify::{Classification, OffloadingCheck};
use crate::collab::CollaboratorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of routing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Gentle opening for the first turns of a session.
    ProgressiveOpening,
    /// Acknowledge a subject change and re-anchor.
    TopicTransition,
    /// Direct information delivery from the knowledge collaborator.
    KnowledgeOnly,
    /// Open-ended socratic questioning.
    SocraticExploration,
    /// Push back on unexamined certainty.
    CognitiveChallenge,
    /// Full multi-collaborator synthesis.
    MultiAgentComprehensive,
    /// Questioning aimed at untangling a specific confusion.
    SocraticClarification,
    /// Supportive scaffolding for a struggling student.
    SupportiveScaffolding,
    /// Build missing fundamentals before going further.
    FoundationalBuilding,
    /// Knowledge delivery paired with a stretch challenge.
    KnowledgeWithChallenge,
    /// Default balanced mix of knowledge, questioning, and caution.
    BalancedGuidance,
    /// Corrective intervention against cognitive offloading.
    CognitiveIntervention,
    /// Internal failure fallback; the caller renders a graceful retry.
    Error,
}

impl Route {
    /// Stable snake_case identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgressiveOpening => "progressive_opening",
            Self::TopicTransition => "topic_transition",
            Self::KnowledgeOnly => "knowledge_only",
            Self::SocraticExploration => "socratic_exploration",
            Self::CognitiveChallenge => "cognitive_challenge",
            Self::MultiAgentComprehensive => "multi_agent_comprehensive",
            Self::SocraticClarification => "socratic_clarification",
            Self::SupportiveScaffolding => "supportive_scaffolding",
            Self::FoundationalBuilding => "foundational_building",
            Self::KnowledgeWithChallenge => "knowledge_with_challenge",
            Self::BalancedGuidance => "balanced_guidance",
            Self::CognitiveIntervention => "cognitive_intervention",
            Self::Error => "error",
        }
    }

    /// Whether the route contract requires the reply to end with a question.
    ///
    /// Challenge routes prefer the challenge text verbatim and are exempt;
    /// knowledge-only requires a question somewhere, not necessarily
    /// trailing (see [`Route::wants_followup_question`]).
    pub fn requires_trailing_question(&self) -> bool {
        matches!(
            self,
            Self::ProgressiveOpening
                | Self::TopicTransition
                | Self::SocraticExploration
                | Self::SocraticClarification
                | Self::SupportiveScaffolding
                | Self::FoundationalBuilding
                | Self::KnowledgeWithChallenge
                | Self::MultiAgentComprehensive
                | Self::BalancedGuidance
        )
    }

    /// Whether the route appends a follow-up question when none is present.
    pub fn wants_followup_question(&self) -> bool {
        matches!(self, Self::KnowledgeOnly) || self.requires_trailing_question()
    }

    /// The collaborators this route invokes, in preference order.
    pub fn collaborators(&self) -> Vec<CollaboratorKind> {
        use CollaboratorKind::*;
        match self {
            Self::ProgressiveOpening => vec![Question],
            Self::TopicTransition => vec![Knowledge, Question],
            Self::KnowledgeOnly => vec![Knowledge],
            Self::SocraticExploration => vec![Question],
            Self::CognitiveChallenge => vec![Challenge],
            Self::MultiAgentComprehensive => vec![Knowledge, Question, Challenge, Retriever],
            Self::SocraticClarification => vec![Question, Knowledge],
            Self::SupportiveScaffolding => vec![Knowledge, Question],
            Self::FoundationalBuilding => vec![Knowledge, Question],
            Self::KnowledgeWithChallenge => vec![Knowledge, Challenge],
            Self::BalancedGuidance => vec![Knowledge, Question, Challenge],
            Self::CognitiveIntervention => vec![Challenge, Question],
            Self::Error => Vec::new(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Auxiliary response-shaping tags attached to a decision.
///
/// These do not change the route; collaborator prompt builders use them to
/// tune tone and emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTrigger {
    /// Ground an overconfident claim against real constraints.
    RealityCheck,
    /// Feed visible curiosity with a wider question.
    CuriosityAmplification,
    /// Reframe the problem as a narrative to re-engage.
    NarrativeFraming,
    /// Ask the student to argue from another stakeholder's seat.
    PerspectiveShift,
    /// Stretch a student who signals mastery.
    MasteryStretch,
    /// Offer a concrete foothold to a stuck student.
    UnstickNudge,
}

impl fmt::Display for ResponseTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RealityCheck => "reality_check",
            Self::CuriosityAmplification => "curiosity_amplification",
            Self::NarrativeFraming => "narrative_framing",
            Self::PerspectiveShift => "perspective_shift",
            Self::MasteryStretch => "mastery_stretch",
            Self::UnstickNudge => "unstick_nudge",
        };
        write!(f, "{}", s)
    }
}

/// The routing engine's output for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The selected route.
    pub route: Route,
    /// Human-readable reason the route was chosen.
    pub reason: String,
    /// Confidence in [0, 1], averaged over the signal confidences that were
    /// available when the rule fired.
    pub confidence: f64,
    /// Identifier of the rule (or fast path) that fired.
    pub rule_id: String,
    /// Collaborators to invoke for this turn.
    pub collaborators: Vec<CollaboratorKind>,
    /// Offloading detection carried through from classification.
    pub offloading: OffloadingCheck,
    /// Auxiliary response-shaping triggers.
    #[serde(default)]
    pub triggers: Vec<ResponseTrigger>,
    /// Original classification, attached only on the error route so the
    /// caller can render a graceful fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl RoutingDecision {
    /// Create a decision for a route chosen by a rule or fast path.
    pub fn new(
        route: Route,
        rule_id: impl Into<String>,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            route,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
            rule_id: rule_id.into(),
            collaborators: route.collaborators(),
            offloading: OffloadingCheck::none(),
            triggers: Vec::new(),
            classification: None,
        }
    }

    /// Attach the offloading check from the classification.
    pub fn with_offloading(mut self, offloading: OffloadingCheck) -> Self {
        self.offloading = offloading;
        self
    }

    /// Attach response-shaping triggers.
    pub fn with_triggers(mut self, triggers: Vec<ResponseTrigger>) -> Self {
        self.triggers = triggers;
        self
    }

    /// Override the collaborator list (used by single-collaborator fast
    /// paths).
    pub fn with_collaborators(mut self, collaborators: Vec<CollaboratorKind>) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Create the explicit error-route decision, carrying the original
    /// classification so callers can degrade gracefully instead of crashing.
    pub fn error_fallback(classification: Classification, reason: impl Into<String>) -> Self {
        Self {
            route: Route::Error,
            reason: reason.into(),
            confidence: 0.0,
            rule_id: "error_fallback".to_string(),
            collaborators: Vec::new(),
            offloading: classification.offloading.clone(),
            triggers: Vec::new(),
            classification: Some(classification),
        }
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} via {} ({:.2}) -> [{}]",
            self.route,
            self.rule_id,
            self.confidence,
            self.collaborators
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
