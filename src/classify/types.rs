//! Classification types for student-utterance analysis.
//!
//! Defines the signal set the classifier produces for every turn:
//! - [`InteractionType`]: the single category selected for the utterance
//! - [`UnderstandingLevel`] / [`ConfidenceLevel`] / [`EngagementLevel`]:
//!   independently derived level signals
//! - [`OffloadingKind`] / [`OffloadingCheck`]: typed cognitive-offloading
//!   detection result with an explainable indicator list
//! - [`Classification`]: the full per-turn record

use serde::{Deserialize, Serialize};
use std::fmt;

/// The interaction category selected for a single utterance.
///
/// Exactly one category is selected per turn, even when multiple patterns
/// match; the classifier resolves overlaps by fixed priority order
/// (offloading > overconfidence > topic-transition > specific intents by
/// specificity > punctuation/keyword fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Pattern of seeking a ready-made answer ("just tell me").
    CognitiveOffloading,
    /// Certainty markers without supporting reasoning ("obviously optimal").
    OverconfidentStatement,
    /// Explicit request to change subject ("let's talk about ...").
    TopicTransition,
    /// Request for direction on how to approach a design decision.
    DesignGuidance,
    /// Expression of being lost or confused.
    ConfusionExpression,
    /// Request to clarify something previously said.
    ClarificationRequest,
    /// Request to judge or assess the student's own work.
    EvaluationRequest,
    /// Request for feedback on an idea or artifact.
    FeedbackRequest,
    /// Request for examples, precedents, or case studies.
    ExampleRequest,
    /// Request for domain knowledge or explanation.
    KnowledgeRequest,
    /// Question about technical systems, codes, or construction.
    TechnicalQuestion,
    /// Request for help carrying out a concrete implementation step.
    ImplementationRequest,
    /// Seeking ways to make existing work better.
    ImprovementSeeking,
    /// Open-ended exploration of design possibilities.
    CreativeExploration,
    /// Fallback: a question with no stronger match.
    GeneralQuestion,
    /// Fallback: a statement with no stronger match.
    GeneralStatement,
    /// Could not be classified at all (empty or non-lexical input).
    Unknown,
}

impl InteractionType {
    /// Check whether this category is a legitimate request for content.
    ///
    /// Offloading detection is gated on this: a turn already classified as a
    /// legitimate request is never additionally flagged as offloading.
    pub fn is_legitimate_request(&self) -> bool {
        matches!(
            self,
            Self::KnowledgeRequest
                | Self::ExampleRequest
                | Self::TechnicalQuestion
                | Self::FeedbackRequest
                | Self::ClarificationRequest
                | Self::GeneralQuestion
        )
    }

    /// Check whether this category expresses a question rather than a claim.
    pub fn is_question_like(&self) -> bool {
        matches!(
            self,
            Self::KnowledgeRequest
                | Self::ExampleRequest
                | Self::TechnicalQuestion
                | Self::ClarificationRequest
                | Self::GeneralQuestion
        )
    }

    /// Stable snake_case identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CognitiveOffloading => "cognitive_offloading",
            Self::OverconfidentStatement => "overconfident_statement",
            Self::TopicTransition => "topic_transition",
            Self::DesignGuidance => "design_guidance",
            Self::ConfusionExpression => "confusion_expression",
            Self::ClarificationRequest => "clarification_request",
            Self::EvaluationRequest => "evaluation_request",
            Self::FeedbackRequest => "feedback_request",
            Self::ExampleRequest => "example_request",
            Self::KnowledgeRequest => "knowledge_request",
            Self::TechnicalQuestion => "technical_question",
            Self::ImplementationRequest => "implementation_request",
            Self::ImprovementSeeking => "improvement_seeking",
            Self::CreativeExploration => "creative_exploration",
            Self::GeneralQuestion => "general_question",
            Self::GeneralStatement => "general_statement",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Demonstrated understanding level, derived from lexical depth cues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnderstandingLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for UnderstandingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// Expressed confidence level.
///
/// `Overconfident` is distinct from `Confident`: it marks certainty claims
/// unbacked by reasoning, which routing treats as a pedagogical signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Uncertain,
    #[default]
    Confident,
    Overconfident,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uncertain => "uncertain",
            Self::Confident => "confident",
            Self::Overconfident => "overconfident",
        };
        write!(f, "{}", s)
    }
}

/// Engagement level, derived from message effort and curiosity cues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// The kind of cognitive-offloading pattern detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffloadingKind {
    /// Asking for the finished answer ("just tell me what to do").
    SolutionRequest,
    /// Repeatedly delegating every decision back to the tutor.
    Overreliance,
    /// Avoiding engagement with the reasoning itself.
    AvoidancePattern,
    /// No offloading detected.
    #[default]
    None,
}

impl fmt::Display for OffloadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SolutionRequest => "solution_request",
            Self::Overreliance => "overreliance",
            Self::AvoidancePattern => "avoidance_pattern",
            Self::None => "none",
        };
        write!(f, "{}", s)
    }
}

/// Typed result of cognitive-offloading detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffloadingCheck {
    /// Whether an offloading pattern was detected.
    pub detected: bool,
    /// The kind of pattern detected ([`OffloadingKind::None`] when not).
    pub kind: OffloadingKind,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
    /// Matched phrases, for explainability.
    #[serde(default)]
    pub indicators: Vec<String>,
}

impl OffloadingCheck {
    /// A negative result.
    pub fn none() -> Self {
        Self::default()
    }

    /// A positive result with the matched indicators.
    pub fn detected(kind: OffloadingKind, confidence: f64, indicators: Vec<String>) -> Self {
        Self {
            detected: true,
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            indicators,
        }
    }
}

/// The full signal set produced for one utterance.
///
/// Ephemeral: one per turn, never persisted across turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// The single selected interaction category.
    pub interaction: InteractionType,
    /// Demonstrated understanding level.
    pub understanding: UnderstandingLevel,
    /// Expressed confidence level.
    pub confidence: ConfidenceLevel,
    /// Engagement level.
    pub engagement: EngagementLevel,
    /// Whether the input is purely an information request.
    pub is_pure_knowledge_request: bool,
    /// Whether the input is a technical question.
    pub is_technical_question: bool,
    /// Whether the input requests feedback.
    pub is_feedback_request: bool,
    /// Whether the input expresses confusion.
    pub shows_confusion: bool,
    /// Whether the input asks for help of any kind.
    pub requests_help: bool,
    /// Matched phrases across all pattern groups, for explainability.
    #[serde(default)]
    pub indicators: Vec<String>,
    /// Cognitive-offloading detection result.
    pub offloading: OffloadingCheck,
}

impl Classification {
    /// Build a default classification for an utterance nothing matched.
    ///
    /// The classifier is total: ambiguous input yields this rather than an
    /// error. A trailing question mark selects the question fallback.
    pub fn fallback(is_question: bool) -> Self {
        Self {
            interaction: if is_question {
                InteractionType::GeneralQuestion
            } else {
                InteractionType::GeneralStatement
            },
            understanding: UnderstandingLevel::Medium,
            confidence: ConfidenceLevel::Confident,
            engagement: EngagementLevel::Medium,
            is_pure_knowledge_request: false,
            is_technical_question: false,
            is_feedback_request: false,
            shows_confusion: false,
            requests_help: false,
            indicators: Vec::new(),
            offloading: OffloadingCheck::none(),
        }
    }

    /// Check whether offloading was detected for this turn.
    pub fn offloading_detected(&self) -> bool {
        self.offloading.detected
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} (understanding: {}, confidence: {}, engagement: {})",
            self.interaction, self.understanding, self.confidence, self.engagement
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================
    // InteractionType tests
    // =========================================

    #[test]
    fn test_interaction_type_legitimate_requests() {
        assert!(InteractionType::KnowledgeRequest.is_legitimate_request());
        assert!(InteractionType::ExampleRequest.is_legitimate_request());
        assert!(InteractionType::TechnicalQuestion.is_legitimate_request());
        assert!(InteractionType::FeedbackRequest.is_legitimate_request());
        assert!(InteractionType::GeneralQuestion.is_legitimate_request());

        assert!(!InteractionType::CognitiveOffloading.is_legitimate_request());
        assert!(!InteractionType::OverconfidentStatement.is_legitimate_request());
        assert!(!InteractionType::GeneralStatement.is_legitimate_request());
    }

    #[test]
    fn test_interaction_type_question_like() {
        assert!(InteractionType::ClarificationRequest.is_question_like());
        assert!(!InteractionType::FeedbackRequest.is_question_like());
        assert!(!InteractionType::OverconfidentStatement.is_question_like());
    }

    #[test]
    fn test_interaction_type_serialization() {
        assert_eq!(
            serde_json::to_string(&InteractionType::OverconfidentStatement).unwrap(),
            "\"overconfident_statement\""
        );
        assert_eq!(
            serde_json::to_string(&InteractionType::CognitiveOffloading).unwrap(),
            "\"cognitive_offloading\""
        );
    }

    #[test]
    fn test_interaction_type_display_matches_serde() {
        let json = serde_json::to_string(&InteractionType::DesignGuidance).unwrap();
        assert_eq!(json, format!("\"{}\"", InteractionType::DesignGuidance));
    }

    // =========================================
    // Level tests
    // =========================================

    #[test]
    fn test_understanding_level_ordering() {
        assert!(UnderstandingLevel::Low < UnderstandingLevel::Medium);
        assert!(UnderstandingLevel::Medium < UnderstandingLevel::High);
    }

    #[test]
    fn test_level_defaults() {
        assert_eq!(UnderstandingLevel::default(), UnderstandingLevel::Medium);
        assert_eq!(ConfidenceLevel::default(), ConfidenceLevel::Confident);
        assert_eq!(EngagementLevel::default(), EngagementLevel::Medium);
    }

    #[test]
    fn test_confidence_level_serialization() {
        assert_eq!(
            serde_json::to_string(&ConfidenceLevel::Overconfident).unwrap(),
            "\"overconfident\""
        );
        let parsed: ConfidenceLevel = serde_json::from_str("\"uncertain\"").unwrap();
        assert_eq!(parsed, ConfidenceLevel::Uncertain);
    }

    // =========================================
    // OffloadingCheck tests
    // =========================================

    #[test]
    fn test_offloading_check_none() {
        let check = OffloadingCheck::none();
        assert!(!check.detected);
        assert_eq!(check.kind, OffloadingKind::None);
        assert_eq!(check.confidence, 0.0);
        assert!(check.indicators.is_empty());
    }

    #[test]
    fn test_offloading_check_detected() {
        let check = OffloadingCheck::detected(
            OffloadingKind::SolutionRequest,
            0.85,
            vec!["just tell me".to_string()],
        );
        assert!(check.detected);
        assert_eq!(check.kind, OffloadingKind::SolutionRequest);
        assert_eq!(check.confidence, 0.85);
        assert_eq!(check.indicators, vec!["just tell me".to_string()]);
    }

    #[test]
    fn test_offloading_check_confidence_clamped() {
        let check = OffloadingCheck::detected(OffloadingKind::Overreliance, 1.7, vec![]);
        assert_eq!(check.confidence, 1.0);
    }

    // =========================================
    // Classification tests
    // =========================================

    #[test]
    fn test_classification_fallback_question() {
        let c = Classification::fallback(true);
        assert_eq!(c.interaction, InteractionType::GeneralQuestion);
        assert!(!c.offloading_detected());
    }

    #[test]
    fn test_classification_fallback_statement() {
        let c = Classification::fallback(false);
        assert_eq!(c.interaction, InteractionType::GeneralStatement);
    }

    #[test]
    fn test_classification_summary() {
        let mut c = Classification::fallback(true);
        c.understanding = UnderstandingLevel::High;
        let summary = c.summary();
        assert!(summary.contains("general_question"));
        assert!(summary.contains("understanding: high"));
    }

    #[test]
    fn test_classification_serialization_round_trip() {
        let c = Classification::fallback(false);
        let json = serde_json::to_string(&c).unwrap();
        let back: Classification = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
