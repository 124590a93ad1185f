//! Learning-progression types: phases, milestone types, and milestones.
//!
//! Phases are strictly ordered; a session moves forward through them and
//! never back. Milestones are immutable once created — completion is
//! modeled by creating the *next* milestone, so a session's milestone list
//! is monotonically append-only.

use crate::classify::{Classification, ConfidenceLevel, EngagementLevel, UnderstandingLevel};
use crate::progression::criteria::CriterionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The five ordered learning phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningPhase {
    Discovery,
    Exploration,
    Synthesis,
    Application,
    Reflection,
}

impl LearningPhase {
    /// All phases in order.
    pub fn all() -> [LearningPhase; 5] {
        [
            Self::Discovery,
            Self::Exploration,
            Self::Synthesis,
            Self::Application,
            Self::Reflection,
        ]
    }

    /// The next phase, or `None` at the end.
    pub fn next(&self) -> Option<LearningPhase> {
        match self {
            Self::Discovery => Some(Self::Exploration),
            Self::Exploration => Some(Self::Synthesis),
            Self::Synthesis => Some(Self::Application),
            Self::Application => Some(Self::Reflection),
            Self::Reflection => None,
        }
    }

    /// Zero-based position in the phase order.
    pub fn index(&self) -> usize {
        match self {
            Self::Discovery => 0,
            Self::Exploration => 1,
            Self::Synthesis => 2,
            Self::Application => 3,
            Self::Reflection => 4,
        }
    }

    /// Stable lowercase identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Exploration => "exploration",
            Self::Synthesis => "synthesis",
            Self::Application => "application",
            Self::Reflection => "reflection",
        }
    }
}

impl fmt::Display for LearningPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Milestone types across all phases.
///
/// Each phase owns an ordered subset of these; see
/// [`crate::progression::phases::structure_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    /// First milestone of every phase.
    PhaseEntry,
    /// Discovery: new domain knowledge demonstrated.
    KnowledgeAcquisition,
    /// Discovery: readiness to move on expressed.
    ReadinessAssessment,
    /// Exploration: sustained engagement with open questions.
    DeepInquiry,
    /// Exploration: recurring patterns named.
    PatternRecognition,
    /// Synthesis: connections drawn between ideas.
    ConnectionForming,
    /// Synthesis: integrated understanding checked.
    IntegrationCheck,
    /// Application: knowledge applied to the student's own design.
    DesignApplication,
    /// Application: an iteration reviewed against intent.
    IterationReview,
    /// Reflection: an insight articulated.
    InsightCapture,
    /// Reflection: growth over the session summarized.
    GrowthSummary,
}

impl MilestoneType {
    /// Stable snake_case identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhaseEntry => "phase_entry",
            Self::KnowledgeAcquisition => "knowledge_acquisition",
            Self::ReadinessAssessment => "readiness_assessment",
            Self::DeepInquiry => "deep_inquiry",
            Self::PatternRecognition => "pattern_recognition",
            Self::ConnectionForming => "connection_forming",
            Self::IntegrationCheck => "integration_check",
            Self::DesignApplication => "design_application",
            Self::IterationReview => "iteration_review",
            Self::InsightCapture => "insight_capture",
            Self::GrowthSummary => "growth_summary",
        }
    }
}

impl fmt::Display for MilestoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Levels captured at milestone creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub understanding: UnderstandingLevel,
    pub confidence: ConfidenceLevel,
    pub engagement: EngagementLevel,
}

impl LevelSnapshot {
    /// Capture the levels from a turn's classification.
    pub fn from_classification(c: &Classification) -> Self {
        Self {
            understanding: c.understanding,
            confidence: c.confidence,
            engagement: c.engagement,
        }
    }
}

/// A discrete, criterion-gated unit of progress within a phase.
///
/// Immutable after creation. Completion creates the next milestone instead
/// of mutating this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMilestone {
    /// Unique id.
    pub id: Uuid,
    /// Phase this milestone belongs to.
    pub phase: LearningPhase,
    /// Milestone type within the phase's sequence.
    pub milestone_type: MilestoneType,
    /// Levels at creation time.
    pub snapshot: LevelSnapshot,
    /// Phase-local progress at creation, 0–100.
    pub progress_percent: u8,
    /// What the student is asked to do to complete this milestone.
    pub required_actions: Vec<String>,
    /// Criteria that must all be met for completion.
    pub success_criteria: Vec<CriterionKind>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ConversationMilestone {
    /// Create a milestone. Progress is clamped to 100.
    pub fn new(
        phase: LearningPhase,
        milestone_type: MilestoneType,
        snapshot: LevelSnapshot,
        progress_percent: u8,
        required_actions: Vec<String>,
        success_criteria: Vec<CriterionKind>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase,
            milestone_type,
            snapshot,
            progress_percent: progress_percent.min(100),
            required_actions,
            success_criteria,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================
    // Phase ordering
    // =========================================

    #[test]
    fn test_phase_order_is_linear() {
        let all = LearningPhase::all();
        for window in all.windows(2) {
            assert_eq!(window[0].next(), Some(window[1]));
            assert!(window[0] < window[1]);
        }
        assert_eq!(LearningPhase::Reflection.next(), None);
    }

    #[test]
    fn test_phase_index() {
        assert_eq!(LearningPhase::Discovery.index(), 0);
        assert_eq!(LearningPhase::Reflection.index(), 4);
    }

    #[test]
    fn test_phase_serialization() {
        assert_eq!(
            serde_json::to_string(&LearningPhase::Synthesis).unwrap(),
            "\"synthesis\""
        );
        let parsed: LearningPhase = serde_json::from_str("\"discovery\"").unwrap();
        assert_eq!(parsed, LearningPhase::Discovery);
    }

    // =========================================
    // Milestone types
    // =========================================

    #[test]
    fn test_milestone_type_serialization() {
        assert_eq!(
            serde_json::to_string(&MilestoneType::KnowledgeAcquisition).unwrap(),
            "\"knowledge_acquisition\""
        );
    }

    #[test]
    fn test_milestone_type_display_matches_serde() {
        let json = serde_json::to_string(&MilestoneType::DesignApplication).unwrap();
        assert_eq!(json, format!("\"{}\"", MilestoneType::DesignApplication));
    }

    // =========================================
    // Milestone records
    // =========================================

    #[test]
    fn test_milestone_progress_clamped() {
        let m = ConversationMilestone::new(
            LearningPhase::Discovery,
            MilestoneType::PhaseEntry,
            LevelSnapshot::default(),
            140,
            vec![],
            vec![],
        );
        assert_eq!(m.progress_percent, 100);
    }

    #[test]
    fn test_milestone_ids_unique() {
        let a = ConversationMilestone::new(
            LearningPhase::Discovery,
            MilestoneType::PhaseEntry,
            LevelSnapshot::default(),
            0,
            vec![],
            vec![],
        );
        let b = ConversationMilestone::new(
            LearningPhase::Discovery,
            MilestoneType::PhaseEntry,
            LevelSnapshot::default(),
            0,
            vec![],
            vec![],
        );
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_snapshot_from_classification() {
        let c = Classification::fallback(true);
        let snap = LevelSnapshot::from_classification(&c);
        assert_eq!(snap.understanding, c.understanding);
        assert_eq!(snap.engagement, c.engagement);
    }

    #[test]
    fn test_milestone_serialization_round_trip() {
        let m = ConversationMilestone::new(
            LearningPhase::Exploration,
            MilestoneType::DeepInquiry,
            LevelSnapshot::default(),
            33,
            vec!["ask a probing question".to_string()],
            vec![CriterionKind::EngagedWithQuestion],
        );
        let json = serde_json::to_string(&m).unwrap();
        let back: ConversationMilestone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
