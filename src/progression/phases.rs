//! Per-phase structure: milestone sequences, pacing, and depth indicators.
//!
//! Discovery's sequence (phase-entry → knowledge-acquisition →
//! readiness-assessment) is the template; every phase opens with a
//! phase-entry milestone and carries two more.

use super::criteria::CriterionKind;
use super::types::{LearningPhase, MilestoneType};
use crate::classify::patterns::find_matches;

/// Indicator words for synthesis-grade thinking.
pub const SYNTHESIS_INDICATORS: &[&str] = &[
    "because",
    "therefore",
    "relationship",
    "connects",
    "which means",
    "ties together",
    "depends on",
];

/// Indicator words for application-grade thinking.
pub const APPLICATION_INDICATORS: &[&str] = &[
    "apply",
    "my design",
    "in my project",
    "i will use",
    "i'll use",
    "let me try",
    "i changed my",
];

/// Indicator words for reflection-grade thinking.
pub const REFLECTION_INDICATORS: &[&str] = &[
    "learned",
    "realized",
    "realised",
    "looking back",
    "i used to think",
    "next time",
    "in hindsight",
];

/// Explicit readiness phrasing.
pub const READINESS_PHRASES: &[&str] = &[
    "i'm ready",
    "im ready",
    "ready for the next",
    "let's move on",
    "lets move on",
    "what's next",
    "whats next",
];

/// Lexical depth scores for one utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthScores {
    pub synthesis: usize,
    pub application: usize,
    pub reflection: usize,
}

impl DepthScores {
    /// Whether any depth indicator appeared at all.
    pub fn any(&self) -> bool {
        self.synthesis + self.application + self.reflection > 0
    }
}

/// Count depth indicators in a lower-cased utterance.
pub fn depth_scores(lower: &str) -> DepthScores {
    DepthScores {
        synthesis: find_matches(lower, SYNTHESIS_INDICATORS).len(),
        application: find_matches(lower, APPLICATION_INDICATORS).len(),
        reflection: find_matches(lower, REFLECTION_INDICATORS).len(),
    }
}

/// Check for explicit readiness phrasing.
pub fn expresses_readiness(lower: &str) -> bool {
    !find_matches(lower, READINESS_PHRASES).is_empty()
}

/// A phase's milestone sequence and pacing floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseStructure {
    pub phase: LearningPhase,
    /// Ordered milestone sequence, always starting with phase entry.
    pub milestones: Vec<MilestoneType>,
    /// Minimum messages in the phase before a transition may fire.
    pub min_messages: u32,
}

/// The structure for a phase.
pub fn structure_for(phase: LearningPhase) -> PhaseStructure {
    use MilestoneType::*;
    let (milestones, min_messages) = match phase {
        LearningPhase::Discovery => {
            (vec![PhaseEntry, KnowledgeAcquisition, ReadinessAssessment], 3)
        }
        LearningPhase::Exploration => (vec![PhaseEntry, DeepInquiry, PatternRecognition], 4),
        LearningPhase::Synthesis => (vec![PhaseEntry, ConnectionForming, IntegrationCheck], 4),
        LearningPhase::Application => (vec![PhaseEntry, DesignApplication, IterationReview], 3),
        LearningPhase::Reflection => (vec![PhaseEntry, InsightCapture, GrowthSummary], 2),
    };
    PhaseStructure {
        phase,
        milestones,
        min_messages,
    }
}

/// The completion criteria for a milestone type.
///
/// Returns `None` for a type with no registered criteria; the state machine
/// treats that as "incomplete, do not advance".
pub fn criteria_for(milestone: MilestoneType) -> Option<Vec<CriterionKind>> {
    use CriterionKind::*;
    let criteria = match milestone {
        MilestoneType::PhaseEntry => vec![SustainedEngagement],
        MilestoneType::KnowledgeAcquisition => {
            vec![NewKnowledgeDemonstrated, ConceptVocabularyUsed]
        }
        MilestoneType::ReadinessAssessment => vec![ReadinessExpressed],
        MilestoneType::DeepInquiry => vec![EngagedWithQuestion, SustainedEngagement],
        MilestoneType::PatternRecognition => vec![ConnectionsMade],
        MilestoneType::ConnectionForming => vec![ConnectionsMade, NewKnowledgeDemonstrated],
        MilestoneType::IntegrationCheck => vec![ConnectionsMade, SustainedEngagement],
        MilestoneType::DesignApplication => vec![ApplicationAttempted],
        MilestoneType::IterationReview => vec![ApplicationAttempted, EngagedWithQuestion],
        MilestoneType::InsightCapture => vec![ReflectionVoiced],
        MilestoneType::GrowthSummary => vec![ReflectionVoiced, SustainedEngagement],
    };
    Some(criteria)
}

/// The actions a milestone asks of the student.
pub fn required_actions_for(milestone: MilestoneType) -> Vec<String> {
    let actions: &[&str] = match milestone {
        MilestoneType::PhaseEntry => &["settle into the phase and respond substantively"],
        MilestoneType::KnowledgeAcquisition => {
            &["show new domain knowledge", "use concepts in context"]
        }
        MilestoneType::ReadinessAssessment => &["say when you feel ready to go deeper"],
        MilestoneType::DeepInquiry => &["pursue an open question of your own"],
        MilestoneType::PatternRecognition => &["name a pattern across what you've seen"],
        MilestoneType::ConnectionForming => &["connect two ideas and say why they relate"],
        MilestoneType::IntegrationCheck => &["state the integrated idea in your own words"],
        MilestoneType::DesignApplication => &["apply the idea to your own design"],
        MilestoneType::IterationReview => &["review an iteration against your intent"],
        MilestoneType::InsightCapture => &["articulate one thing you learned"],
        MilestoneType::GrowthSummary => &["summarize how your thinking changed"],
    };
    actions.iter().map(|s| (*s).to_string()).collect()
}

/// Forward-looking focus text for prompt builders.
pub fn focus_for(milestone: MilestoneType) -> &'static str {
    match milestone {
        MilestoneType::PhaseEntry => "settling into the current phase",
        MilestoneType::KnowledgeAcquisition => "building core domain knowledge",
        MilestoneType::ReadinessAssessment => "gauging readiness to go deeper",
        MilestoneType::DeepInquiry => "pursuing open questions",
        MilestoneType::PatternRecognition => "recognizing recurring patterns",
        MilestoneType::ConnectionForming => "connecting ideas across topics",
        MilestoneType::IntegrationCheck => "integrating understanding",
        MilestoneType::DesignApplication => "applying ideas to the student's own design",
        MilestoneType::IterationReview => "reviewing design iterations against intent",
        MilestoneType::InsightCapture => "capturing insights from the work",
        MilestoneType::GrowthSummary => "summarizing growth across the session",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================
    // Structure tests
    // =========================================

    #[test]
    fn test_every_phase_starts_with_phase_entry() {
        for phase in LearningPhase::all() {
            let s = structure_for(phase);
            assert_eq!(s.milestones.first(), Some(&MilestoneType::PhaseEntry));
            assert_eq!(s.milestones.len(), 3);
            assert!(s.min_messages >= 2);
        }
    }

    #[test]
    fn test_discovery_sequence_matches_template() {
        let s = structure_for(LearningPhase::Discovery);
        assert_eq!(
            s.milestones,
            vec![
                MilestoneType::PhaseEntry,
                MilestoneType::KnowledgeAcquisition,
                MilestoneType::ReadinessAssessment,
            ]
        );
    }

    #[test]
    fn test_every_milestone_has_criteria_and_actions() {
        for phase in LearningPhase::all() {
            for milestone in structure_for(phase).milestones {
                let criteria = criteria_for(milestone).unwrap();
                assert!(!criteria.is_empty(), "{milestone} has no criteria");
                assert!(
                    !required_actions_for(milestone).is_empty(),
                    "{milestone} has no actions"
                );
                assert!(!focus_for(milestone).is_empty());
            }
        }
    }

    // =========================================
    // Depth scoring
    // =========================================

    #[test]
    fn test_depth_scores_counts_by_kind() {
        let scores = depth_scores(
            "i realized it works because the court connects both wings, so i'll use it in my project",
        );
        assert!(scores.synthesis >= 2);
        assert!(scores.application >= 1);
        assert!(scores.reflection >= 1);
        assert!(scores.any());
    }

    #[test]
    fn test_depth_scores_empty() {
        let scores = depth_scores("the brick is red");
        assert_eq!(scores, DepthScores::default());
        assert!(!scores.any());
    }

    #[test]
    fn test_expresses_readiness() {
        assert!(expresses_readiness("ok, what's next?"));
        assert!(expresses_readiness("i'm ready to move on"));
        assert!(!expresses_readiness("the roof is done"));
    }
}
