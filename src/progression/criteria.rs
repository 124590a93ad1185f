//! Named milestone-completion criteria.
//!
//! Each criterion is assessed by keyword heuristics against the lower-cased
//! utterance plus the turn's classification, returning a met/confidence
//! pair. A milestone completes only when **all** of its required criteria
//! are met.

use crate::classify::patterns::find_matches;
use crate::classify::{Classification, EngagementLevel, UnderstandingLevel};
use crate::progression::phases::{
    APPLICATION_INDICATORS, READINESS_PHRASES, REFLECTION_INDICATORS, SYNTHESIS_INDICATORS,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain vocabulary whose use signals acquired knowledge.
const CONCEPT_VOCABULARY: &[&str] = &[
    "circulation",
    "massing",
    "parti",
    "threshold",
    "daylighting",
    "program",
    "section",
    "facade",
    "structure",
    "envelope",
    "site",
    "scale",
];

/// The named completion criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    /// The student demonstrates knowledge they did not show before.
    NewKnowledgeDemonstrated,
    /// The student draws connections between ideas.
    ConnectionsMade,
    /// The student expresses readiness to move on.
    ReadinessExpressed,
    /// The student engages with a question rather than deflecting.
    EngagedWithQuestion,
    /// The student applies knowledge to their own design.
    ApplicationAttempted,
    /// The student voices a reflection on their learning.
    ReflectionVoiced,
    /// The student uses domain vocabulary in context.
    ConceptVocabularyUsed,
    /// The student stays engaged across the exchange.
    SustainedEngagement,
}

impl CriterionKind {
    /// Stable snake_case identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewKnowledgeDemonstrated => "new_knowledge_demonstrated",
            Self::ConnectionsMade => "connections_made",
            Self::ReadinessExpressed => "readiness_expressed",
            Self::EngagedWithQuestion => "engaged_with_question",
            Self::ApplicationAttempted => "application_attempted",
            Self::ReflectionVoiced => "reflection_voiced",
            Self::ConceptVocabularyUsed => "concept_vocabulary_used",
            Self::SustainedEngagement => "sustained_engagement",
        }
    }
}

impl fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A criterion's met/confidence assessment for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionAssessment {
    pub criterion: CriterionKind,
    pub met: bool,
    pub confidence: f64,
}

impl CriterionAssessment {
    fn met(criterion: CriterionKind, confidence: f64) -> Self {
        Self {
            criterion,
            met: true,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    fn unmet(criterion: CriterionKind) -> Self {
        Self {
            criterion,
            met: false,
            confidence: 0.0,
        }
    }
}

/// Assess one criterion against the turn.
pub fn assess(
    criterion: CriterionKind,
    lower: &str,
    classification: &Classification,
) -> CriterionAssessment {
    let word_count = lower.split_whitespace().count();

    match criterion {
        CriterionKind::NewKnowledgeDemonstrated => {
            let vocab = find_matches(lower, CONCEPT_VOCABULARY);
            let substantial = classification.understanding >= UnderstandingLevel::Medium
                && word_count > 8;
            if !vocab.is_empty() && substantial {
                CriterionAssessment::met(criterion, 0.8)
            } else if substantial {
                CriterionAssessment::met(criterion, 0.6)
            } else {
                CriterionAssessment::unmet(criterion)
            }
        }
        CriterionKind::ConnectionsMade => {
            let hits = find_matches(lower, SYNTHESIS_INDICATORS);
            if hits.len() >= 2 {
                CriterionAssessment::met(criterion, 0.85)
            } else if hits.len() == 1 {
                CriterionAssessment::met(criterion, 0.6)
            } else {
                CriterionAssessment::unmet(criterion)
            }
        }
        CriterionKind::ReadinessExpressed => {
            if find_matches(lower, READINESS_PHRASES).is_empty() {
                CriterionAssessment::unmet(criterion)
            } else {
                CriterionAssessment::met(criterion, 0.9)
            }
        }
        CriterionKind::EngagedWithQuestion => {
            if lower.contains('?') || classification.engagement == EngagementLevel::High {
                CriterionAssessment::met(criterion, 0.7)
            } else {
                CriterionAssessment::unmet(criterion)
            }
        }
        CriterionKind::ApplicationAttempted => {
            let hits = find_matches(lower, APPLICATION_INDICATORS);
            if hits.is_empty() {
                CriterionAssessment::unmet(criterion)
            } else {
                CriterionAssessment::met(criterion, 0.75)
            }
        }
        CriterionKind::ReflectionVoiced => {
            let hits = find_matches(lower, REFLECTION_INDICATORS);
            if hits.is_empty() {
                CriterionAssessment::unmet(criterion)
            } else {
                CriterionAssessment::met(criterion, 0.8)
            }
        }
        CriterionKind::ConceptVocabularyUsed => {
            if find_matches(lower, CONCEPT_VOCABULARY).is_empty() {
                CriterionAssessment::unmet(criterion)
            } else {
                CriterionAssessment::met(criterion, 0.7)
            }
        }
        CriterionKind::SustainedEngagement => {
            if classification.engagement >= EngagementLevel::Medium {
                CriterionAssessment::met(criterion, 0.65)
            } else {
                CriterionAssessment::unmet(criterion)
            }
        }
    }
}

/// Assess a set of criteria; a milestone completes only if all are met.
pub fn assess_all(
    criteria: &[CriterionKind],
    lower: &str,
    classification: &Classification,
) -> Vec<CriterionAssessment> {
    criteria
        .iter()
        .map(|c| assess(*c, lower, classification))
        .collect()
}
