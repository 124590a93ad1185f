//! Gamification-trigger detection and override mapping.
//!
//! Triggers reflect the student's pedagogical state (boredom, unexamined
//! certainty, curiosity, stuck-ness) rather than the literal content of the
//! request. Once detected they take precedence over content-based rules:
//! the engine maps the strongest trigger straight to a route, bypassing the
//! table.

use super::types::{ResponseTrigger, Route};
use crate::classify::patterns::find_matches;
use crate::classify::{Classification, ConfidenceLevel, EngagementLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

const CURIOSITY_PHRASES: &[&str] = &[
    "i wonder",
    "curious",
    "what if",
    "fascinating",
    "interesting",
];

const STUCK_PHRASES: &[&str] = &[
    "stuck",
    "going in circles",
    "hit a wall",
    "can't figure",
    "cant figure",
    "no matter what i try",
];

const MASTERY_PHRASES: &[&str] = &[
    "too easy",
    "i already know",
    "i've mastered",
    "ive mastered",
    "this is easy",
    "give me something harder",
];

const NARRATIVE_PHRASES: &[&str] = &["story", "narrative", "imagine if", "what's the journey"];

const COMPARISON_PHRASES: &[&str] = &["versus", " vs ", "compare", "which is better", "trade-off between"];

const PERSPECTIVE_PHRASES: &[&str] = &[
    "from the perspective",
    "point of view",
    "as a visitor",
    "as a user",
    "stakeholder",
    "through their eyes",
];

/// A detected pedagogical-state signal.
///
/// Variants are listed in precedence order; the strongest detected trigger
/// decides the override route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamificationTrigger {
    Overconfidence,
    LowEngagement,
    Stuck,
    Mastery,
    Curiosity,
    Comparison,
    PerspectiveShift,
    Narrative,
}

impl GamificationTrigger {
    /// The route this trigger overrides to.
    pub fn route(&self) -> Route {
        match self {
            Self::Overconfidence => Route::CognitiveChallenge,
            Self::LowEngagement => Route::CognitiveChallenge,
            Self::Stuck => Route::SupportiveScaffolding,
            Self::Mastery => Route::KnowledgeWithChallenge,
            Self::Curiosity => Route::SocraticExploration,
            Self::Comparison => Route::BalancedGuidance,
            Self::PerspectiveShift => Route::SocraticExploration,
            Self::Narrative => Route::SocraticExploration,
        }
    }

    /// The response-shaping tag carried into the decision.
    pub fn response_trigger(&self) -> ResponseTrigger {
        match self {
            Self::Overconfidence => ResponseTrigger::RealityCheck,
            Self::LowEngagement => ResponseTrigger::NarrativeFraming,
            Self::Stuck => ResponseTrigger::UnstickNudge,
            Self::Mastery => ResponseTrigger::MasteryStretch,
            Self::Curiosity => ResponseTrigger::CuriosityAmplification,
            Self::Comparison => ResponseTrigger::PerspectiveShift,
            Self::PerspectiveShift => ResponseTrigger::PerspectiveShift,
            Self::Narrative => ResponseTrigger::NarrativeFraming,
        }
    }

    /// Stable snake_case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overconfidence => "overconfidence",
            Self::LowEngagement => "low_engagement",
            Self::Stuck => "stuck",
            Self::Mastery => "mastery",
            Self::Curiosity => "curiosity",
            Self::Comparison => "comparison",
            Self::PerspectiveShift => "perspective_shift",
            Self::Narrative => "narrative",
        }
    }
}

impl fmt::Display for GamificationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Detect gamification triggers for a turn, in precedence order.
pub fn detect_triggers(classification: &Classification, lower: &str) -> Vec<GamificationTrigger> {
    let mut triggers = Vec::new();

    if classification.confidence == ConfidenceLevel::Overconfident {
        triggers.push(GamificationTrigger::Overconfidence);
    }
    if classification.engagement == EngagementLevel::Low {
        triggers.push(GamificationTrigger::LowEngagement);
    }
    if !find_matches(lower, STUCK_PHRASES).is_empty() {
        triggers.push(GamificationTrigger::Stuck);
    }
    if !find_matches(lower, MASTERY_PHRASES).is_empty() {
        triggers.push(GamificationTrigger::Mastery);
    }
    if !find_matches(lower, CURIOSITY_PHRASES).is_empty() {
        triggers.push(GamificationTrigger::Curiosity);
    }
    if !find_matches(lower, COMPARISON_PHRASES).is_empty() {
        triggers.push(GamificationTrigger::Comparison);
    }
    if !find_matches(lower, PERSPECTIVE_PHRASES).is_empty() {
        triggers.push(GamificationTrigger::PerspectiveShift);
    }
    if !find_matches(lower, NARRATIVE_PHRASES).is_empty() {
        triggers.push(GamificationTrigger::Narrative);
    }

    triggers
}
