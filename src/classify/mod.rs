//! Intent and offloading classification.
//!
//! Turns a raw student utterance into the structured signal set the routing
//! engine consumes. The classifier is a pure function: deterministic for
//! identical inputs, and total — ambiguous input yields the general
//! statement/question fallback rather than an error.

pub mod levels;
pub mod offloading;
pub mod patterns;
pub mod types;

pub use types::{
    Classification, ConfidenceLevel, EngagementLevel, InteractionType, OffloadingCheck,
    OffloadingKind, UnderstandingLevel,
};

use levels::{assess_confidence, assess_engagement, assess_understanding};
use offloading::detect_offloading;
use patterns::{
    fallback_interaction, find_matches, has_implementation_phrasing, has_technical_term,
    match_interaction, OFFLOADING_PHRASES,
};

/// Number of trailing history messages consulted for cross-turn patterns.
const HISTORY_WINDOW: usize = 3;

/// History messages in the window that must carry offloading phrasing before
/// a detection is upgraded to overreliance.
const OVERRELIANCE_STREAK: usize = 2;

/// Classify a student utterance.
///
/// `recent_history` holds prior student messages, oldest first; only the
/// trailing [`HISTORY_WINDOW`] entries are consulted, to detect delegation
/// streaks that a single turn cannot show.
pub fn classify(text: &str, recent_history: &[String]) -> Classification {
    let lower = text.to_lowercase();
    let trimmed = lower.trim();

    if trimmed.is_empty() || !trimmed.chars().any(|c| c.is_alphanumeric()) {
        let mut c = Classification::fallback(false);
        c.interaction = InteractionType::Unknown;
        return c;
    }

    let word_count = trimmed.split_whitespace().count();

    let intent = match_interaction(trimmed).unwrap_or_else(|| fallback_interaction(trimmed));

    let understanding = assess_understanding(trimmed, word_count);
    let confidence = assess_confidence(trimmed);
    let engagement = assess_engagement(trimmed, word_count);

    let mut offloading = detect_offloading(trimmed, intent.interaction);
    if offloading.detected && delegation_streak(recent_history) {
        offloading.kind = OffloadingKind::Overreliance;
        offloading
            .indicators
            .push("repeated delegation across turns".to_string());
        offloading.confidence = (offloading.confidence + 0.1).min(0.95);
    }

    let mut indicators = intent.indicators.clone();
    indicators.extend(understanding.indicators.iter().cloned());
    indicators.extend(confidence.indicators.iter().cloned());
    indicators.extend(engagement.indicators.iter().cloned());
    indicators.dedup();

    let is_question = trimmed.ends_with('?') || intent.interaction.is_question_like();

    Classification {
        is_pure_knowledge_request: matches!(
            intent.interaction,
            InteractionType::KnowledgeRequest | InteractionType::ExampleRequest
        ) && !has_implementation_phrasing(trimmed),
        is_technical_question: intent.interaction == InteractionType::TechnicalQuestion
            || (has_technical_term(trimmed) && is_question),
        is_feedback_request: matches!(
            intent.interaction,
            InteractionType::FeedbackRequest | InteractionType::EvaluationRequest
        ),
        shows_confusion: intent.interaction == InteractionType::ConfusionExpression
            || understanding.level == UnderstandingLevel::Low,
        requests_help: is_question
            || matches!(
                intent.interaction,
                InteractionType::DesignGuidance
                    | InteractionType::ImplementationRequest
                    | InteractionType::ImprovementSeeking
                    | InteractionType::CognitiveOffloading
            ),
        interaction: intent.interaction,
        understanding: understanding.level,
        confidence: confidence.level,
        engagement: engagement.level,
        indicators,
        offloading,
    }
}

/// Check whether the recent history shows a delegation streak.
fn delegation_streak(recent_history: &[String]) -> bool {
    let window = recent_history
        .iter()
        .rev()
        .take(HISTORY_WINDOW)
        .filter(|m| !find_matches(&m.to_lowercase(), OFFLOADING_PHRASES).is_empty())
        .count();
    window >= OVERRELIANCE_STREAK
}
