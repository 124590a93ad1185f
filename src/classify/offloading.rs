//! Gated cognitive-offloading detection.
//!
//! Offloading is a pattern of seeking a ready-made answer instead of engaging
//! in reasoning. Detection is gated: it never fires when the interaction type
//! is already a legitimate request category, so ordinary knowledge/example/
//! feedback requests are never flagged as offloading.

use super::patterns::{find_matches, OFFLOADING_PHRASES};
use super::types::{InteractionType, OffloadingCheck, OffloadingKind};

/// Phrases that delegate every decision back to the tutor.
const OVERRELIANCE_PHRASES: &[&str] = &[
    "you decide",
    "you choose",
    "pick for me",
    "whatever you think is best",
    "whichever you prefer",
    "i'll do whatever you say",
];

/// Phrases that dodge the reasoning work itself.
const AVOIDANCE_PHRASES: &[&str] = &[
    "i don't want to think",
    "i dont want to think",
    "too much work",
    "can we skip",
    "skip the explanation",
    "don't make me",
    "just so i can be done",
];

/// Base confidence for a single matched indicator.
const BASE_CONFIDENCE: f64 = 0.6;

/// Confidence added per additional indicator, capped at [`MAX_CONFIDENCE`].
const PER_HIT_CONFIDENCE: f64 = 0.15;

const MAX_CONFIDENCE: f64 = 0.95;

/// Detect cognitive offloading in an utterance.
///
/// `interaction` must be the already-selected interaction type for the turn;
/// legitimate request categories gate detection off entirely.
pub fn detect_offloading(lower: &str, interaction: InteractionType) -> OffloadingCheck {
    if interaction.is_legitimate_request() {
        return OffloadingCheck::none();
    }

    let solution_hits = find_matches(lower, OFFLOADING_PHRASES);
    if !solution_hits.is_empty() {
        let confidence = score(solution_hits.len());
        return OffloadingCheck::detected(OffloadingKind::SolutionRequest, confidence, solution_hits);
    }

    let reliance_hits = find_matches(lower, OVERRELIANCE_PHRASES);
    if !reliance_hits.is_empty() {
        let confidence = score(reliance_hits.len());
        return OffloadingCheck::detected(OffloadingKind::Overreliance, confidence, reliance_hits);
    }

    let avoidance_hits = find_matches(lower, AVOIDANCE_PHRASES);
    if !avoidance_hits.is_empty() {
        let confidence = score(avoidance_hits.len());
        return OffloadingCheck::detected(
            OffloadingKind::AvoidancePattern,
            confidence,
            avoidance_hits,
        );
    }

    OffloadingCheck::none()
}

fn score(hits: usize) -> f64 {
    (BASE_CONFIDENCE + PER_HIT_CONFIDENCE * (hits.saturating_sub(1) as f64)).min(MAX_CONFIDENCE)
}
