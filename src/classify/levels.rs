//! Level derivation for understanding, confidence, and engagement.
//!
//! Each level is derived independently by counting matches against small
//! curated word tiers, then applying length/punctuation heuristics. A message
//! shorter than [`SHORT_MESSAGE_WORDS`] words with no technical content reads
//! as low engagement and low understanding.

use super::patterns::{find_matches, has_technical_term, OVERCONFIDENCE_MARKERS};
use super::types::{ConfidenceLevel, EngagementLevel, UnderstandingLevel};

/// Word count below which a non-technical message reads as low effort.
pub(crate) const SHORT_MESSAGE_WORDS: usize = 5;

/// Word count above which a message reads as high engagement.
const LONG_MESSAGE_WORDS: usize = 25;

/// Cues of deep processing: causal and relational connectives.
const DEPTH_CUES: &[&str] = &[
    "because",
    "therefore",
    "which means",
    "relationship",
    "trade-off",
    "tradeoff",
    "implies",
    "consequently",
    "on the other hand",
    "compared to",
];

/// Cues of shallow or struggling processing.
const SHALLOW_CUES: &[&str] = &[
    "no idea",
    "don't understand",
    "dont understand",
    "confused",
    "lost",
    "what even",
];

/// Hedging phrases that signal uncertainty.
const UNCERTAINTY_CUES: &[&str] = &[
    "maybe",
    "perhaps",
    "i think",
    "i guess",
    "not sure",
    "might",
    "possibly",
    "i'm unsure",
    "im unsure",
];

/// Curiosity and enthusiasm phrases that signal high engagement.
const CURIOSITY_CUES: &[&str] = &[
    "interesting",
    "fascinating",
    "i wonder",
    "curious",
    "excited",
    "i love",
    "can't wait",
];

/// Flat responses that signal disengagement.
const DISENGAGEMENT_CUES: &[&str] = &["whatever", "i guess", "fine.", "ok.", "sure.", "dunno"];

/// A derived level with the cues that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSignal<L> {
    pub level: L,
    pub indicators: Vec<String>,
}

/// Derive the understanding level.
pub fn assess_understanding(lower: &str, word_count: usize) -> LevelSignal<UnderstandingLevel> {
    let shallow = find_matches(lower, SHALLOW_CUES);
    if !shallow.is_empty() {
        return LevelSignal {
            level: UnderstandingLevel::Low,
            indicators: shallow,
        };
    }

    if word_count < SHORT_MESSAGE_WORDS && !has_technical_term(lower) {
        return LevelSignal {
            level: UnderstandingLevel::Low,
            indicators: vec!["short non-technical message".to_string()],
        };
    }

    let depth = find_matches(lower, DEPTH_CUES);
    if depth.len() >= 2 {
        return LevelSignal {
            level: UnderstandingLevel::High,
            indicators: depth,
        };
    }

    LevelSignal {
        level: UnderstandingLevel::Medium,
        indicators: depth,
    }
}

/// Derive the confidence level.
///
/// Overconfidence markers dominate hedging: "obviously this might work"
/// still reads as overconfident, since the certainty claim is the signal the
/// router cares about.
pub fn assess_confidence(lower: &str) -> LevelSignal<ConfidenceLevel> {
    let over = find_matches(lower, OVERCONFIDENCE_MARKERS);
    if !over.is_empty() {
        return LevelSignal {
            level: ConfidenceLevel::Overconfident,
            indicators: over,
        };
    }

    let hedges = find_matches(lower, UNCERTAINTY_CUES);
    if !hedges.is_empty() {
        return LevelSignal {
            level: ConfidenceLevel::Uncertain,
            indicators: hedges,
        };
    }

    LevelSignal {
        level: ConfidenceLevel::Confident,
        indicators: Vec::new(),
    }
}

/// Derive the engagement level.
pub fn assess_engagement(lower: &str, word_count: usize) -> LevelSignal<EngagementLevel> {
    let flat = find_matches(lower, DISENGAGEMENT_CUES);
    if !flat.is_empty() || (word_count < SHORT_MESSAGE_WORDS && !has_technical_term(lower)) {
        let mut indicators = flat;
        if indicators.is_empty() {
            indicators.push("short non-technical message".to_string());
        }
        return LevelSignal {
            level: EngagementLevel::Low,
            indicators,
        };
    }

    let mut indicators = find_matches(lower, CURIOSITY_CUES);
    let question_count = lower.matches('?').count();
    let exclaims = lower.contains('!');

    if question_count >= 2 {
        indicators.push("multiple questions".to_string());
    }
    if exclaims {
        indicators.push("exclamation".to_string());
    }
    if word_count > LONG_MESSAGE_WORDS {
        indicators.push("long message".to_string());
    }

    if !indicators.is_empty() {
        return LevelSignal {
            level: EngagementLevel::High,
            indicators,
        };
    }

    LevelSignal {
        level: EngagementLevel::Medium,
        indicators: Vec::new(),
    }
}
