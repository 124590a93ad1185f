//! Ordered pattern groups for interaction-type detection.
//!
//! Groups are evaluated in fixed priority order against the lower-cased
//! utterance:
//! 1. cognitive-offloading phrasing
//! 2. overconfidence markers
//! 3. topic-transition phrasing
//! 4. specific intents, ordered by specificity (design-guidance before
//!    confusion, clarification before generic knowledge, evaluation before
//!    feedback, example before generic knowledge, improvement before generic
//!    exploration)
//! 5. contextual fallback on punctuation and interrogative cues
//!
//! The first group that matches wins; exactly one interaction type is ever
//! selected.

use super::types::InteractionType;
use regex::Regex;
use std::sync::LazyLock;

/// Phrases that signal a request for a ready-made answer.
pub(crate) const OFFLOADING_PHRASES: &[&str] = &[
    "just tell me",
    "just give me",
    "give me the answer",
    "tell me the answer",
    "do it for me",
    "solve it for me",
    "write it for me",
    "design it for me",
    "can you just do",
    "what's the answer",
];

/// Certainty markers that, without supporting reasoning, read as overconfidence.
pub(crate) const OVERCONFIDENCE_MARKERS: &[&str] = &[
    "obviously",
    "clearly",
    "definitely",
    "perfect",
    "optimal",
    "without a doubt",
    "certainly the best",
    "the only way",
];

/// Explicit subject-change phrasing.
pub(crate) const TOPIC_TRANSITION_PHRASES: &[&str] = &[
    "let's talk about",
    "lets talk about",
    "switch to",
    "let's move on",
    "moving on to",
    "change the subject",
    "can we discuss",
    "different topic",
];

const DESIGN_GUIDANCE_PHRASES: &[&str] = &[
    "how should i approach",
    "how do i start",
    "where do i start",
    "what direction",
    "guide me",
    "what should i consider",
    "how would you approach",
];

const CONFUSION_PHRASES: &[&str] = &[
    "i'm confused",
    "im confused",
    "i don't understand",
    "i dont understand",
    "i'm lost",
    "im lost",
    "makes no sense",
    "i don't get",
    "not sure what",
];

const CLARIFICATION_PHRASES: &[&str] = &[
    "what do you mean",
    "can you clarify",
    "could you clarify",
    "clarify that",
    "explain what you meant",
    "in other words",
];

const EVALUATION_PHRASES: &[&str] = &[
    "evaluate my",
    "assess my",
    "is this good",
    "is my design good",
    "how did i do",
    "grade my",
    "critique my",
];

const FEEDBACK_PHRASES: &[&str] = &[
    "feedback",
    "thoughts on my",
    "what do you think of my",
    "what do you think about my",
    "review my",
    "opinion on my",
];

/// Example/precedent phrasing. Also drives the routing engine's pure-example
/// fast path.
pub(crate) const EXAMPLE_PHRASES: &[&str] = &[
    "example",
    "examples",
    "precedent",
    "precedents",
    "case study",
    "case studies",
    "projects like",
    "similar projects",
];

const TECHNICAL_TERMS: &[&str] = &[
    "structural",
    "load-bearing",
    "hvac",
    "building code",
    "zoning",
    "egress",
    "accessibility requirements",
    "u-value",
    "insulation",
    "construction detail",
    "foundation",
    "span",
];

const IMPLEMENTATION_PHRASES: &[&str] = &[
    "how do i implement",
    "how do i build",
    "how do i model",
    "help me draw",
    "help me model",
    "steps to",
    "walk me through making",
];

const IMPROVEMENT_PHRASES: &[&str] = &[
    "how can i improve",
    "improve my",
    "make it better",
    "make this better",
    "strengthen my",
    "refine my",
];

const KNOWLEDGE_PHRASES: &[&str] = &[
    "what is",
    "what are",
    "tell me about",
    "explain",
    "define",
    "how does",
    "why does",
];

const EXPLORATION_PHRASES: &[&str] = &[
    "what if",
    "imagine",
    "explore",
    "possibilities",
    "could we try",
    "brainstorm",
];

static INTERROGATIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(what|how|why|when|where|which|who|can|could|should|would|is|are|do|does)\b")
        .unwrap()
});

/// A matched interaction type with the phrases that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentMatch {
    pub interaction: InteractionType,
    pub indicators: Vec<String>,
}

impl IntentMatch {
    fn new(interaction: InteractionType, indicators: Vec<String>) -> Self {
        Self {
            interaction,
            indicators,
        }
    }
}

/// Collect every phrase from `phrases` contained in `lower`.
pub(crate) fn find_matches(lower: &str, phrases: &[&str]) -> Vec<String> {
    phrases
        .iter()
        .filter(|p| lower.contains(*p))
        .map(|p| (*p).to_string())
        .collect()
}

/// Check whether the utterance carries an interrogative cue.
pub(crate) fn has_interrogative_cue(text: &str) -> bool {
    INTERROGATIVE_REGEX.is_match(text)
}

/// Check whether the utterance mentions technical subject matter.
pub(crate) fn has_technical_term(lower: &str) -> bool {
    !find_matches(lower, TECHNICAL_TERMS).is_empty()
}

/// Check whether the utterance carries concrete implementation-guidance
/// phrasing. A request for examples alongside this phrasing is not "pure".
pub(crate) fn has_implementation_phrasing(lower: &str) -> bool {
    !find_matches(lower, IMPLEMENTATION_PHRASES).is_empty()
}

/// Evaluate groups 1–4 in priority order.
///
/// Returns `None` when no group matches; the caller then applies
/// [`fallback_interaction`].
pub fn match_interaction(lower: &str) -> Option<IntentMatch> {
    // Group 1: cognitive offloading. Highest priority; the gate that keeps
    // legitimate requests from being flagged lives in the offloading
    // detector, not here.
    let hits = find_matches(lower, OFFLOADING_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::CognitiveOffloading, hits));
    }

    // Group 2: overconfidence markers.
    let hits = find_matches(lower, OVERCONFIDENCE_MARKERS);
    if !hits.is_empty() {
        return Some(IntentMatch::new(
            InteractionType::OverconfidentStatement,
            hits,
        ));
    }

    // Group 3: topic transitions.
    let hits = find_matches(lower, TOPIC_TRANSITION_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::TopicTransition, hits));
    }

    // Group 4: specific intents, most specific first. Design guidance is
    // checked before confusion so a guidance request carrying "not sure
    // where to start" is not misread as confusion.
    let hits = find_matches(lower, DESIGN_GUIDANCE_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::DesignGuidance, hits));
    }

    let hits = find_matches(lower, CONFUSION_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::ConfusionExpression, hits));
    }

    // Clarification before generic knowledge.
    let hits = find_matches(lower, CLARIFICATION_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(
            InteractionType::ClarificationRequest,
            hits,
        ));
    }

    // Evaluation before feedback.
    let hits = find_matches(lower, EVALUATION_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::EvaluationRequest, hits));
    }

    let hits = find_matches(lower, FEEDBACK_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::FeedbackRequest, hits));
    }

    // Example before generic knowledge.
    let hits = find_matches(lower, EXAMPLE_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::ExampleRequest, hits));
    }

    // Technical questions need both a technical term and a question shape.
    let hits = find_matches(lower, TECHNICAL_TERMS);
    if !hits.is_empty() && (lower.trim_end().ends_with('?') || has_interrogative_cue(lower)) {
        return Some(IntentMatch::new(InteractionType::TechnicalQuestion, hits));
    }

    let hits = find_matches(lower, IMPLEMENTATION_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(
            InteractionType::ImplementationRequest,
            hits,
        ));
    }

    // Improvement before generic exploration.
    let hits = find_matches(lower, IMPROVEMENT_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::ImprovementSeeking, hits));
    }

    let hits = find_matches(lower, KNOWLEDGE_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::KnowledgeRequest, hits));
    }

    let hits = find_matches(lower, EXPLORATION_PHRASES);
    if !hits.is_empty() {
        return Some(IntentMatch::new(InteractionType::CreativeExploration, hits));
    }

    None
}

/// Group 5: contextual fallback.
///
/// A trailing `?` with an interrogative cue reads as a knowledge request; a
/// bare `?` falls back to a general question; anything else is a general
/// statement. Never fails — the classifier is total.
pub fn fallback_interaction(lower: &str) -> IntentMatch {
    let trimmed = lower.trim_end();
    let is_question = trimmed.ends_with('?');

    if is_question && has_interrogative_cue(trimmed) {
        return IntentMatch::new(
            InteractionType::KnowledgeRequest,
            vec!["interrogative question".to_string()],
        );
    }

    if is_question {
        return IntentMatch::new(InteractionType::GeneralQuestion, Vec::new());
    }

    IntentMatch::new(InteractionType::GeneralStatement, Vec::new())
}
