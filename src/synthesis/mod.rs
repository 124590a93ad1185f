//! Response synthesis.
//!
//! Applies a route-specific assembly template over the collaborator results
//! for a turn, deduplicates near-identical outputs, and runs the quality
//! gate. Any template-construction failure falls back to the raw
//! best-available collaborator text; the synthesizer always produces a
//! reply.

pub mod quality;
pub mod similarity;

pub use quality::{QualityGate, DEFAULT_MAX_REPLY_CHARS};
pub use similarity::{dedup_results, overlap_ratio, DEFAULT_SIMILARITY_THRESHOLD};

use crate::collab::{result_for, AgentResult, CollaboratorKind, PromptContext};
use crate::routing::Route;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Fixed fallback when a challenge collaborator contributed nothing.
const CHALLENGE_FALLBACK: &str =
    "Before we go further: what evidence would have to show up to change your mind about this?";

/// Fixed fallback for the offloading intervention.
const INTERVENTION_FALLBACK: &str =
    "I could hand you an answer, but it would cost you the reasoning. Walk me through your \
     current thinking first — what have you tried?";

/// Fixed reply for the error route.
const ERROR_REPLY: &str =
    "Let me try a different angle. Tell me a bit more about where you are with the project \
     right now — what feels most unresolved?";

/// Opening question when no collaborator contributed on the first turn.
const OPENING_FALLBACK: &str = "What's the project, and what drew you to it?";

/// Follow-up appended to knowledge-only replies that contain no question.
const KNOWLEDGE_FOLLOWUP: &str = "What would you like to dig into next?";

/// Appended when a socratic reply lacks its trailing question.
const EXPLORATORY_QUESTION: &str = "What happens if you test that assumption directly?";

static LINE_MARKUP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:\d+\.\s+|[-*]\s+|#{1,6}\s*)").unwrap());

/// A synthesized reply with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutput {
    /// The assembled, gated reply.
    pub reply: String,
    /// Collaborators whose text survived into the reply.
    pub sources: Vec<CollaboratorKind>,
    /// Whether near-duplicate outputs were dropped.
    pub deduplicated: bool,
}

/// Assembles one reply per turn from collaborator results.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    similarity_threshold: f64,
    gate: QualityGate,
}

impl Synthesizer {
    pub fn new(similarity_threshold: f64, gate: QualityGate) -> Self {
        Self {
            similarity_threshold: similarity_threshold.clamp(0.0, 1.0),
            gate,
        }
    }

    /// Synthesize the reply for a turn.
    pub fn synthesize(&self, ctx: &PromptContext, results: &[AgentResult]) -> SynthesisOutput {
        // Preference order is the route's collaborator order; dedup keeps
        // the earlier-preferred of any near-duplicate pair.
        let ordered = order_by_preference(ctx.route, results);
        let (kept, deduplicated) = dedup_results(ordered, self.similarity_threshold);

        let assembled = self
            .apply_template(ctx, &kept)
            .or_else(|| best_available(&kept).map(|r| r.text.clone()))
            .unwrap_or_else(|| fallback_for_route(ctx.route).to_string());

        let reply = self.gate.enforce(ctx.route, &assembled);
        let sources = kept.iter().map(|r| r.collaborator).collect();

        debug!(route = %ctx.route, deduplicated, "reply synthesized");
        SynthesisOutput {
            reply,
            sources,
            deduplicated,
        }
    }

    /// The route-specific template. `None` means construction failed and the
    /// caller should fall back to raw collaborator text.
    fn apply_template(&self, ctx: &PromptContext, results: &[AgentResult]) -> Option<String> {
        let knowledge = result_for(results, CollaboratorKind::Knowledge);
        let question = result_for(results, CollaboratorKind::Question);
        let challenge = result_for(results, CollaboratorKind::Challenge);
        let retriever = result_for(results, CollaboratorKind::Retriever);

        match ctx.route {
            Route::KnowledgeOnly => {
                let body = knowledge
                    .map(|r| clean_markdown(&r.text))
                    .or_else(|| question.map(|r| r.text.clone()))?;
                if body.contains('?') {
                    Some(body)
                } else {
                    Some(format!("{}\n\n{}", body.trim_end(), KNOWLEDGE_FOLLOWUP))
                }
            }

            Route::SocraticExploration | Route::SocraticClarification => {
                let body = question
                    .map(|r| r.text.clone())
                    .or_else(|| knowledge.map(|r| clean_markdown(&r.text)))?;
                if body.trim_end().ends_with('?') {
                    Some(body)
                } else {
                    // No trailing question arrived; a generic exploratory one
                    // beats fabricating false precision.
                    Some(format!("{}\n\n{}", body.trim_end(), EXPLORATORY_QUESTION))
                }
            }

            Route::CognitiveChallenge => Some(
                challenge
                    .map(|r| r.text.clone())
                    .unwrap_or_else(|| CHALLENGE_FALLBACK.to_string()),
            ),

            Route::CognitiveIntervention => {
                let body = challenge
                    .map(|r| r.text.clone())
                    .unwrap_or_else(|| INTERVENTION_FALLBACK.to_string());
                match question {
                    Some(q) if !body.trim_end().ends_with('?') => {
                        Some(format!("{}\n\n{}", body.trim_end(), q.text))
                    }
                    _ => Some(body),
                }
            }

            Route::MultiAgentComprehensive
            | Route::BalancedGuidance
            | Route::KnowledgeWithChallenge => {
                let insight_source = knowledge.or(retriever)?;
                let insight = first_substantial_sentence(&insight_source.text)?;

                let direction = question
                    .and_then(|r| first_sentence(&r.text))
                    .map(|s| as_directive(&s))
                    .unwrap_or_else(|| {
                        "Take the next pass at the drawing with this in mind.".to_string()
                    });

                let watch = challenge
                    .and_then(|r| first_sentence(&r.text))
                    .unwrap_or_else(|| default_caution(ctx.project_type.as_deref()).to_string());

                Some(format!(
                    "**Insight** — {insight}\n**Direction** — {direction}\n**Watch** — {watch}\n\n{closing}",
                    closing = closing_question(ctx.topic.as_deref()),
                ))
            }

            Route::ProgressiveOpening => Some(
                question
                    .map(|r| r.text.clone())
                    .unwrap_or_else(|| OPENING_FALLBACK.to_string()),
            ),

            Route::TopicTransition => {
                let lead = match ctx.topic.as_deref() {
                    Some(topic) => format!("Good — let's pick up {topic}."),
                    None => "Good — let's pick that up.".to_string(),
                };
                let body = knowledge
                    .and_then(|r| first_substantial_sentence(&r.text))
                    .map(|s| format!("{lead} {s}"))
                    .unwrap_or(lead);
                match question {
                    Some(q) => Some(format!("{}\n\n{}", body.trim_end(), q.text)),
                    None => Some(body),
                }
            }

            Route::SupportiveScaffolding | Route::FoundationalBuilding => {
                let body = knowledge.map(|r| clean_markdown(&r.text))?;
                match question {
                    Some(q) => Some(format!("{}\n\n{}", body.trim_end(), q.text)),
                    None => Some(body),
                }
            }

            Route::Error => Some(ERROR_REPLY.to_string()),
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD, QualityGate::default())
    }
}

/// Reorder results to the route's collaborator preference order.
fn order_by_preference(route: Route, results: &[AgentResult]) -> Vec<AgentResult> {
    let preference = route.collaborators();
    let position = |kind: CollaboratorKind| {
        preference
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(preference.len())
    };
    let mut ordered: Vec<AgentResult> = results.to_vec();
    ordered.sort_by_key(|r| position(r.collaborator));
    ordered
}

/// The first contributing result, used as the raw fallback.
fn best_available(results: &[AgentResult]) -> Option<&AgentResult> {
    results.iter().find(|r| r.has_contribution())
}

/// Fixed texts for routes that can say something with no contributions.
fn fallback_for_route(route: Route) -> &'static str {
    match route {
        Route::Error => ERROR_REPLY,
        Route::CognitiveIntervention => INTERVENTION_FALLBACK,
        Route::CognitiveChallenge => CHALLENGE_FALLBACK,
        Route::ProgressiveOpening => OPENING_FALLBACK,
        _ => "Let's keep going. Tell me more about what you're working through right now — \
              what part matters most to you?",
    }
}

/// Strip list numbering, bullets, and heading markers from every line.
fn clean_markdown(text: &str) -> String {
    LINE_MARKUP_REGEX.replace_all(text.trim(), "").into_owned()
}

/// First sentence of a text, markup stripped.
fn first_sentence(text: &str) -> Option<String> {
    let cleaned = clean_markdown(text);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed
        .char_indices()
        .find(|&(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(trimmed.len());
    Some(trimmed[..end].trim().to_string())
}

/// First sentence carrying at least four words.
fn first_substantial_sentence(text: &str) -> Option<String> {
    let cleaned = clean_markdown(text);
    let mut rest = cleaned.trim();
    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .find(|&(_, c)| matches!(c, '.' | '!' | '?'))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(rest.len());
        let sentence = rest[..end].trim();
        if sentence.split_whitespace().count() >= 4 {
            return Some(sentence.to_string());
        }
        rest = rest[end..].trim_start();
    }
    None
}

/// Render a question as a directive rather than a question.
fn as_directive(question: &str) -> String {
    let stripped = question.trim().trim_end_matches('?').trim_end();
    let lower = stripped.to_lowercase();
    let directive = if ["what", "how", "why", "where", "which", "when"]
        .iter()
        .any(|w| lower.starts_with(w))
    {
        format!("Consider {}", decapitalize(stripped))
    } else {
        format!("Work through this: {stripped}")
    };
    format!("{directive}.")
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Project-type-specific caution for the Watch line.
fn default_caution(project_type: Option<&str>) -> &'static str {
    match project_type {
        Some("community_center") => {
            "Community programs compete quietly; watch the acoustic seams between them."
        }
        Some("library") => "Watch the noise gradient — every library fails at its thresholds first.",
        Some("museum") => "Watch the daylight; what serves the visitor can damage the collection.",
        Some("school") => "Watch the sightlines; supervision shapes school plans more than pedagogy.",
        Some("housing") => "Watch the repetition; units that pencil out can still flatten identity.",
        _ => "Watch that early decisions don't harden before the site has had its say.",
    }
}

/// One contextually generated closing question.
fn closing_question(topic: Option<&str>) -> String {
    match topic {
        Some(topic) => format!("Which of these matters most for {topic} right now?"),
        None => "Which of these directions feels closest to your intent?".to_string(),
    }
}
