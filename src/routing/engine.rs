//! The routing engine.
//!
//! `decide` maps a turn's classification plus the session's continuity
//! context to a [`RoutingDecision`]. Evaluation order:
//!
//! 1. Pure-example fast path — example/precedent requests with no
//!    implementation phrasing are common and unambiguous enough to bypass
//!    the table entirely.
//! 2. Gamification-trigger override — detected pedagogical state outranks
//!    content-based rules.
//! 3. The declarative rule table, in ascending priority, first match wins.
//! 4. The balanced-guidance default.
//!
//! The fast path is evaluated before the trigger override unconditionally;
//! an utterance matching both reads as an explicit example request and is
//! answered as one.
//!
//! `decide` never fails: any internal error is converted into the explicit
//! error route carrying the original classification. Every decision also
//! updates the continuity record (route history always; sticky facts under
//! the conditional-update rule).

use super::rules::{suggested_route, RuleInput, RuleTable};
use super::triggers::detect_triggers;
use super::types::{ResponseTrigger, Route, RoutingDecision};
use crate::classify::{Classification, InteractionType};
use crate::collab::CollaboratorKind;
use crate::continuity::{ContinuityContext, DEFAULT_PERSISTENCE_THRESHOLD, DEFAULT_TURN_GATE};
use crate::errors::RoutingError;
use tracing::{debug, warn};

/// Base confidence for a fast-path decision.
const FAST_PATH_CONFIDENCE: f64 = 0.9;

/// Base confidence for a trigger-override decision.
const TRIGGER_CONFIDENCE: f64 = 0.85;

/// Base confidence for a table-rule decision.
const RULE_CONFIDENCE: f64 = 0.75;

/// Base confidence for the no-match default.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Project-type keywords recognized for the sticky continuity fact.
const PROJECT_TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("community center", "community_center"),
    ("community centre", "community_center"),
    ("library", "library"),
    ("museum", "museum"),
    ("school", "school"),
    ("housing", "housing"),
    ("pavilion", "pavilion"),
    ("adaptive reuse", "adaptive_reuse"),
    ("mixed-use", "mixed_use"),
    ("mixed use", "mixed_use"),
];

/// Phrases that anchor a project-type mention as the student's own project.
const PROJECT_ANCHOR_PHRASES: &[&str] = &[
    "my project",
    "i'm designing",
    "im designing",
    "i am designing",
    "my studio project",
    "working on a",
    "designing a",
];

/// Learning-phase cue words for the sticky continuity fact.
const PHASE_CUES: &[(&str, &str)] = &[
    ("just starting", "discovery"),
    ("getting started", "discovery"),
    ("exploring", "exploration"),
    ("trying out", "exploration"),
    ("bringing together", "synthesis"),
    ("combining", "synthesis"),
    ("applying", "application"),
    ("my design now", "application"),
    ("looking back", "reflection"),
    ("reflecting", "reflection"),
];

/// Settings the engine needs from configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Minimum detection confidence for a sticky fact to be stored.
    pub sticky_threshold: f64,
    /// Number of opening turns during which sticky facts may settle.
    pub sticky_turn_gate: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sticky_threshold: DEFAULT_PERSISTENCE_THRESHOLD,
            sticky_turn_gate: DEFAULT_TURN_GATE,
        }
    }
}

/// Maps classification + continuity to a routing decision.
pub struct RoutingEngine {
    table: RuleTable,
    settings: EngineSettings,
}

impl RoutingEngine {
    /// Create an engine over the standard rule table.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            table: RuleTable::standard(),
            settings,
        }
    }

    /// Create an engine with default settings.
    pub fn with_defaults() -> Self {
        Self::new(EngineSettings::default())
    }

    /// Create an engine over a custom table (tests, experiments).
    pub fn with_table(table: RuleTable, settings: EngineSettings) -> Self {
        Self { table, settings }
    }

    /// Decide the route for a turn.
    ///
    /// Always returns a decision; internal failures degrade to the explicit
    /// error route so the caller can render a graceful fallback.
    pub fn decide(
        &self,
        classification: &Classification,
        continuity: &mut ContinuityContext,
        utterance: &str,
    ) -> RoutingDecision {
        match self.decide_inner(classification, continuity, utterance) {
            Ok(decision) => {
                debug!(decision = %decision.summary(), "route selected");
                decision
            }
            Err(err) => {
                warn!(error = %err, "routing failed; returning error route");
                let decision =
                    RoutingDecision::error_fallback(classification.clone(), err.to_string());
                continuity.record_route(decision.route);
                decision
            }
        }
    }

    fn decide_inner(
        &self,
        classification: &Classification,
        continuity: &mut ContinuityContext,
        utterance: &str,
    ) -> Result<RoutingDecision, RoutingError> {
        if continuity.turn_count == 0 {
            return Err(RoutingError::MalformedContinuity {
                session: continuity.session_id.clone(),
                detail: "decide called before begin_turn".to_string(),
            });
        }
        self.table.validate()?;

        let lower = utterance.to_lowercase();

        let decision = self
            .example_fast_path(classification, continuity)
            .or_else(|| self.trigger_override(classification, continuity, &lower))
            .unwrap_or_else(|| self.table_decision(classification, continuity));

        self.apply_side_effects(&decision, continuity, &lower);
        Ok(decision)
    }

    /// Pre-table fast path: pure example/precedent requests route straight
    /// to knowledge-only with a single collaborator.
    fn example_fast_path(
        &self,
        classification: &Classification,
        continuity: &ContinuityContext,
    ) -> Option<RoutingDecision> {
        if classification.interaction == InteractionType::ExampleRequest
            && classification.is_pure_knowledge_request
        {
            let confidence = self.blend_confidence(FAST_PATH_CONFIDENCE, classification, continuity);
            return Some(
                RoutingDecision::new(
                    Route::KnowledgeOnly,
                    "pure_example_fast_path",
                    "pure example request; answer directly with precedents",
                    confidence,
                )
                .with_collaborators(vec![CollaboratorKind::Knowledge])
                .with_offloading(classification.offloading.clone()),
            );
        }
        None
    }

    /// Pre-table override: detected pedagogical state outranks content.
    fn trigger_override(
        &self,
        classification: &Classification,
        continuity: &ContinuityContext,
        lower: &str,
    ) -> Option<RoutingDecision> {
        let triggers = detect_triggers(classification, lower);
        let strongest = *triggers.first()?;

        let mut tags: Vec<ResponseTrigger> =
            triggers.iter().map(|t| t.response_trigger()).collect();
        tags.dedup();

        let confidence = self.blend_confidence(TRIGGER_CONFIDENCE, classification, continuity);
        Some(
            RoutingDecision::new(
                strongest.route(),
                format!("gamification_override:{strongest}"),
                format!("pedagogical state '{strongest}' overrides content routing"),
                confidence,
            )
            .with_triggers(tags)
            .with_offloading(classification.offloading.clone()),
        )
    }

    /// The generic table walk, with the balanced-guidance default on a miss.
    fn table_decision(
        &self,
        classification: &Classification,
        continuity: &ContinuityContext,
    ) -> RoutingDecision {
        let input = RuleInput {
            classification,
            continuity,
        };

        let decision = match self.table.evaluate(&input) {
            Some(rule) => {
                let route = rule
                    .route
                    .unwrap_or_else(|| suggested_route(classification.interaction));
                let confidence = self.blend_confidence(RULE_CONFIDENCE, classification, continuity);
                let mut d = RoutingDecision::new(route, rule.id, rule.reason, confidence);
                if let Some(ref collaborators) = rule.collaborators {
                    d = d.with_collaborators(collaborators.clone());
                }
                d
            }
            None => {
                let confidence =
                    self.blend_confidence(DEFAULT_CONFIDENCE, classification, continuity);
                RoutingDecision::new(
                    Route::BalancedGuidance,
                    "default_balanced",
                    "no rule matched; balanced default",
                    confidence,
                )
            }
        };

        decision.with_offloading(classification.offloading.clone())
    }

    /// Average the base confidence with whichever signal confidences exist.
    fn blend_confidence(
        &self,
        base: f64,
        classification: &Classification,
        continuity: &ContinuityContext,
    ) -> f64 {
        let mut parts = vec![base];
        if classification.offloading.detected {
            parts.push(classification.offloading.confidence);
        }
        if let Some(ref fact) = continuity.project_type {
            parts.push(fact.confidence);
        }
        if let Some(ref fact) = continuity.learning_phase {
            parts.push(fact.confidence);
        }
        let avg = parts.iter().sum::<f64>() / parts.len() as f64;
        avg.clamp(0.0, 1.0)
    }

    /// Continuity side effects applied on every decision.
    fn apply_side_effects(
        &self,
        decision: &RoutingDecision,
        continuity: &mut ContinuityContext,
        lower: &str,
    ) {
        continuity.record_route(decision.route);

        if let Some((value, confidence)) = detect_project_type(lower) {
            let update = continuity.consider_project_type(
                &value,
                confidence,
                self.settings.sticky_threshold,
                self.settings.sticky_turn_gate,
            );
            debug!(project_type = %value, confidence, ?update, "project-type detection");
        }

        if let Some((value, confidence)) = detect_learning_phase(lower) {
            let update = continuity.consider_learning_phase(
                &value,
                confidence,
                self.settings.sticky_threshold,
                self.settings.sticky_turn_gate,
            );
            debug!(phase = %value, confidence, ?update, "learning-phase detection");
        }
    }
}

impl Default for RoutingEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Detect a project-type mention and its confidence.
///
/// An anchored mention ("i'm designing a library") scores higher than a bare
/// keyword; the sticky-update rule in the continuity context decides whether
/// the detection persists.
fn detect_project_type(lower: &str) -> Option<(String, f64)> {
    let (_, value) = PROJECT_TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))?;

    let anchored = PROJECT_ANCHOR_PHRASES.iter().any(|p| lower.contains(p));
    let confidence = if anchored { 0.9 } else { 0.6 };
    Some(((*value).to_string(), confidence))
}

/// Detect a learning-phase cue and its confidence.
fn detect_learning_phase(lower: &str) -> Option<(String, f64)> {
    let (_, value) = PHASE_CUES.iter().find(|(cue, _)| lower.contains(cue))?;
    Some(((*value).to_string(), 0.7))
}
