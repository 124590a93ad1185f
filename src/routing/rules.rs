//! The declarative routing rule table.
//!
//! Rules are records: a unique numeric priority, a list of boolean
//! conditions over the enriched classification/continuity record, a target
//! route (or `None`, meaning "delegate to the suggestion mapping"), and an
//! optional collaborator override. The engine evaluates rules in ascending
//! priority order; the first rule whose every condition holds wins. A miss
//! falls through to the balanced-guidance default.
//!
//! Sharp exceptions (the pure-example fast path and the gamification-trigger
//! override) live in the engine as explicit pre-table checks rather than in
//! the condition language, which keeps this table simple.

use crate::classify::{
    Classification, ConfidenceLevel, EngagementLevel, InteractionType, UnderstandingLevel,
};
use crate::collab::CollaboratorKind;
use crate::continuity::ContinuityContext;
use crate::errors::RoutingError;
use crate::routing::Route;

/// The enriched record rules are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub classification: &'a Classification,
    pub continuity: &'a ContinuityContext,
}

impl RuleInput<'_> {
    /// Confidence of the sticky project-type fact, 0.0 when unset.
    pub fn context_confidence(&self) -> f64 {
        self.continuity
            .project_type
            .as_ref()
            .map(|f| f.confidence)
            .unwrap_or(0.0)
    }
}

/// A boolean condition over the enriched record.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    InteractionIs(InteractionType),
    UnderstandingIs(UnderstandingLevel),
    ConfidenceIs(ConfidenceLevel),
    EngagementIs(EngagementLevel),
    OffloadingDetected(bool),
    ShowsConfusion(bool),
    IsContinuing(bool),
    /// Turn count is at most the given value.
    TurnCountAtMost(u32),
    /// Sticky project-type confidence is strictly above the given value.
    ContextConfidenceAbove(f64),
    /// Sticky project-type confidence is strictly below the given value.
    ContextConfidenceBelow(f64),
}

impl Condition {
    /// Evaluate this condition against the record.
    pub fn holds(&self, input: &RuleInput<'_>) -> bool {
        let c = input.classification;
        match self {
            Self::InteractionIs(t) => c.interaction == *t,
            Self::UnderstandingIs(l) => c.understanding == *l,
            Self::ConfidenceIs(l) => c.confidence == *l,
            Self::EngagementIs(l) => c.engagement == *l,
            Self::OffloadingDetected(v) => c.offloading.detected == *v,
            Self::ShowsConfusion(v) => c.shows_confusion == *v,
            Self::IsContinuing(v) => input.continuity.is_continuing == *v,
            Self::TurnCountAtMost(n) => input.continuity.turn_count <= *n,
            Self::ContextConfidenceAbove(v) => input.context_confidence() > *v,
            Self::ContextConfidenceBelow(v) => input.context_confidence() < *v,
        }
    }
}

/// One named rule in the table.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    /// Stable identifier, reported in the decision.
    pub id: &'static str,
    /// Unique evaluation priority; lower fires first.
    pub priority: u16,
    /// Every condition must hold for the rule to fire.
    pub conditions: Vec<Condition>,
    /// Target route; `None` delegates to [`suggested_route`].
    pub route: Option<Route>,
    /// Collaborator override; `None` uses the route's default set.
    pub collaborators: Option<Vec<CollaboratorKind>>,
    /// Human-readable reason reported in the decision.
    pub reason: &'static str,
}

impl RoutingRule {
    /// Check whether every condition holds.
    pub fn matches(&self, input: &RuleInput<'_>) -> bool {
        self.conditions.iter().all(|c| c.holds(input))
    }
}

/// Content-based route suggestion for delegating rules.
///
/// Used when a rule names no route of its own: the interaction type alone
/// picks the strategy.
pub fn suggested_route(interaction: InteractionType) -> Route {
    match interaction {
        InteractionType::DesignGuidance => Route::BalancedGuidance,
        InteractionType::ImplementationRequest => Route::KnowledgeWithChallenge,
        InteractionType::ClarificationRequest => Route::SocraticClarification,
        InteractionType::ImprovementSeeking => Route::KnowledgeWithChallenge,
        InteractionType::CreativeExploration => Route::SocraticExploration,
        InteractionType::KnowledgeRequest | InteractionType::TechnicalQuestion => {
            Route::KnowledgeOnly
        }
        _ => Route::BalancedGuidance,
    }
}

/// The priority-sorted rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<RoutingRule>,
}

impl RuleTable {
    /// Build a table from rules, sorting by priority.
    pub fn new(mut rules: Vec<RoutingRule>) -> Self {
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    /// The standard table.
    pub fn standard() -> Self {
        use Condition::*;
        Self::new(vec![
            RoutingRule {
                id: "offloading_intervention",
                priority: 10,
                conditions: vec![OffloadingDetected(true)],
                route: Some(Route::CognitiveIntervention),
                collaborators: None,
                reason: "cognitive offloading detected; intervene before answering",
            },
            RoutingRule {
                id: "overconfidence_challenge",
                priority: 20,
                conditions: vec![ConfidenceIs(ConfidenceLevel::Overconfident)],
                route: Some(Route::CognitiveChallenge),
                collaborators: None,
                reason: "unexamined certainty; challenge the claim",
            },
            RoutingRule {
                id: "topic_transition",
                priority: 30,
                conditions: vec![InteractionIs(InteractionType::TopicTransition)],
                route: Some(Route::TopicTransition),
                collaborators: None,
                reason: "explicit subject change",
            },
            RoutingRule {
                id: "session_opening",
                priority: 40,
                conditions: vec![TurnCountAtMost(1)],
                route: Some(Route::ProgressiveOpening),
                collaborators: None,
                reason: "first turn of the session",
            },
            RoutingRule {
                id: "confusion_clarification",
                priority: 50,
                conditions: vec![InteractionIs(InteractionType::ConfusionExpression)],
                route: Some(Route::SocraticClarification),
                collaborators: None,
                reason: "explicit confusion; untangle before adding content",
            },
            RoutingRule {
                id: "struggling_scaffold",
                priority: 60,
                conditions: vec![
                    ShowsConfusion(true),
                    UnderstandingIs(UnderstandingLevel::Low),
                ],
                route: Some(Route::SupportiveScaffolding),
                collaborators: None,
                reason: "struggling signals; scaffold supportively",
            },
            RoutingRule {
                id: "foundations_first",
                priority: 70,
                conditions: vec![UnderstandingIs(UnderstandingLevel::Low), IsContinuing(true)],
                route: Some(Route::FoundationalBuilding),
                collaborators: None,
                reason: "low understanding mid-conversation; build fundamentals",
            },
            RoutingRule {
                id: "technical_direct",
                priority: 80,
                conditions: vec![InteractionIs(InteractionType::TechnicalQuestion)],
                route: Some(Route::KnowledgeOnly),
                collaborators: None,
                reason: "technical question; answer directly",
            },
            RoutingRule {
                id: "knowledge_stretch",
                priority: 90,
                conditions: vec![
                    InteractionIs(InteractionType::KnowledgeRequest),
                    UnderstandingIs(UnderstandingLevel::High),
                ],
                route: Some(Route::KnowledgeWithChallenge),
                collaborators: None,
                reason: "knowledge request from a strong student; add a stretch",
            },
            RoutingRule {
                id: "knowledge_direct",
                priority: 100,
                conditions: vec![InteractionIs(InteractionType::KnowledgeRequest)],
                route: Some(Route::KnowledgeOnly),
                collaborators: None,
                reason: "plain knowledge request",
            },
            RoutingRule {
                id: "evaluation_comprehensive",
                priority: 110,
                conditions: vec![InteractionIs(InteractionType::EvaluationRequest)],
                route: Some(Route::MultiAgentComprehensive),
                collaborators: None,
                reason: "evaluation request; bring every perspective",
            },
            RoutingRule {
                id: "feedback_grounding",
                priority: 120,
                conditions: vec![
                    InteractionIs(InteractionType::FeedbackRequest),
                    ContextConfidenceBelow(0.3),
                ],
                route: Some(Route::SocraticClarification),
                collaborators: None,
                reason: "feedback requested before the project is understood; clarify first",
            },
            RoutingRule {
                id: "feedback_comprehensive",
                priority: 125,
                conditions: vec![
                    InteractionIs(InteractionType::FeedbackRequest),
                    ContextConfidenceAbove(0.6),
                ],
                route: Some(Route::MultiAgentComprehensive),
                collaborators: None,
                reason: "feedback on an established project; full synthesis",
            },
            RoutingRule {
                id: "feedback_balanced",
                priority: 130,
                conditions: vec![InteractionIs(InteractionType::FeedbackRequest)],
                route: Some(Route::BalancedGuidance),
                collaborators: None,
                reason: "feedback request with partial context",
            },
            RoutingRule {
                id: "exploration_socratic",
                priority: 140,
                conditions: vec![InteractionIs(InteractionType::CreativeExploration)],
                route: Some(Route::SocraticExploration),
                collaborators: None,
                reason: "open exploration; question rather than answer",
            },
            RoutingRule {
                id: "guidance_suggested",
                priority: 150,
                conditions: vec![InteractionIs(InteractionType::DesignGuidance)],
                route: None,
                collaborators: None,
                reason: "guidance request; delegate to the suggestion mapping",
            },
            RoutingRule {
                id: "implementation_suggested",
                priority: 155,
                conditions: vec![InteractionIs(InteractionType::ImplementationRequest)],
                route: None,
                collaborators: None,
                reason: "implementation request; delegate to the suggestion mapping",
            },
            RoutingRule {
                id: "improvement_stretch",
                priority: 160,
                conditions: vec![InteractionIs(InteractionType::ImprovementSeeking)],
                route: Some(Route::KnowledgeWithChallenge),
                collaborators: None,
                reason: "improvement seeking; pair knowledge with a challenge",
            },
            RoutingRule {
                id: "engaged_socratic",
                priority: 170,
                conditions: vec![EngagementIs(EngagementLevel::High)],
                route: Some(Route::SocraticExploration),
                collaborators: None,
                reason: "high engagement; keep the student reasoning",
            },
        ])
    }

    /// Evaluate the table; first match in priority order wins.
    pub fn evaluate(&self, input: &RuleInput<'_>) -> Option<&RoutingRule> {
        self.rules.iter().find(|r| r.matches(input))
    }

    /// Validate structural invariants: non-empty, unique priorities.
    pub fn validate(&self) -> Result<(), RoutingError> {
        if self.rules.is_empty() {
            return Err(RoutingError::EmptyRuleTable);
        }
        for pair in self.rules.windows(2) {
            if pair[0].priority == pair[1].priority {
                return Err(RoutingError::DuplicatePriority {
                    priority: pair[0].priority,
                    first: pair[0].id.to_string(),
                    second: pair[1].id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// The rules, in evaluation order.
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}
