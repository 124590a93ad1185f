//! The per-turn pipeline.
//!
//! `process_turn` runs one utterance through the whole core: classify →
//! route (reading and updating continuity) → invoke collaborators →
//! synthesize → gate, with the progression state machine observing the same
//! turn. State mutation is sequential within the turn; collaborator calls
//! fan out with bounded concurrency. Mutations applied before a
//! cancellation are not rolled back — the model is at-least-once, not
//! exactly-once, across a turn.

use crate::classify::{classify, Classification};
use crate::collab::{AgentResult, CollaboratorKind, CollaboratorSet, PromptContext};
use crate::config::AtelierConfig;
use crate::progression::{LearningPhase, MilestoneType, ProgressionUpdate};
use crate::routing::{RoutingDecision, RoutingEngine};
use crate::session::SessionStore;
use crate::synthesis::{SynthesisOutput, Synthesizer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Conversation topics recognized for continuity tracking.
const TOPIC_KEYWORDS: &[&str] = &[
    "daylighting",
    "daylight",
    "circulation",
    "massing",
    "structure",
    "facade",
    "program",
    "site",
    "courtyard",
    "section",
    "entrance",
    "materials",
    "sustainability",
    "threshold",
];

/// Progression snapshot returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseInfo {
    /// Current learning phase.
    pub phase: LearningPhase,
    /// Milestone the student is working toward.
    pub milestone: MilestoneType,
    /// Phase-local progress, 0–100.
    pub milestone_progress: u8,
}

/// Per-collaborator contribution metadata for a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionMeta {
    /// The collaborator that was asked.
    pub collaborator: CollaboratorKind,
    /// Whether it contributed text.
    pub contributed: bool,
    /// Call duration when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Everything the caller gets back for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// The assembled, gated reply.
    pub reply: String,
    /// Routing path: the rule that fired and the route it chose.
    pub routing_path: String,
    /// The turn's classification.
    pub classification: Classification,
    /// The full routing decision.
    pub decision: RoutingDecision,
    /// Progression snapshot after the turn.
    pub phase_info: PhaseInfo,
    /// What the progression machine changed this turn.
    pub progression: ProgressionUpdate,
    /// Per-collaborator contribution record.
    pub contributions: Vec<ContributionMeta>,
    /// Whether near-duplicate outputs were dropped during synthesis.
    pub deduplicated: bool,
}

/// The assembled decision core.
pub struct TurnPipeline {
    store: Arc<dyn SessionStore>,
    collaborators: CollaboratorSet,
    engine: RoutingEngine,
    synthesizer: Synthesizer,
}

impl TurnPipeline {
    /// Assemble a pipeline from parts.
    pub fn new(
        store: Arc<dyn SessionStore>,
        collaborators: CollaboratorSet,
        engine: RoutingEngine,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            store,
            collaborators,
            engine,
            synthesizer,
        }
    }

    /// Assemble a pipeline from configuration.
    ///
    /// `use_stubs` (from config) selects deterministic stub collaborators
    /// instead of completion-backed ones.
    pub fn from_config(config: &AtelierConfig, store: Arc<dyn SessionStore>) -> Self {
        let invoker = config.invoker_config();
        let collaborators = if config.completion.use_stubs {
            let mut set = CollaboratorSet::new(invoker.call_timeout, invoker.max_parallel);
            crate::collab::register_stubs(&mut set);
            set
        } else {
            CollaboratorSet::completion_backed(invoker)
        };

        Self::new(
            store,
            collaborators,
            RoutingEngine::new(config.engine_settings()),
            config.synthesizer(),
        )
    }

    /// Process one student utterance for a session.
    ///
    /// Never surfaces a hard error to the caller: classification is total,
    /// routing degrades to the error route, collaborator failures become
    /// missing contributions, and synthesis always produces a reply.
    pub async fn process_turn(&self, session_id: &str, utterance: &str) -> TurnOutcome {
        let mut state = self.store.load(session_id).await;

        let classification = classify(utterance, &state.history);
        debug!(session = session_id, classification = %classification.summary(), "turn classified");

        let topic = extract_topic(&utterance.to_lowercase());
        state.continuity.begin_turn(topic.as_deref());

        let decision = self
            .engine
            .decide(&classification, &mut state.continuity, utterance);

        // The progression machine observes the same turn independently of
        // the chosen route.
        let progression = state.progression.observe(utterance, &classification);
        let guidance = state.progression.guidance();

        let ctx = PromptContext {
            utterance: utterance.to_string(),
            classification: classification.clone(),
            route: decision.route,
            triggers: decision.triggers.clone(),
            guidance: Some(guidance),
            project_type: state.continuity.project_type_value().map(String::from),
            topic: state.continuity.current_topic.clone(),
        };

        let results = self
            .collaborators
            .invoke_all(&decision.collaborators, &ctx)
            .await;
        let contributions = contribution_meta(&decision.collaborators, &results);

        let SynthesisOutput {
            reply,
            deduplicated,
            ..
        } = self.synthesizer.synthesize(&ctx, &results);

        let phase_info = PhaseInfo {
            phase: state.progression.phase(),
            milestone: state.progression.current_milestone().milestone_type,
            milestone_progress: state.progression.progress_percent(),
        };

        state.push_history(utterance);
        self.store.save(session_id, state).await;

        info!(
            session = session_id,
            route = %decision.route,
            rule = %decision.rule_id,
            phase = %phase_info.phase,
            "turn processed"
        );

        TurnOutcome {
            routing_path: format!("{} -> {}", decision.rule_id, decision.route),
            reply,
            classification,
            decision,
            phase_info,
            progression,
            contributions,
            deduplicated,
        }
    }
}

/// Detect the turn's topic from recognized keywords.
fn extract_topic(lower: &str) -> Option<String> {
    TOPIC_KEYWORDS
        .iter()
        .find(|k| lower.contains(*k))
        .map(|k| (*k).to_string())
}

/// Build the per-collaborator contribution record.
fn contribution_meta(
    requested: &[CollaboratorKind],
    results: &[AgentResult],
) -> Vec<ContributionMeta> {
    requested
        .iter()
        .map(|kind| {
            let result = results.iter().find(|r| r.collaborator == *kind);
            ContributionMeta {
                collaborator: *kind,
                contributed: result.is_some_and(|r| r.has_contribution()),
                duration_ms: result.and_then(|r| r.duration_ms),
            }
        })
        .collect()
}
