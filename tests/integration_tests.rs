//! Full-pipeline integration tests.
//!
//! Every test runs the real pipeline — classifier, routing engine,
//! progression machine, synthesizer, quality gate — over stub or canned
//! collaborators, so the scenarios here exercise the same path a live chat
//! would, minus the completion service.

use async_trait::async_trait;
use atelier::classify::InteractionType;
use atelier::collab::{
    register_stubs, AgentResult, Collaborator, CollaboratorKind, CollaboratorSet, PromptContext,
};
use atelier::config::AtelierConfig;
use atelier::errors::CollaboratorError;
use atelier::pipeline::TurnPipeline;
use atelier::progression::LearningPhase;
use atelier::routing::{Route, RoutingEngine};
use atelier::session::{MemorySessionStore, SessionStore};
use atelier::synthesis::Synthesizer;
use std::sync::Arc;
use std::time::Duration;

fn stub_pipeline() -> (TurnPipeline, Arc<MemorySessionStore>) {
    let mut config = AtelierConfig::default();
    config.completion.use_stubs = true;
    let store = Arc::new(MemorySessionStore::new());
    (TurnPipeline::from_config(&config, store.clone()), store)
}

// =========================================
// Spec scenarios
// =========================================

#[tokio::test]
async fn test_overconfident_statement_routes_to_cognitive_challenge() {
    let (pipeline, _) = stub_pipeline();
    // Burn the opening turn so content routing applies.
    pipeline.process_turn("s-1", "hello, starting my studio project").await;

    let outcome = pipeline
        .process_turn("s-1", "obviously this is the best solution")
        .await;

    assert_eq!(
        outcome.classification.interaction,
        InteractionType::OverconfidentStatement
    );
    assert_eq!(outcome.decision.route, Route::CognitiveChallenge);
    assert!(!outcome.reply.is_empty());
}

#[tokio::test]
async fn test_pure_example_request_fast_path_on_turn_one() {
    let (pipeline, _) = stub_pipeline();
    let outcome = pipeline
        .process_turn("s-1", "Can you show me examples of adaptive reuse projects?")
        .await;

    assert_eq!(outcome.decision.route, Route::KnowledgeOnly);
    assert_eq!(outcome.decision.rule_id, "pure_example_fast_path");
    assert_eq!(
        outcome.decision.collaborators,
        vec![CollaboratorKind::Knowledge]
    );
    assert_eq!(outcome.contributions.len(), 1);
    assert!(outcome.contributions[0].contributed);
}

#[tokio::test]
async fn test_project_type_sticky_against_later_noise() {
    let (pipeline, store) = stub_pipeline();
    pipeline
        .process_turn("s-1", "i'm designing a community center for my studio")
        .await;

    let state = store.load("s-1").await;
    let established = state.continuity.project_type.clone().unwrap();
    assert_eq!(established.value, "community_center");
    assert!(established.confidence >= 0.9);

    for filler in [
        "the plan needs another pass",
        "the entry still feels tight",
        "i reworked the lobby yesterday",
    ] {
        pipeline.process_turn("s-1", filler).await;
    }

    // Turn 5 mentions an unrelated building type, weakly.
    pipeline
        .process_turn("s-1", "there is a museum nearby the site")
        .await;

    let state = store.load("s-1").await;
    let fact = state.continuity.project_type.unwrap();
    assert_eq!(fact.value, "community_center");
    assert_eq!(fact.confidence, established.confidence);
}

#[tokio::test]
async fn test_unmet_milestone_criteria_hold_phase() {
    let (pipeline, store) = stub_pipeline();
    // One substantive turn completes phase entry.
    pipeline
        .process_turn("s-1", "i want to understand how the site slope shapes the plan")
        .await;

    // Three low-effort turns never meet knowledge-acquisition criteria.
    for _ in 0..3 {
        pipeline.process_turn("s-1", "ok").await;
    }

    let state = store.load("s-1").await;
    assert_eq!(state.progression.phase(), LearningPhase::Discovery);
    assert_eq!(
        state.progression.current_milestone().milestone_type.as_str(),
        "knowledge_acquisition"
    );
}

// =========================================
// Testable properties
// =========================================

#[tokio::test]
async fn test_classifier_total_and_offloading_gated() {
    let (pipeline, _) = stub_pipeline();
    let legitimate = [
        "what is a load path?",
        "show me examples of pavilions",
        "what does the building code say about egress?",
        "any feedback on my section?",
        "can you clarify that last point?",
    ];
    for (i, utterance) in legitimate.iter().enumerate() {
        let outcome = pipeline
            .process_turn(&format!("s-gate-{i}"), utterance)
            .await;
        assert!(
            !outcome.classification.offloading.detected,
            "offloading fired for legitimate request: {utterance}"
        );
    }
}

#[tokio::test]
async fn test_decision_confidence_always_in_unit_interval() {
    let (pipeline, _) = stub_pipeline();
    let utterances = [
        "obviously perfect",
        "just tell me the answer",
        "what is massing?",
        "ok",
        "i'm confused about the grid",
        "",
        "???",
    ];
    for (i, utterance) in utterances.iter().enumerate() {
        let outcome = pipeline.process_turn(&format!("s-conf-{i}"), utterance).await;
        assert!(
            (0.0..=1.0).contains(&outcome.decision.confidence),
            "confidence out of range for: {utterance:?}"
        );
    }
}

#[tokio::test]
async fn test_question_routes_end_with_question_mark() {
    let (pipeline, _) = stub_pipeline();
    let utterances = [
        "i'm confused about the structural grid",
        "i wonder how the light shifts through the day",
        "any feedback on my massing?",
        "hello, starting out on a library project",
    ];
    for (i, utterance) in utterances.iter().enumerate() {
        let outcome = pipeline.process_turn(&format!("s-q-{i}"), utterance).await;
        if outcome.decision.route.requires_trailing_question() {
            assert!(
                outcome.reply.trim_end().ends_with('?'),
                "route {} reply missing trailing question: {}",
                outcome.decision.route,
                outcome.reply
            );
        }
    }
}

#[tokio::test]
async fn test_phase_order_monotone_over_long_session() {
    let (pipeline, store) = stub_pipeline();
    let script = [
        "the circulation spine organizes the program zones",
        "the section shows how daylighting reaches the lower floor",
        "i'm ready, what's next?",
        "would the court still work if the entry moved north?",
        "it connects because the threshold depends on the slope, which means the grid holds",
        "i'm ready, let's move on",
        "the relationship works because both wings share the envelope",
        "i'll use this in my project and apply it to the facade",
        "looking back i realized the site mattered most",
    ];

    let mut last = LearningPhase::Discovery;
    let mut milestone_count = 1;
    for utterance in script {
        let outcome = pipeline.process_turn("s-long", utterance).await;
        assert!(last <= outcome.phase_info.phase, "phase regressed");
        last = outcome.phase_info.phase;

        let state = store.load("s-long").await;
        assert!(
            state.progression.milestones().len() >= milestone_count,
            "milestone list shrank"
        );
        milestone_count = state.progression.milestones().len();
    }
}

// =========================================
// Failure tolerance
// =========================================

struct FailingCollaborator(CollaboratorKind);

#[async_trait]
impl Collaborator for FailingCollaborator {
    fn kind(&self) -> CollaboratorKind {
        self.0
    }

    async fn invoke(&self, _ctx: &PromptContext) -> Result<AgentResult, CollaboratorError> {
        Err(CollaboratorError::EmptyResult {
            collaborator: self.0.to_string(),
        })
    }
}

fn failing_pipeline() -> TurnPipeline {
    let mut set = CollaboratorSet::new(Duration::from_secs(2), 4);
    for kind in CollaboratorKind::all() {
        set.register(Arc::new(FailingCollaborator(kind)));
    }
    TurnPipeline::new(
        Arc::new(MemorySessionStore::new()),
        set,
        RoutingEngine::with_defaults(),
        Synthesizer::default(),
    )
}

#[tokio::test]
async fn test_all_collaborators_failing_still_replies() {
    let pipeline = failing_pipeline();
    let outcome = pipeline
        .process_turn("s-fail", "any feedback on my massing model?")
        .await;

    assert!(!outcome.reply.is_empty());
    for meta in &outcome.contributions {
        assert!(!meta.contributed);
    }
}

struct EchoCollaborator {
    kind: CollaboratorKind,
    text: String,
}

#[async_trait]
impl Collaborator for EchoCollaborator {
    fn kind(&self) -> CollaboratorKind {
        self.kind
    }

    async fn invoke(&self, _ctx: &PromptContext) -> Result<AgentResult, CollaboratorError> {
        Ok(AgentResult::new(self.kind, self.text.clone()))
    }
}

#[tokio::test]
async fn test_near_duplicate_collaborators_deduplicated_end_to_end() {
    let mut set = CollaboratorSet::new(Duration::from_secs(2), 4);
    set.register(Arc::new(EchoCollaborator {
        kind: CollaboratorKind::Knowledge,
        text: "Adaptive reuse keeps embodied carbon in place across the structure.".to_string(),
    }));
    set.register(Arc::new(EchoCollaborator {
        kind: CollaboratorKind::Retriever,
        text: "Adaptive reuse keeps embodied carbon in place across the whole structure."
            .to_string(),
    }));
    set.register(Arc::new(EchoCollaborator {
        kind: CollaboratorKind::Question,
        text: "What would the existing building want to become?".to_string(),
    }));
    set.register(Arc::new(EchoCollaborator {
        kind: CollaboratorKind::Challenge,
        text: "The existing grid may fight your program.".to_string(),
    }));

    let pipeline = TurnPipeline::new(
        Arc::new(MemorySessionStore::new()),
        set,
        RoutingEngine::with_defaults(),
        Synthesizer::default(),
    );

    // Burn the opening turn, then ask for an evaluation to get the
    // comprehensive route with all four collaborators.
    pipeline.process_turn("s-dup", "hello, starting out").await;
    let outcome = pipeline
        .process_turn("s-dup", "can you evaluate my scheme so far")
        .await;

    assert_eq!(outcome.decision.route, Route::MultiAgentComprehensive);
    assert!(outcome.deduplicated);
    // The near-verbatim retriever line appears only once.
    assert_eq!(outcome.reply.matches("embodied carbon").count(), 1);
}

// =========================================
// Session isolation and outcome shape
// =========================================

#[tokio::test]
async fn test_sessions_do_not_interfere() {
    let (pipeline, store) = stub_pipeline();
    pipeline
        .process_turn("s-a", "i'm designing a community center")
        .await;
    pipeline.process_turn("s-b", "i'm designing a library").await;

    let a = store.load("s-a").await;
    let b = store.load("s-b").await;
    assert_eq!(a.continuity.project_type_value(), Some("community_center"));
    assert_eq!(b.continuity.project_type_value(), Some("library"));
    assert_eq!(a.continuity.turn_count, 1);
    assert_eq!(b.continuity.turn_count, 1);
}

#[tokio::test]
async fn test_outcome_carries_routing_path_and_phase_info() {
    let (pipeline, _) = stub_pipeline();
    let outcome = pipeline.process_turn("s-shape", "what is a parti?").await;

    assert!(outcome.routing_path.contains("->"));
    assert_eq!(outcome.phase_info.phase, LearningPhase::Discovery);
    assert!(outcome.phase_info.milestone_progress <= 100);

    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json.get("reply").is_some());
    assert!(json.get("classification").is_some());
    assert!(json.get("phase_info").is_some());
}

#[tokio::test]
async fn test_stub_set_registers_all_collaborators() {
    let mut set = CollaboratorSet::new(Duration::from_secs(2), 4);
    register_stubs(&mut set);
    assert_eq!(set.len(), CollaboratorKind::all().len());
}
