//! Prompt builders for each collaborator.
//!
//! Each collaborator wraps one completion call; the prompt carries the
//! turn's utterance, the route's intent, progression guidance, and any
//! response-shaping triggers.

use super::types::{CollaboratorKind, PromptContext};

/// The role statement for a collaborator.
fn role_statement(kind: CollaboratorKind) -> &'static str {
    match kind {
        CollaboratorKind::Knowledge => {
            "You are a design-domain knowledge responder. Give accurate, concise domain \
             knowledge grounded in built precedent. Never answer with a question."
        }
        CollaboratorKind::Question => {
            "You are a socratic question generator. Produce one probing question that moves \
             the student's reasoning forward. Output only the question."
        }
        CollaboratorKind::Challenge => {
            "You are a cognitive-challenge generator. Push back on the student's framing with \
             one pointed counter-consideration they have not addressed."
        }
        CollaboratorKind::Vision => {
            "You are an image analyzer for student sketches and models. Describe what the \
             drawing communicates and what it leaves unresolved."
        }
        CollaboratorKind::Retriever => {
            "You are a knowledge-base retriever. Return the most relevant precedent entries, \
             each with a one-line relevance note and a source citation."
        }
    }
}

/// Build the prompt for one collaborator invocation.
pub fn build_prompt(kind: CollaboratorKind, ctx: &PromptContext) -> String {
    let project_section = ctx
        .project_type
        .as_ref()
        .map(|p| format!("\n## Project\nThe student is working on: {p}\n"))
        .unwrap_or_default();

    let topic_section = ctx
        .topic
        .as_ref()
        .map(|t| format!("Current topic: {t}\n"))
        .unwrap_or_default();

    let guidance_section = ctx
        .guidance
        .as_ref()
        .map(|g| {
            format!(
                "\n## Learning Progression\nPhase: {}\nFocus: {}\n",
                g.phase, g.focus
            )
        })
        .unwrap_or_default();

    let trigger_section = if ctx.triggers.is_empty() {
        String::new()
    } else {
        let tags = ctx
            .triggers
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\n## Response Shaping\nLean into these signals:\n{tags}\n")
    };

    format!(
        r#"# Tutoring Turn

{role}

## Student Message
{utterance}

## Turn Signals
Interaction: {interaction}
Understanding: {understanding}
Engagement: {engagement}
Route: {route}
{topic_section}{project_section}{guidance_section}{trigger_section}
Respond with your contribution only, no preamble.
"#,
        role = role_statement(kind),
        utterance = ctx.utterance,
        interaction = ctx.classification.interaction,
        understanding = ctx.classification.understanding,
        engagement = ctx.classification.engagement,
        route = ctx.route,
        topic_section = topic_section,
        project_section = project_section,
        guidance_section = guidance_section,
        trigger_section = trigger_section,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::collab::PhaseGuidance;
    use crate::routing::{ResponseTrigger, Route};

    fn context() -> PromptContext {
        PromptContext {
            utterance: "What is passive cooling?".to_string(),
            classification: classify("What is passive cooling?", &[]),
            route: Route::KnowledgeOnly,
            triggers: vec![],
            guidance: None,
            project_type: None,
            topic: None,
        }
    }

    #[test]
    fn test_prompt_carries_utterance_and_route() {
        let prompt = build_prompt(CollaboratorKind::Knowledge, &context());
        assert!(prompt.contains("What is passive cooling?"));
        assert!(prompt.contains("Route: knowledge_only"));
        assert!(prompt.contains("knowledge responder"));
    }

    #[test]
    fn test_prompt_includes_project_when_known() {
        let mut ctx = context();
        ctx.project_type = Some("community_center".to_string());
        let prompt = build_prompt(CollaboratorKind::Question, &ctx);
        assert!(prompt.contains("community_center"));
    }

    #[test]
    fn test_prompt_includes_guidance_section() {
        let mut ctx = context();
        ctx.guidance = Some(PhaseGuidance {
            phase: "exploration".to_string(),
            focus: "pursuing open questions".to_string(),
            next_milestone: Some("deep_inquiry".to_string()),
        });
        let prompt = build_prompt(CollaboratorKind::Question, &ctx);
        assert!(prompt.contains("Learning Progression"));
        assert!(prompt.contains("pursuing open questions"));
    }

    #[test]
    fn test_prompt_includes_triggers() {
        let mut ctx = context();
        ctx.triggers = vec![ResponseTrigger::RealityCheck];
        let prompt = build_prompt(CollaboratorKind::Challenge, &ctx);
        assert!(prompt.contains("Response Shaping"));
        assert!(prompt.contains("reality_check"));
    }

    #[test]
    fn test_prompt_omits_empty_sections() {
        let prompt = build_prompt(CollaboratorKind::Knowledge, &context());
        assert!(!prompt.contains("Response Shaping"));
        assert!(!prompt.contains("Learning Progression"));
        assert!(!prompt.contains("## Project"));
    }

    #[test]
    fn test_each_collaborator_gets_distinct_role() {
        let ctx = context();
        let prompts: Vec<String> = CollaboratorKind::all()
            .iter()
            .map(|k| build_prompt(*k, &ctx))
            .collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
