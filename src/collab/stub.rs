//! Deterministic stub collaborators for offline runs and tests.
//!
//! Each stub returns canned text keyed on its kind, with light variation
//! from the turn's topic so transcripts read sensibly. No network, no
//! subprocess, no randomness.

use super::invoker::Collaborator;
use super::types::{AgentMetadata, AgentResult, CollaboratorKind, PromptContext};
use crate::errors::CollaboratorError;
use async_trait::async_trait;

/// A canned collaborator.
pub struct StubCollaborator {
    kind: CollaboratorKind,
}

impl StubCollaborator {
    pub fn new(kind: CollaboratorKind) -> Self {
        Self { kind }
    }

    fn subject(ctx: &PromptContext) -> String {
        ctx.topic
            .clone()
            .or_else(|| ctx.project_type.clone())
            .unwrap_or_else(|| "your design".to_string())
    }
}

#[async_trait]
impl Collaborator for StubCollaborator {
    fn kind(&self) -> CollaboratorKind {
        self.kind
    }

    async fn invoke(&self, ctx: &PromptContext) -> Result<AgentResult, CollaboratorError> {
        let subject = Self::subject(ctx);
        let (text, metadata) = match self.kind {
            CollaboratorKind::Knowledge => (
                format!(
                    "A useful way to think about {subject} is through precedent: successful \
                     projects resolve program, structure, and light as one move rather than \
                     three separate problems."
                ),
                AgentMetadata::default(),
            ),
            CollaboratorKind::Question => (
                format!("What would change about {subject} if you designed it from the section first?"),
                AgentMetadata {
                    embedded_question: Some(format!(
                        "What would change about {subject} if you designed it from the section first?"
                    )),
                    ..AgentMetadata::default()
                },
            ),
            CollaboratorKind::Challenge => (
                format!(
                    "Consider the counter-case: if the assumption behind {subject} fails under a \
                     different site condition, what breaks first?"
                ),
                AgentMetadata::default(),
            ),
            CollaboratorKind::Vision => (
                format!(
                    "The drawing communicates the overall massing of {subject} clearly, but the \
                     ground-floor threshold remains unresolved."
                ),
                AgentMetadata::default(),
            ),
            CollaboratorKind::Retriever => (
                format!(
                    "Two precedents relate to {subject}.\nSource: Tate Modern, Herzog & de Meuron\nSource: Kolumba Museum, Peter Zumthor"
                ),
                AgentMetadata {
                    citations: vec![
                        "Tate Modern, Herzog & de Meuron".to_string(),
                        "Kolumba Museum, Peter Zumthor".to_string(),
                    ],
                    ..AgentMetadata::default()
                },
            ),
        };

        Ok(AgentResult::new(self.kind, text).with_metadata(metadata))
    }
}

/// Register a full stub set on a [`super::invoker::CollaboratorSet`].
pub fn register_stubs(set: &mut super::invoker::CollaboratorSet) {
    for kind in CollaboratorKind::all() {
        set.register(std::sync::Arc::new(StubCollaborator::new(kind)));
    }
}
