//! Collaborator invocation.
//!
//! The [`Collaborator`] trait is the boundary: each implementation wraps one
//! completion call and returns an [`AgentResult`]. The [`CollaboratorSet`]
//! fans a route's 1–4 collaborators out with bounded concurrency; a failed,
//! timed-out, or empty call is logged and dropped, never aborting the turn.
//! Results are consumed by name downstream, so arrival order is irrelevant.

use super::prompts::build_prompt;
use super::types::{AgentMetadata, AgentResult, CollaboratorKind, PromptContext};
use crate::errors::CollaboratorError;
use anyhow::Context as _;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Default timeout for one collaborator call.
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;

/// Default bound on concurrent collaborator calls per turn.
const DEFAULT_MAX_PARALLEL: usize = 4;

/// Default completion CLI command.
const DEFAULT_COMPLETION_CMD: &str = "claude";

/// One collaborator behind the invocation boundary.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Which collaborator this is.
    fn kind(&self) -> CollaboratorKind;

    /// Invoke the collaborator for one turn.
    async fn invoke(&self, ctx: &PromptContext) -> Result<AgentResult, CollaboratorError>;
}

/// Configuration for completion-backed collaborators.
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Completion CLI command (default: "claude").
    pub completion_cmd: String,
    /// Working directory for the spawned process.
    pub working_dir: Option<PathBuf>,
    /// Timeout per collaborator call.
    pub call_timeout: Duration,
    /// Bound on concurrent calls per turn.
    pub max_parallel: usize,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            completion_cmd: DEFAULT_COMPLETION_CMD.to_string(),
            working_dir: None,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

impl InvokerConfig {
    /// Set the completion command.
    pub fn with_completion_cmd(mut self, cmd: &str) -> Self {
        self.completion_cmd = cmd.to_string();
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the concurrency bound.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }
}

/// A collaborator that forwards its prompt to the completion CLI.
pub struct CompletionCollaborator {
    kind: CollaboratorKind,
    config: InvokerConfig,
}

impl CompletionCollaborator {
    pub fn new(kind: CollaboratorKind, config: InvokerConfig) -> Self {
        Self { kind, config }
    }

    async fn run_completion(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let mut cmd = Command::new(&self.config.completion_cmd);
        cmd.arg("--print");

        if let Some(ref working_dir) = self.config.working_dir {
            cmd.current_dir(working_dir);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(CollaboratorError::SpawnFailed)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .context("Failed to write prompt to stdin")?;
            stdin.shutdown().await.context("Failed to close stdin")?;
        }

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for completion process")?;

        if !output.status.success() {
            return Err(CollaboratorError::NonZeroExit {
                exit_code: output.status.code().unwrap_or(-1),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Collaborator for CompletionCollaborator {
    fn kind(&self) -> CollaboratorKind {
        self.kind
    }

    async fn invoke(&self, ctx: &PromptContext) -> Result<AgentResult, CollaboratorError> {
        let start = Instant::now();
        let prompt = build_prompt(self.kind, ctx);
        let text = self.run_completion(&prompt).await?;
        let text = text.trim().to_string();

        if text.is_empty() {
            return Err(CollaboratorError::EmptyResult {
                collaborator: self.kind.to_string(),
            });
        }

        let metadata = AgentMetadata {
            citations: extract_citations(&text),
            embedded_question: extract_embedded_question(&text),
        };

        Ok(AgentResult::new(self.kind, text)
            .with_metadata(metadata)
            .with_duration_ms(start.elapsed().as_millis() as u64))
    }
}

/// The set of registered collaborators for a session's pipeline.
pub struct CollaboratorSet {
    collaborators: HashMap<CollaboratorKind, Arc<dyn Collaborator>>,
    call_timeout: Duration,
    semaphore: Arc<Semaphore>,
}

impl CollaboratorSet {
    /// Create an empty set with the given limits.
    pub fn new(call_timeout: Duration, max_parallel: usize) -> Self {
        Self {
            collaborators: HashMap::new(),
            call_timeout,
            semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
        }
    }

    /// A set of completion-backed collaborators for every kind.
    pub fn completion_backed(config: InvokerConfig) -> Self {
        let mut set = Self::new(config.call_timeout, config.max_parallel);
        for kind in CollaboratorKind::all() {
            set.register(Arc::new(CompletionCollaborator::new(kind, config.clone())));
        }
        set
    }

    /// Register a collaborator, replacing any existing one of its kind.
    pub fn register(&mut self, collaborator: Arc<dyn Collaborator>) {
        self.collaborators
            .insert(collaborator.kind(), collaborator);
    }

    /// Number of registered collaborators.
    pub fn len(&self) -> usize {
        self.collaborators.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.collaborators.is_empty()
    }

    /// Invoke the requested collaborators with bounded concurrency.
    ///
    /// Missing registrations, failures, timeouts, and empty results are all
    /// reported as debug/warn logs and dropped from the output; the turn
    /// continues with whatever contributions arrived.
    pub async fn invoke_all(
        &self,
        kinds: &[CollaboratorKind],
        ctx: &PromptContext,
    ) -> Vec<AgentResult> {
        let futures: Vec<_> = kinds
            .iter()
            .filter_map(|kind| {
                let Some(collaborator) = self.collaborators.get(kind) else {
                    debug!(collaborator = %kind, "not registered; skipping");
                    return None;
                };
                let collaborator = Arc::clone(collaborator);
                let semaphore = Arc::clone(&self.semaphore);
                let timeout = self.call_timeout;
                let kind = *kind;
                Some(async move {
                    // Closed-semaphore acquire cannot happen: the semaphore
                    // lives as long as the set.
                    let _permit = semaphore.acquire().await.ok()?;
                    match tokio::time::timeout(timeout, collaborator.invoke(ctx)).await {
                        Ok(Ok(result)) if result.has_contribution() => Some(result),
                        Ok(Ok(_)) => {
                            debug!(collaborator = %kind, "empty contribution dropped");
                            None
                        }
                        Ok(Err(err)) => {
                            warn!(collaborator = %kind, error = %err, "collaborator failed");
                            None
                        }
                        Err(_) => {
                            let err = CollaboratorError::Timeout {
                                collaborator: kind.to_string(),
                                seconds: timeout.as_secs(),
                            };
                            warn!(collaborator = %kind, error = %err, "collaborator timed out");
                            None
                        }
                    }
                })
            })
            .collect();

        join_all(futures).await.into_iter().flatten().collect()
    }
}

/// Pull source citations out of retriever-style output.
///
/// Recognizes `Source: ...` lines.
fn extract_citations(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches("- ");
            line.strip_prefix("Source:").map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Pull the trailing question out of a response, when one exists.
fn extract_embedded_question(text: &str) -> Option<String> {
    let trimmed = text.trim_end();
    if !trimmed.ends_with('?') {
        return None;
    }
    // The question starts after the previous sentence terminator.
    let start = trimmed
        .rfind(['.', '!', '\n'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let question = trimmed[start..].trim();
    (!question.is_empty()).then(|| question.to_string())
}
