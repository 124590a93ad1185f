//! Typed error hierarchy for the Atelier decision core.
//!
//! Three top-level enums cover the three subsystems:
//! - `RoutingError` — routing-engine failures (always recovered into an
//!   explicit error route before they reach the caller)
//! - `ProgressionError` — milestone/phase lookup failures (always recovered
//!   into a conservative no-advance)
//! - `CollaboratorError` — invocation failures (recovered by the synthesizer
//!   as a missing contribution)

use thiserror::Error;

/// Errors from the routing subsystem.
///
/// These never escape [`crate::routing::RoutingEngine::decide`]; they are
/// converted into an error-route decision carrying the original
/// classification.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Malformed continuity record for session {session}: {detail}")]
    MalformedContinuity { session: String, detail: String },

    #[error("Rule table is empty")]
    EmptyRuleTable,

    #[error("Duplicate rule priority {priority} between '{first}' and '{second}'")]
    DuplicatePriority {
        priority: u16,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the progression state machine.
///
/// Lookup failures default to "incomplete, no advance" at the machine
/// boundary; the error is logged for diagnostics only.
#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("No milestone sequence defined for phase {phase}")]
    MissingPhaseStructure { phase: String },

    #[error("Milestone type {milestone} is not part of phase {phase}")]
    MilestoneNotInPhase { milestone: String, phase: String },

    #[error("No completion criteria registered for milestone type {milestone}")]
    MissingCriteria { milestone: String },
}

/// Errors from collaborator invocation.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Failed to spawn completion process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Completion process exited with non-zero code {exit_code}")]
    NonZeroExit { exit_code: i32 },

    #[error("Collaborator {collaborator} timed out after {seconds}s")]
    Timeout { collaborator: String, seconds: u64 },

    #[error("Collaborator {collaborator} returned an empty result")]
    EmptyResult { collaborator: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
