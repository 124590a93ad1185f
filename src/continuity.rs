//! Per-session continuity context.
//!
//! Tracks what the conversation has already established: current topic, the
//! route history, and sticky confidence-scored facts (project type, learning
//! phase) that stay stable across turns absent strong new evidence.
//!
//! Histories are append-only. Sticky facts follow a conditional-update rule:
//! during the settling period (the first [`default_turn_gate`] turns) any
//! detection above the persistence threshold may overwrite; afterwards a new
//! detection must be strictly more confident than the stored one. A single
//! noisy turn can therefore never displace an established fact.

use crate::routing::Route;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of opening turns during which sticky facts may settle.
pub const DEFAULT_TURN_GATE: u32 = 2;

/// Default minimum confidence for a detection to become sticky at all.
pub const DEFAULT_PERSISTENCE_THRESHOLD: f64 = 0.5;

/// A persisted, confidence-scored belief about the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickyFact {
    /// The believed value (e.g. "community_center", "exploration").
    pub value: String,
    /// Confidence the belief was stored with, in [0, 1].
    pub confidence: f64,
    /// Turn on which the belief was last updated.
    pub updated_turn: u32,
}

impl StickyFact {
    pub fn new(value: impl Into<String>, confidence: f64, turn: u32) -> Self {
        Self {
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            updated_turn: turn,
        }
    }
}

/// Outcome of a sticky-fact update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactUpdate {
    /// The fact was set or replaced.
    Applied,
    /// The detection was below the persistence threshold.
    BelowThreshold,
    /// An established fact with higher confidence was kept.
    Kept,
}

/// Persistent per-session conversation record, mutated once per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityContext {
    /// Session this context belongs to.
    pub session_id: String,
    /// Topic of the current turn, if one was detected.
    pub current_topic: Option<String>,
    /// Route chosen on the previous turn.
    pub last_route: Option<Route>,
    /// All topics seen, in order. Append-only.
    pub topic_history: Vec<String>,
    /// All routes chosen, in order. Append-only.
    pub route_history: Vec<Route>,
    /// Sticky detected project type.
    pub project_type: Option<StickyFact>,
    /// Sticky detected learning phase.
    pub learning_phase: Option<StickyFact>,
    /// Number of turns processed, including the current one.
    pub turn_count: u32,
    /// Whether this turn continues an existing conversation.
    pub is_continuing: bool,
    /// When the session context was created.
    pub created_at: DateTime<Utc>,
}

impl ContinuityContext {
    /// Create a fresh context for a session.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            current_topic: None,
            last_route: None,
            topic_history: Vec::new(),
            route_history: Vec::new(),
            project_type: None,
            learning_phase: None,
            turn_count: 0,
            is_continuing: false,
            created_at: Utc::now(),
        }
    }

    /// Begin a new turn: bump the counter and record the topic if present.
    pub fn begin_turn(&mut self, topic: Option<&str>) {
        self.turn_count += 1;
        self.is_continuing = self.turn_count > 1;
        if let Some(topic) = topic {
            self.current_topic = Some(topic.to_string());
            self.topic_history.push(topic.to_string());
        }
    }

    /// Record the route chosen for the current turn. Append-only.
    pub fn record_route(&mut self, route: Route) {
        self.last_route = Some(route);
        self.route_history.push(route);
    }

    /// Attempt a sticky project-type update under the conditional rule.
    pub fn consider_project_type(
        &mut self,
        value: &str,
        confidence: f64,
        threshold: f64,
        turn_gate: u32,
    ) -> FactUpdate {
        let turn = self.turn_count;
        Self::consider(&mut self.project_type, value, confidence, threshold, turn_gate, turn)
    }

    /// Attempt a sticky learning-phase update under the conditional rule.
    pub fn consider_learning_phase(
        &mut self,
        value: &str,
        confidence: f64,
        threshold: f64,
        turn_gate: u32,
    ) -> FactUpdate {
        let turn = self.turn_count;
        Self::consider(&mut self.learning_phase, value, confidence, threshold, turn_gate, turn)
    }

    fn consider(
        slot: &mut Option<StickyFact>,
        value: &str,
        confidence: f64,
        threshold: f64,
        turn_gate: u32,
        turn: u32,
    ) -> FactUpdate {
        if confidence < threshold {
            return FactUpdate::BelowThreshold;
        }

        let replace = match slot {
            None => true,
            Some(_) if turn <= turn_gate => true,
            Some(existing) => confidence > existing.confidence,
        };

        if replace {
            *slot = Some(StickyFact::new(value, confidence, turn));
            FactUpdate::Applied
        } else {
            FactUpdate::Kept
        }
    }

    /// The established project type, if any.
    pub fn project_type_value(&self) -> Option<&str> {
        self.project_type.as_ref().map(|f| f.value.as_str())
    }

    /// Check whether the previous route repeats.
    pub fn route_repeats(&self, route: Route) -> bool {
        self.last_route == Some(route)
    }

    /// Count how often `route` appears in the history.
    pub fn route_count(&self, route: Route) -> usize {
        self.route_history.iter().filter(|r| **r == route).count()
    }
}
