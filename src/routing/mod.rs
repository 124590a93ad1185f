//! Priority-ordered routing: classification + continuity in, decision out.
//!
//! The rule table holds the common content-based routing; two explicit
//! pre-table escape hatches (the pure-example fast path and the
//! gamification-trigger override) handle the sharp, well-tested exceptions.

pub mod engine;
pub mod rules;
pub mod triggers;
pub mod types;

pub use engine::{EngineSettings, RoutingEngine};
pub use rules::{Condition, RoutingRule, RuleInput, RuleTable};
pub use triggers::GamificationTrigger;
pub use types::{ResponseTrigger, Route, RoutingDecision};
