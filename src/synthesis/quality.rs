//! The quality gate.
//!
//! Structural invariants enforced on every assembled reply before it leaves
//! the core: non-empty, trailing question where the route requires one,
//! well-formed markdown emphasis/heading markers, and a length cap. The
//! gate repairs violations in place; it never drops a response.

use crate::routing::Route;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Default maximum reply length in characters.
pub const DEFAULT_MAX_REPLY_CHARS: usize = 2400;

/// Appended when a required question is missing.
const GENERIC_QUESTION: &str = "What's your own read on this so far?";

/// Used when a reply arrives empty.
const EMPTY_REPLY_FALLBACK: &str =
    "Let's take this one step at a time. What part of the problem feels most unresolved to you?";

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})([^#\s])").unwrap());

/// Enforces output invariants for every route.
#[derive(Debug, Clone)]
pub struct QualityGate {
    max_reply_chars: usize,
}

impl QualityGate {
    pub fn new(max_reply_chars: usize) -> Self {
        Self {
            max_reply_chars: max_reply_chars.max(80),
        }
    }

    /// Apply every invariant, repairing in place.
    pub fn enforce(&self, route: Route, reply: &str) -> String {
        let mut reply = reply.trim().to_string();

        if reply.is_empty() {
            debug!(%route, "empty reply repaired");
            reply = EMPTY_REPLY_FALLBACK.to_string();
        }

        reply = repair_markdown(&reply);
        reply = self.clamp_length(reply);

        if route.requires_trailing_question() && !reply.trim_end().ends_with('?') {
            debug!(%route, "appending required closing question");
            reply = format!("{}\n\n{}", reply.trim_end(), GENERIC_QUESTION);
        }

        reply
    }

    /// Truncate at a word boundary under the cap.
    fn clamp_length(&self, reply: String) -> String {
        if reply.chars().count() <= self.max_reply_chars {
            return reply;
        }
        let truncated: String = reply.chars().take(self.max_reply_chars).collect();
        let cut = truncated
            .rfind(char::is_whitespace)
            .unwrap_or(truncated.len());
        let mut clamped = truncated[..cut].trim_end().to_string();
        clamped.push('…');
        clamped
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REPLY_CHARS)
    }
}

/// Repair malformed markdown markers.
///
/// An odd number of `**` markers strips emphasis entirely rather than
/// leaving an unmatched run; headings gain their missing space.
pub fn repair_markdown(text: &str) -> String {
    let mut repaired = text.to_string();

    if repaired.matches("**").count() % 2 != 0 {
        repaired = repaired.replace("**", "");
    }

    repaired = HEADING_REGEX.replace_all(&repaired, "$1 $2").into_owned();

    repaired
}
