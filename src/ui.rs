//! Terminal output for the chat surfaces.

use crate::pipeline::TurnOutcome;
use console::style;

/// Width replies are wrapped to.
const WRAP_WIDTH: usize = 88;

/// Print the startup banner.
pub fn print_banner(use_stubs: bool) {
    println!("{}", style("atelier — design tutoring core").bold());
    if use_stubs {
        println!("{}", style("(stub collaborators: offline mode)").dim());
    }
    println!(
        "{}",
        style("type a message; /state shows session state; /quit exits").dim()
    );
    println!();
}

/// Print the assembled reply.
pub fn print_reply(outcome: &TurnOutcome) {
    for paragraph in outcome.reply.split("\n\n") {
        for line in paragraph.lines() {
            println!("{}", textwrap::fill(line, WRAP_WIDTH));
        }
        println!();
    }
}

/// Print the decision details behind a reply.
pub fn print_decision(outcome: &TurnOutcome) {
    println!(
        "  {} {}",
        style("route:").dim(),
        style(&outcome.routing_path).cyan()
    );
    println!(
        "  {} {} ({:.2})",
        style("classified:").dim(),
        outcome.classification.interaction,
        outcome.decision.confidence
    );
    println!(
        "  {} {} / {} ({}%)",
        style("phase:").dim(),
        outcome.phase_info.phase,
        outcome.phase_info.milestone,
        outcome.phase_info.milestone_progress
    );
    if outcome.decision.offloading.detected {
        println!(
            "  {} {} ({:?})",
            style("offloading:").dim(),
            outcome.decision.offloading.kind,
            outcome.decision.offloading.indicators
        );
    }
    let missing: Vec<String> = outcome
        .contributions
        .iter()
        .filter(|c| !c.contributed)
        .map(|c| c.collaborator.to_string())
        .collect();
    if !missing.is_empty() {
        println!(
            "  {} {}",
            style("missing contributions:").dim(),
            missing.join(", ")
        );
    }
    println!();
}
