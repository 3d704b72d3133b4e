//! Output formatting for CLI

use crate::{agent::AgentStep, model::ModelLabels};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Format a probability vector as `label=p` pairs
pub fn format_distribution<'a>(
    values: impl IntoIterator<Item = &'a f64>,
    label: impl Fn(usize) -> String,
) -> String {
    values
        .into_iter()
        .enumerate()
        .map(|(i, p)| format!("{}={p:.3}", label(i)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print one agent tick as a table row
pub fn print_step(step: &AgentStep, labels: &ModelLabels) {
    let action = step
        .action
        .map(|a| labels.action(a))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {:>4}  {:>10}  {:>10}  {:>10}  {}",
        step.tick,
        labels.outcome(step.observation),
        action,
        labels.state(step.most_likely_state),
        format_distribution(&step.belief, |i| labels.state(i)),
    );
}

/// Print the header matching [`print_step`]
pub fn print_step_header() {
    println!(
        "  {:>4}  {:>10}  {:>10}  {:>10}  belief",
        "tick", "observed", "action", "state"
    );
}
