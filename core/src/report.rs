//! Output lines for each decided case.
//!
//! The reference line set is fixed; downstream tooling diffs it
//! byte for byte. The two strict-policy outcomes add their own lines.

use crate::{
    config::BankerConfig,
    evaluator::{CaseOutcome, Decision},
    input::TestCase,
    types::Units,
};

pub const CURRENT_UNSAFE: &str = "The current system is in unsafe state.";
pub const NEED_HEADER: &str = "New Need";

pub fn safe_before(label: &str) -> String {
    format!("Before granting the request of {label}, the system is in safe state.")
}

pub fn simulating(label: &str) -> String {
    format!("Simulating granting {label}'s request.")
}

pub fn can_grant(label: &str) -> String {
    format!("{label}'s request can be granted. The system will be in safe state.")
}

pub fn cannot_grant(label: &str) -> String {
    format!("{label}'s request cannot be granted. The system will be in unsafe state.")
}

pub fn exceeds_need(label: &str) -> String {
    format!("{label}'s request cannot be granted. The request exceeds its declared need.")
}

pub fn invalid_state(process: usize, resource: usize, value: Units) -> String {
    format!(
        "The current system is invalid: process {process} has negative need {value} for resource {resource}."
    )
}

fn matrix_rows(matrix: &[Vec<Units>]) -> impl Iterator<Item = String> + '_ {
    matrix.iter().map(|row| {
        row.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    })
}

/// Lines for one case, without trailing newlines.
pub fn render(case: &TestCase, outcome: &CaseOutcome, config: &BankerConfig) -> Vec<String> {
    let label = case.label.as_str();
    match outcome {
        CaseOutcome::InvalidState { process, resource, value } => {
            vec![invalid_state(*process, *resource, *value)]
        }
        CaseOutcome::CurrentUnsafe { .. } => vec![CURRENT_UNSAFE.to_string()],
        CaseOutcome::RequestExceedsNeed { .. } => vec![safe_before(label), exceeds_need(label)],
        CaseOutcome::Simulated { hypothetical_need, decision, .. } => {
            let mut lines = vec![safe_before(label), simulating(label)];
            if config.print_need_matrix {
                lines.push(NEED_HEADER.to_string());
                lines.extend(matrix_rows(hypothetical_need));
            }
            lines.push(match decision {
                Decision::Granted { .. } => can_grant(label),
                Decision::DeniedUnsafe { .. } | Decision::DeniedInsufficient { .. } => {
                    cannot_grant(label)
                }
            });
            lines
        }
    }
}
