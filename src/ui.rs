//! Terminal output — spinner and colored status lines.
//!
//! Uses `indicatif` for the progress spinner and `console` for styling.
//! [`WorkflowProgress`] tracks a driver run visually; [`print_status`] renders
//! the persisted document for the `status` command.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::document::WorkflowDocument;
use crate::orchestrator::RunOutcome;

/// Visual progress indicator for a running workflow loop.
pub struct WorkflowProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl WorkflowProgress {
    /// Start the spinner showing the current state and active task.
    pub fn start(doc: &WorkflowDocument) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        let title = doc
            .root
            .find(&doc.active_task_id)
            .map(|n| n.title.as_str())
            .unwrap_or_default();
        pb.set_message(format!("{}: {title}", doc.state));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Stop the spinner and report how the run ended.
    pub fn finish(&self, outcome: &RunOutcome) {
        self.pb.finish_and_clear();
        match outcome {
            RunOutcome::Completed => {
                println!("  {} Workflow complete", self.green.apply_to("✓"));
            }
            RunOutcome::AwaitingManualTests => {
                println!(
                    "  {} Waiting for manual testing — run `helmsman verified` once it passes",
                    self.yellow.apply_to("⏸")
                );
            }
            RunOutcome::Rejected { reason } => {
                println!("  {} Turn rejected: {reason}", self.red.apply_to("✗"));
            }
            RunOutcome::TurnFailed { status } => {
                println!(
                    "  {} Assistant turn did not complete ({status:?}); nothing was applied",
                    self.red.apply_to("✗")
                );
            }
        }
    }
}

/// Render the persisted document for `helmsman status`.
pub fn print_status(doc: &WorkflowDocument, branch: Option<&str>, verbose: bool) {
    let bold = Style::new().bold();
    println!("{} {}", bold.apply_to("state:"), doc.state);
    println!(
        "{} {} (v{})",
        bold.apply_to("active:"),
        doc.active_path_ids.join(" → "),
        doc.version
    );
    if let Some(branch) = branch {
        println!("{} {branch}", bold.apply_to("branch:"));
    }
    if let Some(record) = &doc.last_transition {
        println!(
            "{} {} → {} ({}, {})",
            bold.apply_to("last transition:"),
            record.from_state,
            record.to_state,
            record.event,
            record.timestamp
        );
    }
    if verbose {
        println!("{}", serde_json::to_string_pretty(doc).unwrap_or_default());
    }
}
