//! Command-line interface, clap-based.
//!
//! Defines the [`Cli`] struct with the [`Command`] subcommands
//! (start, resume, status, approve, verified) and global flags.

use clap::{Parser, Subcommand};

/// helmsman — deterministic driver for AI-assisted software-change workflows.
#[derive(Debug, Parser)]
#[command(name = "helmsman", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path of the workflow document (overrides the configured path).
    #[arg(long, global = true)]
    pub document: Option<String>,

    /// Enable verbose output.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a workflow document for a root work item and start driving it.
    Start {
        /// Tracker id of the root work item.
        ticket: String,
    },

    /// Resume the workflow loop, replaying any unconsumed assistant turn.
    Resume,

    /// Show the persisted workflow state without driving the loop.
    Status,

    /// Force-approve the current review stage (FORCE_LGTM override).
    Approve,

    /// Confirm that manual testing passed, advancing past the gate.
    Verified,
}
