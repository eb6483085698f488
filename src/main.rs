mod assistant;
mod cli;
mod config;
mod directive;
mod document;
mod error;
mod git;
mod interpreter;
mod orchestrator;
mod replay;
mod state_machine;
mod store;
mod tracker;
mod tree;
mod ui;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use assistant::HttpAssistantClient;
use cli::{Cli, Command};
use config::HelmsmanConfig;
use git::GitManager;
use orchestrator::WorkflowDriver;
use store::DocumentStore;
use tracker::HttpTracker;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = HelmsmanConfig::load()?;
    let document_path = cli
        .document
        .unwrap_or_else(|| config.document_path.clone());
    let store = DocumentStore::new(&document_path);

    if matches!(cli.command, Command::Status) {
        let doc = store.load()?;
        let branch = GitManager::open(Path::new(&config.repo_path))
            .and_then(|gm| gm.current_branch())
            .ok();
        ui::print_status(&doc, branch.as_deref(), cli.verbose);
        return Ok(());
    }

    let tracker = HttpTracker::new(config.tracker_base_url.clone(), config.tracker_token.clone());
    let assistant = HttpAssistantClient::new(
        config.assistant_base_url.clone(),
        config.api_key.clone(),
        Duration::from_secs(config.ack_timeout_secs),
    );
    let working_copy = GitManager::open(Path::new(&config.repo_path))?;
    let driver = WorkflowDriver::new(assistant, tracker, working_copy, store);

    match cli.command {
        Command::Start { ticket } => {
            let doc = driver.start(&ticket).await?;
            ui::print_status(&doc, None, cli.verbose);
            let progress = ui::WorkflowProgress::start(&doc);
            let outcome = driver.run().await?;
            progress.finish(&outcome);
        }
        Command::Resume => {
            let doc = driver.load_document()?;
            let progress = ui::WorkflowProgress::start(&doc);
            let outcome = driver.run().await?;
            progress.finish(&outcome);
        }
        Command::Approve => {
            let doc = driver.force_approve().await?;
            ui::print_status(&doc, None, cli.verbose);
        }
        Command::Verified => {
            let doc = driver.confirm_manual_tests().await?;
            ui::print_status(&doc, None, cli.verbose);
        }
        Command::Status => unreachable!("handled above"),
    }

    Ok(())
}
