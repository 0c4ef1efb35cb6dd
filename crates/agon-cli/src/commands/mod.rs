//! Subcommands and the plumbing they share

pub mod resume;
pub mod show;
pub mod start;

use std::sync::Arc;

use agon_core::Match;
use agon_llm::{AgonConfig, LlmProvider};
use agon_persist::{FileBackend, MatchStore};
use agon_runtime::{HumanGate, MatchOrchestrator, MatchReport, OrchestratorError};
use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use crate::console;
use crate::terminal::{describe_error, TerminalObserver};

pub type Orchestrator = MatchOrchestrator<dyn LlmProvider, FileBackend>;

/// File-backed match store rooted at the configured data directory
pub fn open_store(config: &AgonConfig) -> MatchStore<FileBackend> {
    MatchStore::new(Arc::new(FileBackend::new(&config.data_dir)))
}

/// Wire provider, store, terminal observer and, for human matches, the console
pub fn build_orchestrator(
    config: &AgonConfig,
    m: &Match,
    judge_model: Option<&str>,
) -> Result<(Orchestrator, Option<JoinHandle<()>>)> {
    let llm = agon_llm::build_provider(&config.llm).context("Failed to configure the model provider")?;
    let mut orchestrator = MatchOrchestrator::new(llm, open_store(config))
        .with_observer(Arc::new(TerminalObserver::new(m)));
    if let Some(model) = judge_model {
        orchestrator = orchestrator.with_judge_model(model);
    }

    let mut console = None;
    if let Some(side) = m.config.human_side {
        let (gate, prompts) = HumanGate::channel();
        orchestrator = orchestrator.with_human_gate(gate);
        console = Some(console::spawn(prompts, m.participant(side).name.clone()));
    }
    Ok((orchestrator, console))
}

/// Run a match future, stopping cleanly on Ctrl-C
pub async fn play<F>(slug: &str, run: F, console: Option<JoinHandle<()>>) -> Result<()>
where
    F: std::future::Future<Output = Result<Option<MatchReport>, OrchestratorError>>,
{
    let outcome = tokio::select! {
        outcome = run => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };
    if let Some(console) = console {
        console.abort();
    }

    match outcome {
        None => {
            println!();
            crate::print_warning(&format!(
                "Interrupted. Completed debates are saved; continue with `agon resume {}`",
                slug
            ));
            Ok(())
        }
        Some(Err(e)) => Err(anyhow::anyhow!(describe_error(&e))),
        Some(Ok(None)) => Err(anyhow::anyhow!("Match {} could not be loaded", slug)),
        Some(Ok(Some(report))) => finish(&report),
    }
}

fn finish(report: &MatchReport) -> Result<()> {
    if report.is_complete() {
        crate::print_success(&format!("Match {} complete", report.m.slug));
        return Ok(());
    }
    crate::print_info(&format!(
        "{} of {} debates played; continue with `agon resume {}`",
        report.m.current_debate, report.m.config.debates, report.m.slug
    ));
    match &report.aborted {
        Some(e) => Err(anyhow::anyhow!(describe_error(e))),
        None => Ok(()),
    }
}
