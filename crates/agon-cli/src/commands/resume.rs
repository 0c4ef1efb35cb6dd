//! Resume command - continue a stored match
//!
//! Usage:
//! ```bash
//! agon resume brisk-otter-3f2a9c
//! ```

use agon_llm::AgonConfig;
use anyhow::{bail, Result};
use clap::Args;

use super::{build_orchestrator, open_store, play};

/// Arguments for the resume command
#[derive(Args)]
pub struct ResumeArgs {
    /// Match slug, as printed by `agon start` or `agon show`
    slug: String,

    /// Model used for verdicts and the match summary
    #[arg(long)]
    judge_model: Option<String>,
}

/// Run the resume command
pub async fn run(args: ResumeArgs, config: &AgonConfig) -> Result<()> {
    let Some(m) = open_store(config).load_match(&args.slug).await? else {
        bail!(
            "No resumable match named '{}' in {}",
            args.slug,
            config.data_dir.display()
        );
    };
    if m.is_finished() {
        crate::print_success(&format!("Match {} is already complete", m.slug));
        return Ok(());
    }

    let (orchestrator, console) = build_orchestrator(config, &m, args.judge_model.as_deref())?;
    play(&args.slug, orchestrator.resume(&args.slug), console).await
}
