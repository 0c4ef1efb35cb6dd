//! Start command - create a match and play it
//!
//! Usage:
//! ```bash
//! agon start --name-a Ada --name-b Brutus --debates 3 --topics 4 --turns 2
//! agon start --focus "technology" --focus "no politics" --human b
//! agon start --seed-a brisk-otter-3f2a9c/participants/ada-5e6f7a
//! ```

use std::path::{Component, Path};

use agon_core::{Match, MatchConfig, Participant, Side};
use agon_llm::AgonConfig;
use agon_persist::{FileBackend, MatchStore};
use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use super::{build_orchestrator, open_store, play};

#[derive(Clone, Copy, ValueEnum)]
pub enum SideArg {
    A,
    B,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::A => Side::A,
            SideArg::B => Side::B,
        }
    }
}

/// Arguments for the start command
#[derive(Args)]
pub struct StartArgs {
    /// Name of participant A
    #[arg(long, default_value = "Ada")]
    name_a: String,

    /// Name of participant B
    #[arg(long, default_value = "Brutus")]
    name_b: String,

    /// Model for participant A (defaults to AGON_MODEL)
    #[arg(long)]
    model_a: Option<String>,

    /// Model for participant B (defaults to AGON_MODEL)
    #[arg(long)]
    model_b: Option<String>,

    /// Model used for verdicts and the match summary
    #[arg(long)]
    judge_model: Option<String>,

    /// Number of debates in the match
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    debates: u32,

    /// Topics argued in each debate
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    topics: u32,

    /// Turns per topic; each turn is one message from each side
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    turns: u32,

    /// Constraint for topic generation (repeatable)
    #[arg(long)]
    focus: Vec<String>,

    /// Play one side yourself
    #[arg(long, value_enum)]
    human: Option<SideArg>,

    /// Keep participant A's strategy fixed
    #[arg(long)]
    no_revise_a: bool,

    /// Keep participant B's strategy fixed
    #[arg(long)]
    no_revise_b: bool,

    /// Maximum topics argued at once (ignored with --human)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Copy strategy and history from a prior participant directory into A
    #[arg(long)]
    seed_a: Option<String>,

    /// Copy strategy and history from a prior participant directory into B
    #[arg(long)]
    seed_b: Option<String>,
}

/// Run the start command
pub async fn run(args: StartArgs, config: &AgonConfig) -> Result<()> {
    let model = config.llm.model.as_str();
    let a = Participant::new(&args.name_a, args.model_a.as_deref().unwrap_or(model))
        .with_self_revise(!args.no_revise_a);
    let b = Participant::new(&args.name_b, args.model_b.as_deref().unwrap_or(model))
        .with_self_revise(!args.no_revise_b);

    let match_config = MatchConfig {
        debates: args.debates,
        topics_per_debate: args.topics,
        turns_per_topic: args.turns,
        focus: args.focus,
        human_side: args.human.map(Side::from),
        max_concurrency: args.concurrency.or(config.max_concurrency),
        ..Default::default()
    };
    match_config.validate()?;
    let mut m = Match::new(match_config, a, b);

    let store = open_store(config);
    for (side, from) in [(Side::A, args.seed_a), (Side::B, args.seed_b)] {
        if let Some(from) = from {
            seed(&store, &mut m, side, &from).await?;
        }
    }

    let (orchestrator, console) = build_orchestrator(config, &m, args.judge_model.as_deref())?;
    let slug = m.slug.clone();
    play(&slug, async { orchestrator.start(m).await.map(Some) }, console).await
}

/// Give a participant its storage location and a prior participant's files
async fn seed(store: &MatchStore<FileBackend>, m: &mut Match, side: Side, from: &str) -> Result<()> {
    let location = MatchStore::<FileBackend>::participant_location(m, m.participant(side));
    m.participant_mut(side).storage = Some(location);

    let from = seed_location(store.backend().root(), from)?;
    store
        .seed_participant(&from, m.participant(side))
        .await
        .with_context(|| format!("Failed to seed {} from {}", m.participant(side).name, from))?;

    if let Some(strategy) = store.read_strategy(m.participant(side)).await? {
        m.participant_mut(side).strategy = strategy;
    }
    crate::print_info(&format!("Seeded {} from {}", m.participant(side).name, from));
    Ok(())
}

/// Seed directory as a storage key relative to `root`.
///
/// Paths under `root` are stripped of it; other relative paths are taken
/// as already relative to `root`.
fn seed_location(root: &Path, from: &str) -> Result<String> {
    let path = Path::new(from);
    let relative = match path.strip_prefix(root) {
        Ok(rest) => rest,
        Err(_) if path.is_absolute() => {
            bail!("Seed {} is outside the storage root {}", from, root.display())
        }
        Err(_) => path,
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => bail!("Seed {} is outside the storage root {}", from, root.display()),
        }
    }
    if parts.is_empty() {
        bail!("Seed {} does not name a participant directory", from);
    }
    Ok(parts.join("/"))
}
