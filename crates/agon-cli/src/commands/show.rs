//! Show command - inspect stored matches
//!
//! Usage:
//! ```bash
//! agon show
//! agon show brisk-otter-3f2a9c
//! agon show brisk-otter-3f2a9c --strategies
//! ```

use agon_core::Match;
use agon_llm::AgonConfig;
use agon_persist::{FileBackend, MatchStore};
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::open_store;
use crate::terminal::standings;

/// Arguments for the show command
#[derive(Args)]
pub struct ShowArgs {
    /// Match slug; lists every stored match when omitted
    slug: Option<String>,

    /// Print each participant's current strategy
    #[arg(long)]
    strategies: bool,
}

/// Run the show command
pub async fn run(args: ShowArgs, config: &AgonConfig) -> Result<()> {
    let store = open_store(config);
    match args.slug {
        Some(slug) => show_match(&store, &slug, args.strategies).await,
        None => list_matches(&store, config).await,
    }
}

async fn list_matches(store: &MatchStore<FileBackend>, config: &AgonConfig) -> Result<()> {
    let mut slugs = Vec::new();
    if config.data_dir.is_dir() {
        let mut entries = tokio::fs::read_dir(&config.data_dir)
            .await
            .with_context(|| format!("Failed to read {}", config.data_dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().join("match.json").is_file() {
                slugs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    slugs.sort();

    if slugs.is_empty() {
        crate::print_info(&format!("No matches in {}", config.data_dir.display()));
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Match").fg(Color::Cyan),
            Cell::new("Participants").fg(Color::Cyan),
            Cell::new("Debates").fg(Color::Cyan),
            Cell::new("Score").fg(Color::Cyan),
        ]);

    for slug in slugs {
        match store.load_match(&slug).await? {
            Some(m) => {
                let (a, b) = standings(&m);
                table.add_row(vec![
                    Cell::new(&m.slug).fg(Color::Green),
                    Cell::new(format!("{} vs {}", m.participants[0].name, m.participants[1].name)),
                    Cell::new(format!("{}/{}", m.current_debate, m.config.debates)),
                    Cell::new(format!("{} - {}", a, b)),
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(&slug).fg(Color::Red),
                    Cell::new("unreadable"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
        }
    }

    println!("{}", table);
    Ok(())
}

async fn show_match(store: &MatchStore<FileBackend>, slug: &str, strategies: bool) -> Result<()> {
    let Some(m) = store.load_match(slug).await? else {
        bail!("No match named '{}'", slug);
    };

    println!(
        "{} {} vs {}",
        m.slug.bold().cyan(),
        m.participants[0].name.green().bold(),
        m.participants[1].name.magenta().bold()
    );
    println!("{}", "═".repeat(50).cyan());
    print_config(&m);
    println!();

    if m.debates.is_empty() {
        crate::print_info("No debates played yet");
    } else {
        println!("{}", debate_table(&m));
    }

    let (a, b) = standings(&m);
    let status = if m.is_finished() {
        "complete".green()
    } else {
        "in progress".yellow()
    };
    println!(
        "{} {} - {} ({}, {}/{} debates)",
        "Score:".bold(),
        a,
        b,
        status,
        m.current_debate,
        m.config.debates
    );

    if strategies {
        for p in &m.participants {
            println!();
            println!("{}", format!("Strategy of {}", p.name).bold());
            println!("{}", p.strategy);
        }
    }

    if let Some(summary) = store.read_summary(&m.slug).await? {
        println!();
        println!("{}", summary);
    }
    Ok(())
}

fn print_config(m: &Match) {
    let config = &m.config;
    println!(
        "  {} {} debates × {} topics × {} turns",
        "Format:".dimmed(),
        config.debates,
        config.topics_per_debate,
        config.turns_per_topic
    );
    if !config.focus.is_empty() {
        println!("  {} {}", "Focus:".dimmed(), config.focus.join("; "));
    }
    if let Some(side) = config.human_side {
        println!("  {} {}", "Human:".dimmed(), m.participant(side).name);
    }
    for p in &m.participants {
        let revise = if p.self_revise { "revises" } else { "fixed strategy" };
        println!("  {} {} ({}, {})", "•".cyan(), p.name, p.model, revise);
    }
}

fn debate_table(m: &Match) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Debate").fg(Color::Cyan),
            Cell::new(&m.participants[0].name).fg(Color::Cyan),
            Cell::new(&m.participants[1].name).fg(Color::Cyan),
            Cell::new("Ties").fg(Color::Cyan),
            Cell::new("Abandoned").fg(Color::Cyan),
        ]);

    for debate in &m.debates {
        let abandoned = debate.abandoned_count();
        table.add_row(vec![
            Cell::new(debate.number),
            Cell::new(debate.tally.speaker1_wins),
            Cell::new(debate.tally.speaker2_wins),
            Cell::new(debate.tally.ties),
            Cell::new(abandoned).fg(if abandoned > 0 { Color::Red } else { Color::Reset }),
        ]);
    }
    table
}
