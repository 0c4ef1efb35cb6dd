//! Agon CLI - run adversarial debate matches from the terminal
//!
//! # Usage
//!
//! ```bash
//! # Two AI participants, three debates of four topics each
//! agon start --name-a Ada --name-b Brutus --debates 3 --topics 4
//!
//! # Play side B yourself
//! agon start --human b --turns 2
//!
//! # Continue an interrupted match
//! agon resume brisk-otter-3f2a9c
//!
//! # Inspect stored matches
//! agon show
//! agon show brisk-otter-3f2a9c
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod console;
mod terminal;

use commands::{resume, show, start};

/// Agon - debate matches between self-revising language-model participants
#[derive(Parser)]
#[command(
    name = "agon",
    version,
    about = "Agon CLI - adversarial debate matches",
    long_about = "Agon pits two participants against each other over several debates.\n\n\
                  Each debate argues a set of topics concurrently, a judge rules on every\n\
                  topic, and both sides revise their strategy before the next debate."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding match state
    #[arg(long, env = "AGON_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new match and play it
    #[command(name = "start")]
    Start(start::StartArgs),

    /// Continue a stored match from its next debate
    #[command(name = "resume")]
    Resume(resume::ResumeArgs),

    /// List stored matches or show one match's record
    #[command(name = "show")]
    Show(show::ShowArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = agon_llm::AgonConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    // AGON_DEBUG raises the floor to debug
    let verbosity = if config.debug { cli.verbose.max(2) } else { cli.verbose };
    setup_logging(verbosity);
    tracing::debug!(
        provider = %config.llm.provider,
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Start(args) => start::run(args, &config).await,
        Commands::Resume(args) => resume::run(args, &config).await,
        Commands::Show(args) => show::run(args, &config).await,
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message with an X
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_counts_are_refused_at_parse_time() {
        for flag in ["--debates", "--topics", "--turns"] {
            assert!(Cli::try_parse_from(["agon", "start", flag, "0"]).is_err());
        }
        assert!(Cli::try_parse_from(["agon", "start", "--debates", "1", "--turns", "1"]).is_ok());
    }
}
