//! # Agon Adversarial
//!
//! Judging and learning for adversarial debates.
//!
//! ## Key Types
//!
//! - [`Judge`] - structured win/lose/tie decision for one topic
//! - [`calculate_tally`] - aggregate of a debate's verdicts
//! - [`StrategyCoach`] - history entries and bounded strategy revision
//!
//! ## Quick Start
//!
//! ```rust
//! use agon_adversarial::calculate_tally;
//! use agon_core::{Participant, Verdict};
//!
//! let a = Participant::new("Ada", "m");
//! let b = Participant::new("Brutus", "m");
//! let verdicts = vec![Verdict::new(Some(a.id), "sharper"), Verdict::tie("even")];
//!
//! let tally = calculate_tally(&verdicts, a.id, b.id);
//! assert_eq!(tally.speaker1_wins, 1);
//! assert_eq!(tally.ties, 1);
//! ```

pub mod strategy;
pub mod verdict;

pub use strategy::{StrategyCoach, StrategyConfig, StrategyError, StrategyUpdate};
pub use verdict::{calculate_tally, verdict_schema, Judge, JudgeError};
