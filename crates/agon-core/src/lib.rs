//! # Agon Core
//!
//! Core types for an Agon match:
//! - [`Participant`] - a debating entity with evolving strategy text
//! - [`Match`] - configuration, the two participants and completed debates
//! - [`TopicExecutionState`] - the live, invariant-checked state of one topic
//! - [`Verdict`] and [`Tally`] - judged outcomes and their aggregate
//!
//! ## Quick Start
//!
//! ```rust
//! use agon_core::{Match, MatchConfig, Participant};
//!
//! let a = Participant::new("Ada", "gpt-4o-mini");
//! let b = Participant::new("Brutus", "gpt-4o-mini");
//! let m = Match::new(MatchConfig::default(), a, b);
//!
//! assert_eq!(m.next_debate_number(), Some(1));
//! assert_eq!(m.effective_concurrency(), 5);
//! ```

pub mod debate;
pub mod error;
pub mod ids;
pub mod match_state;
pub mod names;
pub mod participant;
pub mod topic;

pub use debate::{DebateResult, Tally, TopicResult};
pub use error::CoreError;
pub use ids::{new_id, short_id, slug, slugify, MatchId, ParticipantId};
pub use match_state::{Match, MatchConfig, Side, DEFAULT_MAX_CONCURRENCY};
pub use names::DisplayNames;
pub use participant::{Participant, DEFAULT_STRATEGY};
pub use topic::{Exchange, TopicExecutionState, TopicStatus, Verdict};
