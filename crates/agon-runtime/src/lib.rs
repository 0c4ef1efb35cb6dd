//! # Agon Runtime
//!
//! Tokio-based match orchestration.
//!
//! - [`TopicExecutor`] runs one topic: alternating streamed turns, then a verdict
//! - [`HumanGate`] suspends execution until a person answers or acknowledges
//! - [`MatchOrchestrator`] fans topics out through a bounded pool, tallies,
//!   persists and runs the learning step between debates
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agon_core::{Match, MatchConfig, Participant};
//! use agon_llm::MockProvider;
//! use agon_persist::{FileBackend, MatchStore};
//! use agon_runtime::MatchOrchestrator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = Arc::new(MockProvider::smart());
//!     let store = MatchStore::new(Arc::new(FileBackend::new("matches")));
//!     let orchestrator = MatchOrchestrator::new(llm, store);
//!
//!     let m = Match::new(
//!         MatchConfig::default(),
//!         Participant::new("Ada", "gpt-4o-mini"),
//!         Participant::new("Brutus", "gpt-4o-mini"),
//!     );
//!     let report = orchestrator.start(m).await.unwrap();
//!     println!("{:?}", report.summary);
//! }
//! ```

pub mod error;
pub mod executor;
pub mod human;
pub mod observer;
pub mod orchestrator;
pub mod topics;

pub use error::{HumanError, OrchestratorError, TopicError, TopicFailure};
pub use executor::{HumanSeat, TopicExecutor};
pub use human::{HumanContext, HumanGate, HumanPrompt};
pub use observer::{MatchObserver, NoopObserver};
pub use orchestrator::{MatchOrchestrator, MatchReport};
pub use topics::{FixedTopics, LlmTopicGenerator, TopicGenerator};
