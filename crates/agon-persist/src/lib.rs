//! # Agon Persistence
//!
//! Storage backends and the match store.
//!
//! Supports:
//! - In-memory (for testing)
//! - Local file system (durable, one directory per match)
//!
//! Layout of a match directory:
//!
//! ```text
//! <slug>/match.json
//! <slug>/participants/<name>-<id>/strategy.md
//! <slug>/participants/<name>-<id>/history.md
//! <slug>/debates/debate-001.json
//! <slug>/debates/debate-001.md
//! <slug>/summary.md
//! ```

pub mod backend;
pub mod file;
pub mod match_store;

pub use backend::{MemoryBackend, StorageBackend, StorageError, StorageExt};
pub use file::FileBackend;
pub use match_store::MatchStore;
