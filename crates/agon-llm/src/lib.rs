//! # Agon LLM
//!
//! The completion-service interface consumed by Agon.
//!
//! | Capability | Method |
//! |------------|--------|
//! | Free text | [`LlmProvider::complete`] |
//! | Streamed text | [`LlmProvider::stream`] |
//! | Schema-constrained object | [`LlmProvider::complete_structured`] / [`generate_structured`] |
//!
//! ## Quick Start
//!
//! ```rust
//! use agon_llm::{MockProvider, LlmProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::constant("Dogs are loyal.");
//!     let response = llm.ask("Argue for dogs").await.unwrap();
//!     assert_eq!(response, "Dogs are loyal.");
//! }
//! ```
//!
//! ## Against an OpenAI-compatible endpoint
//!
//! ```rust,ignore
//! use agon_llm::{OpenAiCompatibleProvider, RetryingProvider, RetryConfig};
//!
//! let api_key = std::env::var("AGON_API_KEY").unwrap();
//! let llm = RetryingProvider::new(
//!     OpenAiCompatibleProvider::openai(&api_key, "gpt-4o-mini"),
//!     RetryConfig::default(),
//! );
//! ```

pub mod config;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod retry;
pub mod structured;

pub use config::{build_provider, AgonConfig, ConfigError, LlmConfig};
pub use mock::MockProvider;
pub use openai::OpenAiCompatibleProvider;
pub use provider::{ChatMessage, LlmError, LlmProvider, LlmRequest, LlmResponse, Role, TextStream};
pub use retry::{RetryConfig, RetryingProvider};
pub use structured::{extract_json, generate_structured, parse_and_validate};
