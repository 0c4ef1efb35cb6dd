//! Runtime error types

use agon_adversarial::{JudgeError, StrategyError};
use agon_core::{CoreError, TopicExecutionState};
use agon_llm::LlmError;
use agon_persist::StorageError;
use agon_queue::PoolError;

/// Failures of the human-in-the-loop protocol
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HumanError {
    #[error("A human prompt is already pending for this slot")]
    AlreadyPending,

    #[error("Human prompt rejected: {0}")]
    Rejected(String),

    #[error("Human interface disconnected")]
    Disconnected,
}

/// Why one topic execution stopped
#[derive(Debug, Clone, thiserror::Error)]
pub enum TopicError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Judge(#[from] JudgeError),

    #[error(transparent)]
    Human(#[from] HumanError),
}

impl TopicError {
    /// The underlying completion-service error, if any
    pub fn llm_error(&self) -> Option<&LlmError> {
        match self {
            Self::Llm(e) | Self::Judge(JudgeError::Llm(e)) => Some(e),
            _ => None,
        }
    }
}

/// A failed topic together with the state it reached
#[derive(Debug, Clone)]
pub struct TopicFailure {
    pub state: TopicExecutionState,
    pub error: TopicError,
}

impl std::fmt::Display for TopicFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "topic {} failed after {} exchanges: {}",
            self.state.topic_index,
            self.state.exchanges.len(),
            self.error
        )
    }
}

impl std::error::Error for TopicFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Match-level failures, also reported to observers
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Topic generation failed: {0}")]
    TopicGeneration(LlmError),

    #[error("Topic {index} abandoned: {source}")]
    Topic { index: usize, source: TopicError },

    #[error("Topic {index} did not complete: {source}")]
    TopicLost { index: usize, source: PoolError },

    #[error("Every topic of debate {debate} failed")]
    AllTopicsFailed { debate: u32 },

    #[error("Strategy update for {participant} failed: {source}")]
    Learning {
        participant: String,
        source: StrategyError,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Match has a human participant but no human gate was provided")]
    HumanGateMissing,
}

impl OrchestratorError {
    /// The underlying completion-service error, if any
    pub fn llm_error(&self) -> Option<&LlmError> {
        match self {
            Self::TopicGeneration(e) => Some(e),
            Self::Topic { source, .. } => source.llm_error(),
            Self::Learning {
                source: StrategyError::Llm(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}
