//! Errors raised when an operation would break a data-model invariant

use thiserror::Error;
use uuid::Uuid;

use crate::topic::TopicStatus;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid topic transition: {from:?} -> {to:?}")]
    InvalidTransition { from: TopicStatus, to: TopicStatus },

    #[error("Speaker {got} is out of turn (expected {expected})")]
    SpeakerOutOfTurn { expected: Uuid, got: Uuid },

    #[error("Exchange for turn {turn} by {speaker} already recorded")]
    DuplicateExchange { turn: u32, speaker: Uuid },

    #[error("Topic {0} already has a verdict")]
    VerdictAlreadySet(usize),

    #[error("Topic {0} has no exchanges to judge")]
    EmptyTranscript(usize),

    #[error("Debate {got} recorded out of order (expected {expected})")]
    DebateOutOfOrder { expected: u32, got: u32 },

    #[error("Turn limit reached: {0} turns per topic")]
    TurnLimitReached(u32),

    #[error("Invalid match configuration: {0}")]
    InvalidConfig(String),
}
