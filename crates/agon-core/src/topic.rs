//! Topic execution state machine
//!
//! A topic moves strictly through `Pending -> Debating -> Judging -> Complete`.
//! Exchanges alternate between the two assigned speakers, starting with the
//! first speaker, and each speaker contributes exactly one exchange per turn.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::ParticipantId;

/// Lifecycle of a single topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    Pending,
    Debating,
    Judging,
    Complete,
}

impl TopicStatus {
    /// The only status this one may move to
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Debating),
            Self::Debating => Some(Self::Judging),
            Self::Judging => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Complete
    }
}

/// One participant's single turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub speaker: ParticipantId,
    pub message: String,
    pub turn: u32,
    pub topic_index: usize,
}

/// Judged outcome of a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Winning participant, `None` for a tie
    pub winner: Option<ParticipantId>,
    /// Bounded-length rationale
    pub rationale: String,
}

impl Verdict {
    /// Rationale is truncated to this many characters
    pub const MAX_RATIONALE_CHARS: usize = 1200;

    pub fn new(winner: Option<ParticipantId>, rationale: &str) -> Self {
        Self {
            winner,
            rationale: rationale.trim().chars().take(Self::MAX_RATIONALE_CHARS).collect(),
        }
    }

    pub fn tie(rationale: &str) -> Self {
        Self::new(None, rationale)
    }

    pub fn is_tie(&self) -> bool {
        self.winner.is_none()
    }
}

/// Live projection of one topic's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicExecutionState {
    pub topic_index: usize,
    pub topic: String,
    pub status: TopicStatus,
    /// Turn currently being played (0 before the first turn starts)
    pub turn: u32,
    pub turns_per_topic: u32,
    pub current_speaker: Option<ParticipantId>,
    /// `[first, second]` speaker for this topic
    pub speakers: [ParticipantId; 2],
    pub exchanges: Vec<Exchange>,
    /// Text streamed so far for the exchange in flight
    pub streaming_text: String,
    pub verdict: Option<Verdict>,
}

impl TopicExecutionState {
    pub fn new(
        topic_index: usize,
        topic: &str,
        turns_per_topic: u32,
        first: ParticipantId,
        second: ParticipantId,
    ) -> Self {
        Self {
            topic_index,
            topic: topic.to_string(),
            status: TopicStatus::Pending,
            turn: 0,
            turns_per_topic,
            current_speaker: None,
            speakers: [first, second],
            exchanges: Vec::new(),
            streaming_text: String::new(),
            verdict: None,
        }
    }

    pub fn first_speaker(&self) -> ParticipantId {
        self.speakers[0]
    }

    /// Move to the next status; skipping a status is rejected
    pub fn advance(&mut self, to: TopicStatus) -> Result<(), CoreError> {
        if self.status.next() != Some(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        if to == TopicStatus::Judging && self.exchanges.is_empty() {
            return Err(CoreError::EmptyTranscript(self.topic_index));
        }
        tracing::debug!(topic = self.topic_index, from = ?self.status, to = ?to, "Topic transition");
        self.status = to;
        Ok(())
    }

    /// Number of fully completed turns
    pub fn completed_turns(&self) -> u32 {
        (self.exchanges.len() / 2) as u32
    }

    /// Speaker who owes the next exchange
    pub fn expected_speaker(&self) -> ParticipantId {
        self.speakers[self.exchanges.len() % 2]
    }

    /// Turn number the next exchange belongs to
    pub fn expected_turn(&self) -> u32 {
        self.completed_turns() + 1
    }

    /// The most recent exchange not made by `speaker`
    pub fn last_message_from_opponent_of(&self, speaker: ParticipantId) -> Option<&Exchange> {
        self.exchanges.iter().rev().find(|e| e.speaker != speaker)
    }

    /// Mark `speaker` as active for the next exchange
    pub fn begin_exchange(&mut self, speaker: ParticipantId) -> Result<(), CoreError> {
        if self.status != TopicStatus::Debating {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: TopicStatus::Debating,
            });
        }
        let expected = self.expected_speaker();
        if speaker != expected {
            return Err(CoreError::SpeakerOutOfTurn {
                expected,
                got: speaker,
            });
        }
        if self.expected_turn() > self.turns_per_topic {
            return Err(CoreError::TurnLimitReached(self.turns_per_topic));
        }
        self.turn = self.expected_turn();
        self.current_speaker = Some(speaker);
        self.streaming_text.clear();
        Ok(())
    }

    /// Accumulate a streamed fragment of the exchange in flight
    pub fn push_chunk(&mut self, chunk: &str) {
        self.streaming_text.push_str(chunk);
    }

    /// Append the finished exchange for the active speaker
    pub fn append_exchange(
        &mut self,
        speaker: ParticipantId,
        message: &str,
    ) -> Result<&Exchange, CoreError> {
        let expected = self.expected_speaker();
        if speaker != expected {
            return Err(CoreError::SpeakerOutOfTurn {
                expected,
                got: speaker,
            });
        }
        let turn = self.expected_turn();
        if self
            .exchanges
            .iter()
            .any(|e| e.turn == turn && e.speaker == speaker)
        {
            return Err(CoreError::DuplicateExchange { turn, speaker });
        }
        if turn > self.turns_per_topic {
            return Err(CoreError::TurnLimitReached(self.turns_per_topic));
        }

        self.exchanges.push(Exchange {
            speaker,
            message: message.to_string(),
            turn,
            topic_index: self.topic_index,
        });
        self.streaming_text.clear();
        self.current_speaker = None;
        Ok(&self.exchanges[self.exchanges.len() - 1])
    }

    /// Whether every scheduled turn has both exchanges
    pub fn all_turns_played(&self) -> bool {
        self.completed_turns() >= self.turns_per_topic
    }

    /// Attach the verdict and complete the topic
    pub fn conclude(&mut self, verdict: Verdict) -> Result<(), CoreError> {
        if self.verdict.is_some() {
            return Err(CoreError::VerdictAlreadySet(self.topic_index));
        }
        if self.status != TopicStatus::Judging {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: TopicStatus::Complete,
            });
        }
        self.verdict = Some(verdict);
        self.advance(TopicStatus::Complete)
    }
}
