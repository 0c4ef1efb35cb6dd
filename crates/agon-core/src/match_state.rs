//! Match configuration and state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::debate::DebateResult;
use crate::error::CoreError;
use crate::ids::{new_id, slug, MatchId, ParticipantId};
use crate::names::DisplayNames;
use crate::participant::Participant;

/// Topic executions run concurrently when no human is playing
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Which of the two participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Configuration for a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Number of sequential debates
    pub debates: u32,
    /// Topics generated for every debate
    pub topics_per_debate: u32,
    /// Turns each participant takes per topic
    pub turns_per_topic: u32,
    /// Constraints passed to the topic generator
    #[serde(default)]
    pub focus: Vec<String>,
    /// Side controlled by a person, if any
    #[serde(default)]
    pub human_side: Option<Side>,
    /// Upper bound on concurrently running topics
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    /// Maximum strategy length in characters
    pub max_strategy_chars: usize,
    /// Regeneration attempts before a strategy is hard-truncated
    pub strategy_retry_limit: u32,
}

impl MatchConfig {
    /// Reject counts that would make the match a no-op
    pub fn validate(&self) -> Result<(), CoreError> {
        let counts = [
            ("debates", self.debates),
            ("topics_per_debate", self.topics_per_debate),
            ("turns_per_topic", self.turns_per_topic),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(CoreError::InvalidConfig(format!("{} must be at least 1", field)));
            }
        }
        if self.max_strategy_chars == 0 {
            return Err(CoreError::InvalidConfig(
                "max_strategy_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            debates: 3,
            topics_per_debate: 3,
            turns_per_topic: 2,
            focus: Vec::new(),
            human_side: None,
            max_concurrency: None,
            max_strategy_chars: 2000,
            strategy_retry_limit: 3,
        }
    }
}

/// A sequence of debates between the same two participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Human-friendly key, also the storage directory name
    pub slug: String,
    pub config: MatchConfig,
    /// `[A, B]`; A is "speaker 1" in every tally
    pub participants: [Participant; 2],
    /// Number of debates completed and persisted
    pub current_debate: u32,
    /// Completed debates, reconstructed from storage on resume
    #[serde(skip, default)]
    pub debates: Vec<DebateResult>,
    /// Debate persisted on disk whose learning step never completed
    #[serde(skip, default)]
    pub pending_learning: Option<DebateResult>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(config: MatchConfig, a: Participant, b: Participant) -> Self {
        Self {
            id: new_id(),
            slug: slug(),
            config,
            participants: [a, b],
            current_debate: 0,
            debates: Vec::new(),
            pending_learning: None,
            created_at: Utc::now(),
        }
    }

    pub fn participant(&self, side: Side) -> &Participant {
        &self.participants[side.index()]
    }

    pub fn participant_mut(&mut self, side: Side) -> &mut Participant {
        &mut self.participants[side.index()]
    }

    pub fn side_of(&self, id: ParticipantId) -> Option<Side> {
        if self.participants[0].id == id {
            Some(Side::A)
        } else if self.participants[1].id == id {
            Some(Side::B)
        } else {
            None
        }
    }

    /// Identity of the human-controlled participant, if any
    pub fn human_id(&self) -> Option<ParticipantId> {
        self.config.human_side.map(|s| self.participant(s).id)
    }

    /// Next debate to play, `None` once all are done
    pub fn next_debate_number(&self) -> Option<u32> {
        if self.current_debate >= self.config.debates {
            None
        } else {
            Some(self.current_debate + 1)
        }
    }

    /// Terminal once every debate is recorded and nothing awaits learning
    pub fn is_finished(&self) -> bool {
        self.next_debate_number().is_none() && self.pending_learning.is_none()
    }

    /// Append a persisted debate and advance the debate counter
    pub fn record_debate(&mut self, debate: DebateResult) -> Result<(), CoreError> {
        let expected = self.current_debate + 1;
        if debate.number != expected {
            return Err(CoreError::DebateOutOfOrder {
                expected,
                got: debate.number,
            });
        }
        self.debates.push(debate);
        self.current_debate = expected;
        Ok(())
    }

    /// `(first, second)` speakers for a topic; even indices are led by A
    pub fn speaking_order(&self, topic_index: usize) -> (ParticipantId, ParticipantId) {
        let (a, b) = (self.participants[0].id, self.participants[1].id);
        if topic_index % 2 == 0 {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Concurrency for topic execution; a human forces serial play
    pub fn effective_concurrency(&self) -> usize {
        if self.config.human_side.is_some() {
            return 1;
        }
        self.config
            .max_concurrency
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
            .max(1)
    }

    pub fn display_names(&self) -> DisplayNames {
        self.participants
            .iter()
            .map(|p| (p.id, p.name.as_str()))
            .collect()
    }
}
