//! Debate results: per-topic outcomes and their tally

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ParticipantId;
use crate::names::DisplayNames;
use crate::topic::{Exchange, TopicExecutionState, Verdict};

/// Final outcome of one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResult {
    pub topic_index: usize,
    pub topic: String,
    pub first_speaker: ParticipantId,
    pub exchanges: Vec<Exchange>,
    pub verdict: Option<Verdict>,
    /// Set when the topic was abandoned on error
    pub error: Option<String>,
}

impl TopicResult {
    /// Result for a topic that failed before reaching a verdict
    pub fn abandoned(state: TopicExecutionState, error: &str) -> Self {
        Self {
            topic_index: state.topic_index,
            topic: state.topic,
            first_speaker: state.speakers[0],
            exchanges: state.exchanges,
            verdict: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.error.is_some()
    }
}

impl From<TopicExecutionState> for TopicResult {
    fn from(state: TopicExecutionState) -> Self {
        Self {
            topic_index: state.topic_index,
            topic: state.topic,
            first_speaker: state.speakers[0],
            exchanges: state.exchanges,
            verdict: state.verdict,
            error: None,
        }
    }
}

/// Aggregate of the verdicts in one debate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub speaker1_wins: u32,
    pub speaker2_wins: u32,
    pub ties: u32,
}

impl Tally {
    /// Number of verdicts counted
    pub fn total(&self) -> u32 {
        self.speaker1_wins + self.speaker2_wins + self.ties
    }

    /// `Some(1)` or `Some(2)` for the leading speaker, `None` when level
    pub fn leader(&self) -> Option<u8> {
        match self.speaker1_wins.cmp(&self.speaker2_wins) {
            std::cmp::Ordering::Greater => Some(1),
            std::cmp::Ordering::Less => Some(2),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// One complete round of topics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateResult {
    /// 1-based debate number within the match
    pub number: u32,
    /// Topics in their original order
    pub topics: Vec<TopicResult>,
    pub tally: Tally,
    pub completed_at: DateTime<Utc>,
}

impl DebateResult {
    pub fn new(number: u32, topics: Vec<TopicResult>, tally: Tally) -> Self {
        Self {
            number,
            topics,
            tally,
            completed_at: Utc::now(),
        }
    }

    pub fn judged_count(&self) -> usize {
        self.topics.iter().filter(|t| t.verdict.is_some()).count()
    }

    pub fn abandoned_count(&self) -> usize {
        self.topics.iter().filter(|t| t.is_abandoned()).count()
    }

    /// Human-readable transcript
    pub fn to_markdown(&self, names: &DisplayNames) -> String {
        let mut out = format!(
            "# Debate {}\n\nCompleted {}\n\n",
            self.number,
            self.completed_at.format("%Y-%m-%d %H:%M UTC")
        );
        for topic in &self.topics {
            out.push_str(&format!("## Topic {}: {}\n\n", topic.topic_index + 1, topic.topic));
            for exchange in &topic.exchanges {
                out.push_str(&format!(
                    "**{}** (turn {}):\n\n{}\n\n",
                    names.name_of(&exchange.speaker),
                    exchange.turn,
                    exchange.message.trim()
                ));
            }
            match (&topic.verdict, &topic.error) {
                (Some(v), _) => {
                    let winner = v
                        .winner
                        .map(|w| names.name_of(&w).to_string())
                        .unwrap_or_else(|| "Tie".to_string());
                    out.push_str(&format!("**Verdict:** {}\n\n> {}\n\n", winner, v.rationale));
                }
                (None, Some(e)) => out.push_str(&format!("**Abandoned:** {}\n\n", e)),
                (None, None) => out.push_str("**Verdict:** pending\n\n"),
            }
        }
        out.push_str(&format!(
            "## Tally\n\n- speaker 1 wins: {}\n- speaker 2 wins: {}\n- ties: {}\n",
            self.tally.speaker1_wins, self.tally.speaker2_wins, self.tally.ties
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::TopicStatus;
    use uuid::Uuid;

    #[test]
    fn test_tally_leader() {
        let t = Tally {
            speaker1_wins: 2,
            speaker2_wins: 1,
            ties: 1,
        };
        assert_eq!(t.total(), 4);
        assert_eq!(t.leader(), Some(1));
        assert_eq!(Tally::default().leader(), None);
    }

    #[test]
    fn test_markdown_transcript() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut names = DisplayNames::default();
        names.insert(a, "Ada");
        names.insert(b, "Brutus");

        let mut state = TopicExecutionState::new(0, "Tabs or spaces", 1, a, b);
        state.advance(TopicStatus::Debating).unwrap();
        state.append_exchange(a, "Tabs.").unwrap();
        state.append_exchange(b, "Spaces.").unwrap();
        state.advance(TopicStatus::Judging).unwrap();
        state.conclude(Verdict::new(Some(b), "Consistency")).unwrap();

        let debate = DebateResult::new(
            1,
            vec![TopicResult::from(state)],
            Tally {
                speaker1_wins: 0,
                speaker2_wins: 1,
                ties: 0,
            },
        );
        let md = debate.to_markdown(&names);
        assert!(md.contains("## Topic 1: Tabs or spaces"));
        assert!(md.contains("**Ada** (turn 1)"));
        assert!(md.contains("**Verdict:** Brutus"));
        assert_eq!(debate.judged_count(), 1);
        assert_eq!(debate.abandoned_count(), 0);
    }
}
