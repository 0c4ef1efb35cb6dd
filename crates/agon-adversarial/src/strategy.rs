//! Strategy update service
//!
//! After each debate a participant records a dated self-assessment in its
//! history. If self-revision is enabled it then rewrites its strategy from
//! the whole history, within a character limit.

use std::sync::Arc;

use agon_core::{DisplayNames, MatchConfig, Participant, TopicResult};
use agon_llm::{LlmError, LlmProvider, LlmRequest};
use agon_persist::{MatchStore, StorageBackend, StorageError};

/// Errors from the learning step
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("Strategy storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Strategy generation failed: {0}")]
    Llm(#[from] LlmError),
}

/// Limits on revised strategy text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyConfig {
    /// Maximum strategy length in characters
    pub max_chars: usize,
    /// Re-requests with an overage note before hard truncation
    pub retry_limit: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::from(&MatchConfig::default())
    }
}

impl From<&MatchConfig> for StrategyConfig {
    fn from(config: &MatchConfig) -> Self {
        Self {
            max_chars: config.max_strategy_chars.max(1),
            retry_limit: config.strategy_retry_limit,
        }
    }
}

/// Outcome of one learning step
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyUpdate {
    /// Self-assessment appended to the history
    pub assessment: String,
    /// New strategy text, if the participant revised itself
    pub revised: Option<String>,
    /// Whether the revision had to be hard-truncated
    pub truncated: bool,
}

/// Turns debate transcripts into history entries and revised strategy
#[derive(Debug)]
pub struct StrategyCoach<L: LlmProvider + ?Sized, B: StorageBackend + ?Sized> {
    llm: Arc<L>,
    store: MatchStore<B>,
    config: StrategyConfig,
}

impl<L: LlmProvider + ?Sized, B: StorageBackend + ?Sized> Clone for StrategyCoach<L, B> {
    fn clone(&self) -> Self {
        Self {
            llm: self.llm.clone(),
            store: self.store.clone(),
            config: self.config,
        }
    }
}

impl<L: LlmProvider + ?Sized, B: StorageBackend + ?Sized> StrategyCoach<L, B> {
    pub fn new(llm: Arc<L>, store: MatchStore<B>) -> Self {
        Self {
            llm,
            store,
            config: StrategyConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StrategyConfig) -> Self {
        self.config = config;
        self
    }

    /// Record the debate in `participant`'s history and optionally revise
    /// its strategy.
    ///
    /// Returns `Ok(None)` for the judge role, which keeps no history.
    pub async fn update_after_debate(
        &self,
        participant: &Participant,
        opponent: &Participant,
        debate_number: u32,
        results: &[TopicResult],
        names: &DisplayNames,
    ) -> Result<Option<StrategyUpdate>, StrategyError> {
        if participant.is_judge() {
            return Ok(None);
        }

        let outcomes = outcome_lines(participant, results);
        let assessment = self.self_assessment(participant, opponent, results, names).await?;
        let body = format!(
            "Opponent: {}\n\n{}\n\n**Self-assessment:** {}",
            opponent.name,
            outcomes.join("\n"),
            assessment.trim()
        );
        self.store
            .append_history(participant, &format!("Debate {}", debate_number), &body)
            .await?;
        metrics::counter!("agon_strategy_updates_total", "kind" => "history").increment(1);

        if !participant.self_revise {
            tracing::debug!(participant = %participant.name, "Self-revision disabled, strategy kept");
            return Ok(Some(StrategyUpdate {
                assessment,
                revised: None,
                truncated: false,
            }));
        }

        let history = self.store.read_history(participant).await?;
        let (strategy, truncated) = self.revise(participant, &history).await?;
        self.store.write_strategy(participant, &strategy).await?;
        metrics::counter!("agon_strategy_updates_total", "kind" => "revision").increment(1);
        tracing::info!(
            participant = %participant.name,
            chars = strategy.chars().count(),
            truncated,
            "Strategy revised"
        );

        Ok(Some(StrategyUpdate {
            assessment,
            revised: Some(strategy),
            truncated,
        }))
    }

    async fn self_assessment(
        &self,
        participant: &Participant,
        opponent: &Participant,
        results: &[TopicResult],
        names: &DisplayNames,
    ) -> Result<String, LlmError> {
        let system = format!(
            "You are {}, a debater reviewing your own performance against {}.",
            participant.name, opponent.name
        );
        let prompt = format!(
            "<transcript>\n{}\n</transcript>\n\n\
             In three or four sentences, assess how you argued: what worked, \
             what the judge rewarded, and what you should do differently.",
            transcript(results, names)
        );
        let request = LlmRequest::with_role(&system, &prompt).model(&participant.model);
        Ok(self.llm.complete(request).await?.content)
    }

    /// Regenerate strategy from the full history, re-requesting with an
    /// overage note until it fits, then hard-truncating.
    async fn revise(
        &self,
        participant: &Participant,
        history: &str,
    ) -> Result<(String, bool), LlmError> {
        let max = self.config.max_chars;
        let system = format!(
            "You are {}, a debater who maintains a written strategy for future debates.",
            participant.name
        );
        let base_prompt = format!(
            "Your current strategy:\n<strategy>\n{}\n</strategy>\n\n\
             Your full debate history:\n<history>\n{}\n</history>\n\n\
             Write your revised strategy. Keep what won, drop what lost, and stay under {} characters. \
             Output only the strategy text.",
            participant.strategy, history, max
        );

        let mut prompt = base_prompt.clone();
        let mut last = String::new();
        for attempt in 0..=self.config.retry_limit {
            let request = LlmRequest::with_role(&system, &prompt).model(&participant.model);
            last = self.llm.complete(request).await?.content.trim().to_string();

            let len = last.chars().count();
            if len <= max {
                return Ok((last, false));
            }
            tracing::warn!(
                participant = %participant.name,
                attempt,
                len,
                max,
                "Revised strategy over limit"
            );
            prompt = format!(
                "{}\n\nYour previous attempt was {} characters, {} over the {} character limit. \
                 Shorten it.",
                base_prompt,
                len,
                len - max,
                max
            );
        }

        metrics::counter!("agon_strategy_truncations_total").increment(1);
        tracing::warn!(participant = %participant.name, max, "Strategy hard-truncated");
        Ok((last.chars().take(max).collect(), true))
    }
}

/// One line per topic from `participant`'s point of view
fn outcome_lines(participant: &Participant, results: &[TopicResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| {
            let outcome = match (&r.verdict, &r.error) {
                (Some(v), _) => match v.winner {
                    Some(w) if w == participant.id => "won",
                    Some(_) => "lost",
                    None => "tie",
                },
                (None, Some(_)) => "abandoned",
                (None, None) => "unjudged",
            };
            format!("- Topic {} ({}): {}", r.topic_index + 1, r.topic, outcome)
        })
        .collect()
}

fn transcript(results: &[TopicResult], names: &DisplayNames) -> String {
    let mut out = String::new();
    for r in results {
        out.push_str(&format!("Topic {}: {}\n", r.topic_index + 1, r.topic));
        for e in &r.exchanges {
            out.push_str(&format!("{}: {}\n", names.name_of(&e.speaker), e.message.trim()));
        }
        match &r.verdict {
            Some(v) => {
                let winner = v.winner.map(|w| names.name_of(&w)).unwrap_or("tie");
                out.push_str(&format!("Verdict: {} ({})\n\n", winner, v.rationale));
            }
            None => out.push_str("Verdict: none\n\n"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_core::Verdict;
    use agon_llm::MockProvider;
    use agon_persist::MemoryBackend;

    fn result(index: usize, winner: Option<agon_core::ParticipantId>) -> TopicResult {
        TopicResult {
            topic_index: index,
            topic: format!("Topic {}", index),
            first_speaker: uuid::Uuid::new_v4(),
            exchanges: vec![],
            verdict: Some(Verdict::new(winner, "because")),
            error: None,
        }
    }

    #[test]
    fn test_outcome_lines() {
        let p = Participant::new("Ada", "m");
        let lines = outcome_lines(
            &p,
            &[
                result(0, Some(p.id)),
                result(1, Some(uuid::Uuid::new_v4())),
                result(2, None),
            ],
        );
        assert_eq!(
            lines,
            vec![
                "- Topic 1 (Topic 0): won",
                "- Topic 2 (Topic 1): lost",
                "- Topic 3 (Topic 2): tie",
            ]
        );
    }

    #[tokio::test]
    async fn test_overlong_strategy_is_retried_then_truncated() {
        let llm = Arc::new(MockProvider::constant(&"x".repeat(50)));
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let coach = StrategyCoach::new(llm.clone(), store).with_config(StrategyConfig {
            max_chars: 10,
            retry_limit: 2,
        });

        let p = Participant::new("Ada", "m");
        let (strategy, truncated) = coach.revise(&p, "history").await.unwrap();
        assert!(truncated);
        assert_eq!(strategy.len(), 10);
        assert_eq!(llm.call_count(), 3);

        let requests = llm.requests();
        assert!(requests[1].prompt.contains("40 over the 10 character limit"));
    }

    #[tokio::test]
    async fn test_retry_stops_once_within_limit() {
        let llm = Arc::new(MockProvider::new(vec![
            "far too long strategy text".to_string(),
            "short".to_string(),
        ]));
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let coach = StrategyCoach::new(llm.clone(), store).with_config(StrategyConfig {
            max_chars: 10,
            retry_limit: 3,
        });

        let (strategy, truncated) = coach
            .revise(&Participant::new("Ada", "m"), "h")
            .await
            .unwrap();
        assert_eq!(strategy, "short");
        assert!(!truncated);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_judge_is_exempt() {
        let llm = Arc::new(MockProvider::smart());
        let coach = StrategyCoach::new(llm.clone(), MatchStore::new(Arc::new(MemoryBackend::new())));
        let judge = Participant::judge("m");
        let update = coach
            .update_after_debate(&judge, &Participant::new("Ada", "m"), 1, &[], &DisplayNames::default())
            .await
            .unwrap();
        assert!(update.is_none());
        assert_eq!(llm.call_count(), 0);
    }
}
