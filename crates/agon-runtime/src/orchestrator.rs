//! Match orchestrator - drives sequential debates, learning and persistence

use std::sync::Arc;

use agon_adversarial::{calculate_tally, Judge, StrategyCoach, StrategyConfig};
use agon_core::{DebateResult, Match, Side, TopicExecutionState, TopicResult};
use agon_llm::{LlmProvider, LlmRequest};
use agon_persist::{MatchStore, StorageBackend};
use agon_queue::TaskPool;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::error::OrchestratorError;
use crate::executor::{HumanSeat, TopicExecutor};
use crate::human::HumanGate;
use crate::observer::{MatchObserver, NoopObserver};
use crate::topics::{LlmTopicGenerator, TopicGenerator};

/// Outcome of running a match, complete or not
#[derive(Debug)]
pub struct MatchReport {
    pub m: Match,
    pub summary: Option<String>,
    /// The failure that stopped the debate loop early, if any
    pub aborted: Option<OrchestratorError>,
}

impl MatchReport {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.m.is_finished()
    }
}

/// Orchestrator runs matches against one completion service and one store
pub struct MatchOrchestrator<L: LlmProvider + ?Sized + 'static, B: StorageBackend + ?Sized> {
    llm: Arc<L>,
    store: MatchStore<B>,
    topics: Arc<dyn TopicGenerator>,
    observer: Arc<dyn MatchObserver>,
    human: Option<HumanGate>,
    judge_model: Option<String>,
}

impl<L: LlmProvider + ?Sized + 'static, B: StorageBackend + ?Sized> MatchOrchestrator<L, B> {
    /// Create an orchestrator with LLM-generated topics and no observer
    pub fn new(llm: Arc<L>, store: MatchStore<B>) -> Self {
        Self {
            topics: Arc::new(LlmTopicGenerator::new(llm.clone())),
            llm,
            store,
            observer: Arc::new(NoopObserver),
            human: None,
            judge_model: None,
        }
    }

    pub fn with_topic_generator(mut self, topics: Arc<dyn TopicGenerator>) -> Self {
        self.topics = topics;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Gate used for the human-controlled side, if the match has one
    pub fn with_human_gate(mut self, gate: HumanGate) -> Self {
        self.human = Some(gate);
        self
    }

    pub fn with_judge_model(mut self, model: &str) -> Self {
        self.judge_model = Some(model.to_string());
        self
    }

    pub fn store(&self) -> &MatchStore<B> {
        &self.store
    }

    /// Persist a new match and play it.
    ///
    /// Only failures before the first debate are returned as `Err`; later
    /// failures end the loop and are carried in [`MatchReport::aborted`].
    pub async fn start(&self, mut m: Match) -> Result<MatchReport, OrchestratorError> {
        m.config.validate()?;
        self.check_human(&m)?;
        self.store.create_match(&mut m).await?;
        info!(match_slug = %m.slug, debates = m.config.debates, "Match started");
        Ok(self.run(m).await)
    }

    /// Continue a stored match from its first incomplete debate.
    ///
    /// Returns `Ok(None)` if no usable match is stored under `slug`.
    pub async fn resume(&self, slug: &str) -> Result<Option<MatchReport>, OrchestratorError> {
        let m = match self.store.load_match(slug).await? {
            Some(m) => m,
            None => {
                warn!(match_slug = %slug, "No resumable match found");
                return Ok(None);
            }
        };
        m.config.validate()?;
        self.check_human(&m)?;
        info!(
            match_slug = %m.slug,
            completed = m.current_debate,
            pending_learning = m.pending_learning.is_some(),
            total = m.config.debates,
            "Match resumed"
        );
        Ok(Some(self.run(m).await))
    }

    fn check_human(&self, m: &Match) -> Result<(), OrchestratorError> {
        if m.config.human_side.is_some() && self.human.is_none() {
            return Err(OrchestratorError::HumanGateMissing);
        }
        Ok(())
    }

    async fn run(&self, mut m: Match) -> MatchReport {
        self.observer.on_match_start(&m);

        let aborted = match self.play_debates(&mut m).await {
            Ok(()) => None,
            Err(e) => {
                error!(match_slug = %m.slug, error = %e, "Match aborted");
                self.observer.on_error(&e);
                Some(e)
            }
        };

        let summary = self.summarize(&m).await;
        self.observer.on_match_end(&m, summary.as_deref());
        MatchReport {
            m,
            summary,
            aborted,
        }
    }

    async fn play_debates(&self, m: &mut Match) -> Result<(), OrchestratorError> {
        if let Some(debate) = m.pending_learning.take() {
            info!(match_slug = %m.slug, debate = debate.number, "Finishing interrupted learning");
            self.finish_debate(m, debate).await?;
        }

        while let Some(number) = m.next_debate_number() {
            self.observer.on_debate_start(m, number);
            info!(match_slug = %m.slug, debate = number, "Debate started");

            let topics = self
                .topics
                .generate(
                    &m.participants,
                    m.config.topics_per_debate as usize,
                    &m.config.focus,
                )
                .await
                .map_err(OrchestratorError::TopicGeneration)?;

            let results = self.run_topics(m, &topics).await;
            if !results.is_empty() && results.iter().all(TopicResult::is_abandoned) {
                return Err(OrchestratorError::AllTopicsFailed { debate: number });
            }

            let tally = calculate_tally(
                results.iter().filter_map(|r| r.verdict.as_ref()),
                m.participants[0].id,
                m.participants[1].id,
            );
            let debate = DebateResult::new(number, results, tally);
            self.store.save_debate(m, &debate).await?;
            info!(
                match_slug = %m.slug,
                debate = number,
                speaker1_wins = tally.speaker1_wins,
                speaker2_wins = tally.speaker2_wins,
                ties = tally.ties,
                "Debate complete"
            );
            self.observer.on_debate_end(m, &debate);
            self.finish_debate(m, debate).await?;
        }
        Ok(())
    }

    /// Learn from a persisted debate, then mark it complete in match.json
    async fn finish_debate(
        &self,
        m: &mut Match,
        debate: DebateResult,
    ) -> Result<(), OrchestratorError> {
        self.observer.on_learning(m, debate.number);
        self.learn(m, &debate).await;

        m.record_debate(debate)?;
        self.store.save_match(m).await?;
        Ok(())
    }

    /// Execute every topic through the pool; results keep topic order
    async fn run_topics(&self, m: &Match, topics: &[String]) -> Vec<TopicResult> {
        let mut judge = Judge::new(self.llm.clone());
        if let Some(model) = &self.judge_model {
            judge = judge.with_model(model);
        }
        let mut executor = TopicExecutor::new(
            self.llm.clone(),
            judge,
            m.participants.clone(),
            self.observer.clone(),
        );
        if let (Some(participant), Some(gate)) = (m.human_id(), &self.human) {
            executor = executor.with_human(HumanSeat {
                participant,
                gate: gate.clone(),
            });
        }
        let executor = Arc::new(executor);

        let pool = TaskPool::new(m.effective_concurrency());
        let handles: Vec<_> = topics
            .iter()
            .enumerate()
            .map(|(index, topic)| {
                let (first, second) = m.speaking_order(index);
                let state =
                    TopicExecutionState::new(index, topic, m.config.turns_per_topic, first, second);
                let executor = executor.clone();
                pool.submit(async move { executor.run(state).await })
            })
            .collect();

        let outcomes = join_all(handles).await;
        let mut results = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let result = match outcome {
                Ok(Ok(state)) => TopicResult::from(state),
                Ok(Err(failure)) => {
                    let err = OrchestratorError::Topic {
                        index,
                        source: failure.error,
                    };
                    self.observer.on_error(&err);
                    TopicResult::abandoned(failure.state, &err.to_string())
                }
                Err(lost) => {
                    let err = OrchestratorError::TopicLost {
                        index,
                        source: lost,
                    };
                    self.observer.on_error(&err);
                    let (first, second) = m.speaking_order(index);
                    let state = TopicExecutionState::new(
                        index,
                        &topics[index],
                        m.config.turns_per_topic,
                        first,
                        second,
                    );
                    TopicResult::abandoned(state, &err.to_string())
                }
            };
            results.push(result);
        }
        results
    }

    /// Update both participants in parallel; failures are reported, never raised
    async fn learn(&self, m: &mut Match, debate: &DebateResult) {
        let coach = StrategyCoach::new(self.llm.clone(), self.store.clone())
            .with_config(StrategyConfig::from(&m.config));
        let names = m.display_names();

        let (update_a, update_b) = {
            let [a, b] = &m.participants;
            tokio::join!(
                coach.update_after_debate(a, b, debate.number, &debate.topics, &names),
                coach.update_after_debate(b, a, debate.number, &debate.topics, &names),
            )
        };

        for (side, update) in [(Side::A, update_a), (Side::B, update_b)] {
            match update {
                Ok(Some(update)) => {
                    if let Some(strategy) = update.revised {
                        m.participant_mut(side).strategy = strategy;
                    }
                }
                Ok(None) => {}
                Err(source) => {
                    let err = OrchestratorError::Learning {
                        participant: m.participant(side).name.clone(),
                        source,
                    };
                    warn!(match_slug = %m.slug, error = %err, "Strategy update failed");
                    self.observer.on_error(&err);
                }
            }
        }
    }

    /// Best-effort match summary; never fails the match
    async fn summarize(&self, m: &Match) -> Option<String> {
        if m.debates.is_empty() {
            return None;
        }

        let names = m.display_names();
        let mut record = String::new();
        for debate in &m.debates {
            record.push_str(&format!(
                "Debate {}: {} {} - {} {} ({} ties)\n",
                debate.number,
                m.participants[0].name,
                debate.tally.speaker1_wins,
                debate.tally.speaker2_wins,
                m.participants[1].name,
                debate.tally.ties
            ));
            for topic in &debate.topics {
                let outcome = match (&topic.verdict, &topic.error) {
                    (Some(v), _) => v
                        .winner
                        .map(|w| format!("won by {}", names.name_of(&w)))
                        .unwrap_or_else(|| "tied".to_string()),
                    (None, _) => "abandoned".to_string(),
                };
                record.push_str(&format!("  - {}: {}\n", topic.topic, outcome));
            }
        }

        let prompt = format!(
            "Summarize this match between {} and {} in one short paragraph. \
             Say who came out ahead and how their play changed across debates.\n\n{}",
            m.participants[0].name, m.participants[1].name, record
        );
        let mut request = LlmRequest::with_role("You are a sports-style debate commentator.", &prompt);
        if let Some(model) = &self.judge_model {
            request = request.model(model);
        }

        let summary = match self.llm.complete(request).await {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                warn!(match_slug = %m.slug, error = %e, "Match summary failed");
                return None;
            }
        };
        let document = format!("# {}\n\n{}\n\n## Record\n\n{}", m.slug, summary, record);
        if let Err(e) = self.store.write_summary(&m.slug, &document).await {
            warn!(match_slug = %m.slug, error = %e, "Could not persist match summary");
        }
        Some(summary)
    }
}
