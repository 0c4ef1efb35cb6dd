//! Topic executor - runs one topic from opening statement to verdict

use std::sync::Arc;

use agon_adversarial::Judge;
use agon_core::{Participant, ParticipantId, TopicExecutionState, TopicStatus};
use agon_llm::{ChatMessage, LlmError, LlmProvider, LlmRequest};
use futures::StreamExt;

use crate::error::{TopicError, TopicFailure};
use crate::human::{HumanContext, HumanGate};
use crate::observer::MatchObserver;

/// Human slot bound to a participant
#[derive(Debug, Clone)]
pub struct HumanSeat {
    pub participant: ParticipantId,
    pub gate: HumanGate,
}

/// Runs topic state machines for one debate.
///
/// Participants are snapshotted at construction, so strategy text cannot
/// change while a debate is in flight.
pub struct TopicExecutor<L: LlmProvider + ?Sized> {
    llm: Arc<L>,
    judge: Judge<L>,
    participants: [Participant; 2],
    human: Option<HumanSeat>,
    observer: Arc<dyn MatchObserver>,
}

impl<L: LlmProvider + ?Sized> TopicExecutor<L> {
    pub fn new(
        llm: Arc<L>,
        judge: Judge<L>,
        participants: [Participant; 2],
        observer: Arc<dyn MatchObserver>,
    ) -> Self {
        Self {
            llm,
            judge,
            participants,
            human: None,
            observer,
        }
    }

    pub fn with_human(mut self, seat: HumanSeat) -> Self {
        self.human = Some(seat);
        self
    }

    fn participant(&self, id: ParticipantId) -> &Participant {
        if self.participants[1].id == id {
            &self.participants[1]
        } else {
            &self.participants[0]
        }
    }

    fn human_seat(&self, id: ParticipantId) -> Option<&HumanSeat> {
        self.human.as_ref().filter(|seat| seat.participant == id)
    }

    fn emit(&self, state: &TopicExecutionState) {
        self.observer.on_topic_state_change(state);
    }

    /// Run the topic to completion.
    ///
    /// On failure the state reached so far is returned with the error; an
    /// exchange whose generation failed is never appended.
    pub async fn run(&self, state: TopicExecutionState) -> Result<TopicExecutionState, TopicFailure> {
        let mut state = state;
        match self.drive(&mut state).await {
            Ok(()) => Ok(state),
            Err(error) => {
                tracing::warn!(
                    topic = state.topic_index,
                    exchanges = state.exchanges.len(),
                    error = %error,
                    "Topic failed"
                );
                Err(TopicFailure { state, error })
            }
        }
    }

    async fn drive(&self, state: &mut TopicExecutionState) -> Result<(), TopicError> {
        self.emit(state);
        state.advance(TopicStatus::Debating)?;
        self.emit(state);

        while !state.all_turns_played() {
            let speaker = state.expected_speaker();
            state.begin_exchange(speaker)?;
            self.emit(state);

            let message = match self.human_seat(speaker) {
                Some(seat) => self.human_turn(state, seat).await?,
                None => self.ai_turn(state, speaker).await?,
            };
            state.append_exchange(speaker, &message)?;
            self.emit(state);

            // Pace the pipeline so the human reads each reply before acting
            let opponent = self.opponent_of(state, speaker);
            if let Some(seat) = self.human_seat(opponent) {
                let context = HumanContext::from_state(state, seat.participant);
                seat.gate.wait_for_continue(context).await?;
            }
        }

        state.advance(TopicStatus::Judging)?;
        self.emit(state);

        let verdict = self
            .judge
            .judge(
                state.topic_index,
                &state.topic,
                &state.exchanges,
                state.speakers[0],
                state.speakers[1],
            )
            .await?;
        state.conclude(verdict)?;
        self.emit(state);
        Ok(())
    }

    fn opponent_of(&self, state: &TopicExecutionState, speaker: ParticipantId) -> ParticipantId {
        if state.speakers[0] == speaker {
            state.speakers[1]
        } else {
            state.speakers[0]
        }
    }

    async fn ai_turn(
        &self,
        state: &mut TopicExecutionState,
        speaker: ParticipantId,
    ) -> Result<String, TopicError> {
        let me = self.participant(speaker);
        let opponent = self.participant(self.opponent_of(state, speaker));

        let system = format!(
            "You are {}, debating {}.\nTopic: {}\n\nYour approach:\n{}\n\n\
             Argue your side persuasively in under 200 words.",
            me.name, opponent.name, state.topic, me.strategy
        );
        let history: Vec<ChatMessage> = state
            .exchanges
            .iter()
            .map(|e| {
                if e.speaker == speaker {
                    ChatMessage::assistant(&e.message)
                } else {
                    ChatMessage::user(&e.message)
                }
            })
            .collect();
        let prompt = if state.exchanges.is_empty() {
            format!("Turn 1 of {}: open the debate.", state.turns_per_topic)
        } else {
            format!(
                "Turn {} of {}: answer your opponent and advance your position.",
                state.turn, state.turns_per_topic
            )
        };

        let request = LlmRequest::with_role(&system, &prompt)
            .history(history)
            .model(&me.model);
        let mut stream = self.llm.stream(request).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            state.push_chunk(&chunk);
            self.observer.on_topic_stream_chunk(state.topic_index, &chunk);
        }

        let message = state.streaming_text.trim().to_string();
        if message.is_empty() {
            return Err(LlmError::InvalidResponse("empty argument".to_string()).into());
        }
        Ok(message)
    }

    async fn human_turn(
        &self,
        state: &TopicExecutionState,
        seat: &HumanSeat,
    ) -> Result<String, TopicError> {
        let context = HumanContext::from_state(state, seat.participant);
        let raw = seat.gate.request_input(context).await?;
        self.polish(state, seat.participant, &raw).await
    }

    /// Expand a person's rough notes into a full argument in their voice
    async fn polish(
        &self,
        state: &TopicExecutionState,
        speaker: ParticipantId,
        raw: &str,
    ) -> Result<String, TopicError> {
        let me = self.participant(speaker);
        let system = format!(
            "You edit debate arguments for {}.\nTopic: {}\n\n\
             Expand their notes into a clear argument. Keep every point and the position \
             they take; add nothing they did not imply.",
            me.name, state.topic
        );
        let request = LlmRequest::with_role(&system, raw.trim()).model(&me.model);
        let polished = self.llm.complete(request).await?.content.trim().to_string();
        if polished.is_empty() {
            return Ok(raw.trim().to_string());
        }
        Ok(polished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_llm::MockProvider;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<TopicStatus>>,
        chunks: Mutex<Vec<String>>,
    }

    impl MatchObserver for Recorder {
        fn on_topic_state_change(&self, state: &TopicExecutionState) {
            self.statuses.lock().unwrap().push(state.status);
        }

        fn on_topic_stream_chunk(&self, _topic_index: usize, chunk: &str) {
            self.chunks.lock().unwrap().push(chunk.to_string());
        }
    }

    fn executor(llm: Arc<MockProvider>, observer: Arc<Recorder>) -> (TopicExecutor<MockProvider>, [Participant; 2]) {
        let participants = [Participant::new("Ada", "m"), Participant::new("Brutus", "m")];
        let executor = TopicExecutor::new(
            llm.clone(),
            Judge::new(llm),
            participants.clone(),
            observer,
        );
        (executor, participants)
    }

    #[tokio::test]
    async fn test_topic_runs_to_verdict() {
        let observer = Arc::new(Recorder::default());
        let llm = Arc::new(MockProvider::smart().with_latency(0));
        let (executor, p) = executor(llm, observer.clone());

        let state = TopicExecutionState::new(0, "Cats vs dogs", 2, p[1].id, p[0].id);
        let done = executor.run(state).await.unwrap();

        assert_eq!(done.status, TopicStatus::Complete);
        assert_eq!(done.exchanges.len(), 4);
        assert_eq!(done.exchanges[0].speaker, p[1].id);
        assert!(done.exchanges.iter().all(|e| e.message.contains("Cats vs dogs")));
        assert!(done.verdict.is_some());

        let statuses = observer.statuses.lock().unwrap();
        assert_eq!(statuses.first(), Some(&TopicStatus::Pending));
        assert_eq!(statuses.last(), Some(&TopicStatus::Complete));
        assert!(!observer.chunks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_second_turn_keeps_first_turn_only() {
        let observer = Arc::new(Recorder::default());
        // Calls 0 and 1 are turn 1; call 2 opens turn 2
        let llm = Arc::new(MockProvider::smart().with_latency(0).fail_on_calls(&[2]));
        let (executor, p) = executor(llm, observer.clone());

        let state = TopicExecutionState::new(0, "Tabs vs spaces", 2, p[0].id, p[1].id);
        let failure = executor.run(state).await.unwrap_err();

        assert_eq!(failure.state.exchanges.len(), 2);
        assert!(failure.state.exchanges.iter().all(|e| e.turn == 1));
        assert_eq!(failure.state.status, TopicStatus::Debating);
        assert!(matches!(failure.error, TopicError::Llm(_)));
        assert!(!observer
            .statuses
            .lock()
            .unwrap()
            .contains(&TopicStatus::Judging));
    }
}
