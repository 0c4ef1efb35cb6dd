//! Callback surface driven by the orchestrator

use agon_core::{DebateResult, Match, TopicExecutionState};

use crate::error::OrchestratorError;

/// Receives match progress. Every method defaults to a no-op.
///
/// Callbacks run on the orchestrator's tasks and should return quickly.
pub trait MatchObserver: Send + Sync {
    fn on_match_start(&self, _m: &Match) {}

    fn on_debate_start(&self, _m: &Match, _number: u32) {}

    fn on_debate_end(&self, _m: &Match, _debate: &DebateResult) {}

    /// Fired after the summary step, whether or not the match completed
    fn on_match_end(&self, _m: &Match, _summary: Option<&str>) {}

    /// Fired on every topic state mutation
    fn on_topic_state_change(&self, _state: &TopicExecutionState) {}

    fn on_topic_stream_chunk(&self, _topic_index: usize, _chunk: &str) {}

    /// Fired once per debate when strategy updates begin
    fn on_learning(&self, _m: &Match, _debate_number: u32) {}

    /// Fired for failures the match survives as well as fatal ones
    fn on_error(&self, _error: &OrchestratorError) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {}
