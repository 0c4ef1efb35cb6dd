//! Human-in-the-loop suspension
//!
//! The executor owns the receiving half of every rendezvous: it sends a
//! [`HumanPrompt`] carrying a oneshot sender to the external interface and
//! parks until that sender is used or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agon_core::{Exchange, ParticipantId, TopicExecutionState};
use tokio::sync::{mpsc, oneshot};

use crate::error::HumanError;

/// What the person needs to see before acting
#[derive(Debug, Clone, PartialEq)]
pub struct HumanContext {
    pub topic_index: usize,
    pub topic: String,
    /// Turn the human is about to play, or has just seen answered
    pub turn: u32,
    pub turns_per_topic: u32,
    pub transcript: Vec<Exchange>,
    pub opponent_last: Option<String>,
}

impl HumanContext {
    pub fn from_state(state: &TopicExecutionState, human: ParticipantId) -> Self {
        Self {
            topic_index: state.topic_index,
            topic: state.topic.clone(),
            turn: state.expected_turn().min(state.turns_per_topic),
            turns_per_topic: state.turns_per_topic,
            transcript: state.exchanges.clone(),
            opponent_last: state
                .last_message_from_opponent_of(human)
                .map(|e| e.message.clone()),
        }
    }
}

/// A pending request for the external interface
#[derive(Debug)]
pub enum HumanPrompt {
    /// The human's next message is required; reply with the raw text or a rejection
    Input {
        context: HumanContext,
        reply: oneshot::Sender<Result<String, String>>,
    },
    /// The opponent has spoken; acknowledge once it has been read
    Continue {
        context: HumanContext,
        ack: oneshot::Sender<Result<(), String>>,
    },
}

impl HumanPrompt {
    pub fn context(&self) -> &HumanContext {
        match self {
            Self::Input { context, .. } | Self::Continue { context, .. } => context,
        }
    }
}

/// Sending side of the human rendezvous for one human slot
#[derive(Debug, Clone)]
pub struct HumanGate {
    tx: mpsc::UnboundedSender<HumanPrompt>,
    pending: Arc<AtomicBool>,
}

/// Clears the pending flag however the wait ends
struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl HumanGate {
    /// Create a gate and the receiver the interface reads prompts from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HumanPrompt>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                pending: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    /// Whether a prompt is currently awaiting the human
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> Result<PendingGuard, HumanError> {
        self.pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| HumanError::AlreadyPending)?;
        Ok(PendingGuard(self.pending.clone()))
    }

    /// Suspend until the human supplies their next message
    pub async fn request_input(&self, context: HumanContext) -> Result<String, HumanError> {
        let _guard = self.acquire()?;
        let (reply, rx) = oneshot::channel();
        tracing::debug!(topic = context.topic_index, turn = context.turn, "Awaiting human input");
        self.tx
            .send(HumanPrompt::Input { context, reply })
            .map_err(|_| HumanError::Disconnected)?;
        match rx.await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(reason)) => Err(HumanError::Rejected(reason)),
            Err(_) => Err(HumanError::Disconnected),
        }
    }

    /// Suspend until the human acknowledges the opponent's message
    pub async fn wait_for_continue(&self, context: HumanContext) -> Result<(), HumanError> {
        let _guard = self.acquire()?;
        let (ack, rx) = oneshot::channel();
        tracing::debug!(topic = context.topic_index, "Awaiting human acknowledgement");
        self.tx
            .send(HumanPrompt::Continue { context, ack })
            .map_err(|_| HumanError::Disconnected)?;
        match rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(HumanError::Rejected(reason)),
            Err(_) => Err(HumanError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> HumanContext {
        HumanContext {
            topic_index: 0,
            topic: "Cats vs dogs".into(),
            turn: 1,
            turns_per_topic: 1,
            transcript: vec![],
            opponent_last: None,
        }
    }

    #[tokio::test]
    async fn test_input_roundtrip() {
        let (gate, mut rx) = HumanGate::channel();
        let ui = tokio::spawn(async move {
            match rx.recv().await {
                Some(HumanPrompt::Input { reply, context }) => {
                    assert_eq!(context.topic, "Cats vs dogs");
                    reply.send(Ok("dogs, obviously".into())).unwrap();
                }
                other => panic!("unexpected prompt: {:?}", other),
            }
        });
        assert_eq!(gate.request_input(context()).await.unwrap(), "dogs, obviously");
        assert!(!gate.is_pending());
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn test_second_request_while_pending_is_refused() {
        let (gate, mut rx) = HumanGate::channel();
        let first_gate = gate.clone();
        let first = tokio::spawn(async move { first_gate.request_input(context()).await });

        let prompt = rx.recv().await.unwrap();
        assert!(gate.is_pending());
        assert_eq!(
            gate.wait_for_continue(context()).await,
            Err(HumanError::AlreadyPending)
        );

        if let HumanPrompt::Input { reply, .. } = prompt {
            reply.send(Ok("done".into())).unwrap();
        }
        assert_eq!(first.await.unwrap().unwrap(), "done");
        assert!(!gate.is_pending());
    }

    #[tokio::test]
    async fn test_rejection_and_disconnect() {
        let (gate, mut rx) = HumanGate::channel();
        let ui = tokio::spawn(async move {
            if let Some(HumanPrompt::Continue { ack, .. }) = rx.recv().await {
                ack.send(Err("timed out".into())).unwrap();
            }
            // Dropping the receiver disconnects the gate
        });
        assert_eq!(
            gate.wait_for_continue(context()).await,
            Err(HumanError::Rejected("timed out".into()))
        );
        ui.await.unwrap();
        assert_eq!(
            gate.request_input(context()).await,
            Err(HumanError::Disconnected)
        );
    }
}
