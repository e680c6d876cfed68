//! Conversation turn handling

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{extract_answer, WorkflowClient};
use crate::types::Transcript;

/// Observable state of the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Nothing in flight; the last turn (if any) has been rendered
    Settled,
    /// A request is in flight. There is no cancellation path out of this state.
    AwaitingResponse,
}

/// What the user sees when a turn settles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Assistant text, also appended to the transcript
    Answer(String),
    /// Error message to render; the transcript keeps only the user turn
    Failed(String),
}

/// One chat session: a transcript plus the workflow that answers it
pub struct ChatSession {
    client: Arc<dyn WorkflowClient>,
    transcript: Transcript,
    state: TurnState,
}

impl ChatSession {
    pub fn new(client: Arc<dyn WorkflowClient>) -> Self {
        Self {
            client,
            transcript: Transcript::new(),
            state: TurnState::Settled,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Empty the transcript
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Handle one user utterance.
    ///
    /// Only the utterance is sent, not the history. Failures are caught and
    /// returned as [`TurnOutcome::Failed`] so the session can continue.
    pub async fn handle_turn(&mut self, utterance: &str) -> TurnOutcome {
        let pending = self.begin_turn(utterance);
        let result = pending.response().await;
        self.finish_turn(result)
    }

    /// Record the user turn and move to [`TurnState::AwaitingResponse`].
    ///
    /// The returned request borrows nothing from the session, so callers can
    /// observe the state while it is in flight.
    pub fn begin_turn(&mut self, utterance: &str) -> PendingTurn {
        self.transcript.push_user(utterance);
        self.state = TurnState::AwaitingResponse;
        PendingTurn {
            client: Arc::clone(&self.client),
            utterance: utterance.to_string(),
        }
    }

    /// Settle the in-flight turn with the workflow result
    pub fn finish_turn(&mut self, result: Result<String>) -> TurnOutcome {
        self.state = TurnState::Settled;
        match result {
            Ok(answer) => {
                self.transcript.push_assistant(answer.clone());
                TurnOutcome::Answer(answer)
            }
            Err(e) => {
                tracing::warn!("{} turn failed: {}", self.client.name(), e);
                TurnOutcome::Failed(format!("Error: {e}"))
            }
        }
    }
}

/// A workflow request started by [`ChatSession::begin_turn`]
pub struct PendingTurn {
    client: Arc<dyn WorkflowClient>,
    utterance: String,
}

impl PendingTurn {
    /// Run the workflow and extract the assistant text
    pub async fn response(self) -> Result<String> {
        let response = self.client.run(&self.utterance).await?;
        extract_answer(&response)
    }
}
