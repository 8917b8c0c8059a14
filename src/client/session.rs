use super::{
    backend::ChatBackend,
    fsm::{TurnEvent, TurnState, TurnStateMachine},
    view::{ChatView, Sender},
};
use crate::Result;
use tracing::{info, warn};

/// Shown for every failed turn; error detail stays in the logs.
pub const FAILURE_REPLY: &str = "Sorry, something went wrong. Please try again.";

pub struct ChatSession<B> {
    backend: B,
    view: ChatView,
    fsm: TurnStateMachine,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            view: ChatView::new(),
            fsm: TurnStateMachine::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub fn state(&self) -> TurnState {
        self.fsm.current_state()
    }

    /// Renders the user's message and the typing placeholder. Returns the
    /// trimmed message to send, or `None` for blank input.
    pub fn begin_turn(&mut self, input: &str) -> Result<Option<String>> {
        let message = input.trim();
        if message.is_empty() {
            return Ok(None);
        }

        self.fsm.transition(TurnEvent::Submit)?;
        self.view.display_message(message, Sender::User);
        self.view.display_typing_indicator();
        self.fsm.transition(TurnEvent::ShowTyping)?;

        Ok(Some(message.to_string()))
    }

    /// Replaces the placeholder with the reply, or with the fixed apology.
    pub fn finish_turn(&mut self, outcome: Result<String>) -> Result<()> {
        self.view.remove_typing_indicator();

        match outcome {
            Ok(reply) => {
                self.fsm.transition(TurnEvent::ReplyArrived)?;
                self.view.display_message(reply, Sender::Ai);
            }
            Err(e) => {
                warn!("Chat turn failed: {}", e);
                self.fsm.transition(TurnEvent::RequestFailed)?;
                self.view.display_message(FAILURE_REPLY, Sender::Ai);
            }
        }

        self.fsm.transition(TurnEvent::Acknowledge)?;
        Ok(())
    }

    /// Runs one full turn. Returns `false` when the input was blank.
    pub async fn send(&mut self, input: &str) -> Result<bool> {
        let Some(message) = self.begin_turn(input)? else {
            return Ok(false);
        };

        info!("Sending chat message of {} bytes", message.len());
        let outcome = self.backend.send(&message).await;
        self.finish_turn(outcome)?;

        Ok(true)
    }
}
