use crate::{Error, Result};
use tracing::{debug, warn};

/// Where a single chat turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    TypingIndicatorShown,
    Received,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    Submit,
    ShowTyping,
    ReplyArrived,
    RequestFailed,
    Acknowledge,
}

pub struct TurnStateMachine {
    state: TurnState,
}

impl Default for TurnStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnStateMachine {
    pub fn new() -> Self {
        Self {
            state: TurnState::Idle,
        }
    }

    pub fn current_state(&self) -> TurnState {
        self.state
    }

    pub fn transition(&mut self, event: TurnEvent) -> Result<TurnState> {
        let new_state = match (self.state, event) {
            (TurnState::Idle, TurnEvent::Submit) => TurnState::Sending,
            (TurnState::Sending, TurnEvent::ShowTyping) => TurnState::TypingIndicatorShown,
            (TurnState::TypingIndicatorShown, TurnEvent::ReplyArrived) => TurnState::Received,
            (TurnState::TypingIndicatorShown, TurnEvent::RequestFailed) => TurnState::Failed,
            (TurnState::Received | TurnState::Failed, TurnEvent::Acknowledge) => TurnState::Idle,
            _ => {
                warn!(
                    "Invalid turn transition from {:?} with event {:?}",
                    self.state, event
                );
                return Err(Error::fsm(format!(
                    "Invalid transition from {:?} with event {:?}",
                    self.state, event
                )));
            }
        };

        debug!(
            "Turn state transition: {:?} -> {:?} (event: {:?})",
            self.state, new_state, event
        );
        self.state = new_state;
        Ok(new_state)
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.state, TurnState::Idle)
    }
}
