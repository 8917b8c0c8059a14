mod backend;
pub mod fsm;
mod session;
pub mod view;

pub use backend::{ChatBackend, ProxyBackend, StreamingProxyBackend};
pub use fsm::{TurnEvent, TurnState, TurnStateMachine};
pub use session::{ChatSession, FAILURE_REPLY};
pub use view::{Bubble, ChatView, Sender};
