// Per-user dialogue state machine and turn orchestration

mod service;
mod session;
mod store;

pub use service::{
    is_affirmative, ChatService, HistoryExport, ServiceSettings, TurnOutcome, TurnRequest,
    AFFIRMATIVE_REPLIES, DECLINE_MESSAGE, WELCOME_MESSAGE,
};
pub use session::{DialogueState, Session, Turn, MAX_HISTORY_TURNS};
pub use store::{SessionHandle, SessionStore};
