// Per-user conversation state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Most recent turns kept per session
pub const MAX_HISTORY_TURNS: usize = 10;

/// One request/response exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

/// Consent-gating state of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogueState {
    #[default]
    Idle,
    /// An exercise suggestion is held back until the user agrees to it.
    /// `pending` is never empty.
    AwaitingConfirmation { pending: String },
}

#[derive(Debug, Clone)]
pub struct Session {
    history: VecDeque<Turn>,
    state: DialogueState,
    /// Turns ever appended, unaffected by eviction. Drives banner cooldown.
    turns_completed: u64,
    last_warning_turn: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            history: VecDeque::with_capacity(MAX_HISTORY_TURNS + 1),
            state: DialogueState::Idle,
            turns_completed: 0,
            last_warning_turn: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Append a turn, evicting the oldest beyond the history bound
    pub fn push_turn(&mut self, user: String, assistant: String) {
        self.history.push_back(Turn { user, assistant });
        while self.history.len() > MAX_HISTORY_TURNS {
            self.history.pop_front();
        }
        self.turns_completed += 1;
    }

    pub fn history(&self) -> &VecDeque<Turn> {
        &self.history
    }

    /// The last `n` turns, oldest first
    pub fn recent(&self, n: usize) -> Vec<&Turn> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).collect()
    }

    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        matches!(self.state, DialogueState::AwaitingConfirmation { .. })
    }

    /// Hold back `content` until the user confirms. Empty content leaves the session idle.
    pub fn set_pending(&mut self, content: String) {
        self.state = if content.trim().is_empty() {
            DialogueState::Idle
        } else {
            DialogueState::AwaitingConfirmation { pending: content }
        };
    }

    /// Take the withheld suggestion, returning the session to idle
    pub fn take_pending(&mut self) -> Option<String> {
        match std::mem::take(&mut self.state) {
            DialogueState::AwaitingConfirmation { pending } => Some(pending),
            DialogueState::Idle => None,
        }
    }

    pub fn turns_completed(&self) -> u64 {
        self.turns_completed
    }

    pub fn last_warning_turn(&self) -> Option<u64> {
        self.last_warning_turn
    }

    pub fn record_warning(&mut self) {
        self.last_warning_turn = Some(self.turns_completed);
    }

    /// Whether there is anything a clear-history request would remove
    pub fn has_history(&self) -> bool {
        !self.history.is_empty() || self.is_awaiting_confirmation()
    }

    /// Drop history and any pending suggestion. Banner cooldown bookkeeping survives.
    pub fn clear(&mut self) {
        self.history.clear();
        self.state = DialogueState::Idle;
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
