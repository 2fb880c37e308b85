//! # View State
//!
//! Everything the rendering layer shows, in one place.
//!
//! ```text
//! ViewState
//! ├── conversations: Vec<ConversationSummary>  // owned by the list poller
//! ├── active_title: Option<String>              // owned by selection
//! ├── messages: Vec<Message>                    // owned by the active poller
//! ├── pending: PendingInput                     // owned by the UI-action path
//! ├── panel: Panel                              // welcome or chatbot
//! ├── menu_hidden: bool
//! └── last_synced: Option<DateTime<Utc>>        // last good list fetch
//! ```
//!
//! The state lives inside a `tokio::sync::watch` channel. Every change goes
//! through `send_modify`, so a change is never observed half-applied.

use chrono::{DateTime, Utc};

use crate::api::{Attachment, ConversationSummary, Message};

/// Text and attachment the user is composing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingInput {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl PendingInput {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Panel {
    #[default]
    Welcome,
    Chatbot,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub conversations: Vec<ConversationSummary>,
    pub active_title: Option<String>,
    pub messages: Vec<Message>,
    pub pending: PendingInput,
    pub panel: Panel,
    pub menu_hidden: bool,
    pub last_synced: Option<DateTime<Utc>>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, title: &str) -> bool {
        self.active_title.as_deref() == Some(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.conversations.iter().any(|c| c.title == title)
    }

    /// Drops the selection together with whatever it was showing.
    pub fn clear_selection(&mut self) {
        self.active_title = None;
        self.messages.clear();
    }
}
