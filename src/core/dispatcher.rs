//! Sends what the user typed.
//!
//! The pending input is taken and cleared before the request goes out, so the
//! user can start the next message while this one is in flight. If the send
//! fails the text is not put back.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::api::{ApiError, ConversationSummary, OutgoingMessage};
use crate::core::active_poller::ActiveConversationPoller;
use crate::core::context::SyncContext;
use crate::core::state::PendingInput;

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The text was blank; nothing was sent and the input is untouched.
    Skipped,
    /// A new conversation was created under the title the service chose.
    Started { title: String },
    Continued { title: String },
    Failed(ApiError),
}

#[derive(Clone)]
pub struct MessageDispatcher {
    ctx: Arc<SyncContext>,
    active: ActiveConversationPoller,
}

impl MessageDispatcher {
    pub fn new(ctx: Arc<SyncContext>, active: ActiveConversationPoller) -> Self {
        Self { ctx, active }
    }

    pub async fn send(&self) -> SendOutcome {
        let mut taken: Option<(PendingInput, Option<String>)> = None;
        self.ctx.state.send_if_modified(|state| {
            if state.pending.is_blank() {
                return false;
            }
            taken = Some((std::mem::take(&mut state.pending), state.active_title.clone()));
            true
        });
        let Some((pending, active_title)) = taken else {
            debug!("Skipping blank message");
            return SendOutcome::Skipped;
        };

        let message = OutgoingMessage {
            username: self.ctx.username().to_string(),
            question: pending.text,
            title: active_title.clone().unwrap_or_default(),
            attachment: pending.attachment,
        };

        match active_title {
            None => self.start(message).await,
            Some(title) => self.continue_with(message, title).await,
        }
    }

    async fn start(&self, message: OutgoingMessage) -> SendOutcome {
        match self.ctx.backend.start_conversation(message).await {
            Ok(title) if self.ctx.is_closed() => {
                debug!("Conversation '{}' started after logout, not selecting it", title);
                SendOutcome::Started { title }
            }
            Ok(title) => {
                info!("Started conversation '{}'", title);
                let mut free = false;
                self.ctx.state.send_modify(|state| {
                    if !state.contains(&title) {
                        state.conversations.push(ConversationSummary::new(title.clone()));
                    }
                    free = state.active_title.is_none();
                });
                // Don't pull the view away from a conversation picked while the send was out.
                if free {
                    self.active.select(&title);
                }
                SendOutcome::Started { title }
            }
            Err(e) => {
                warn!("Error sending message: {}", e);
                SendOutcome::Failed(e)
            }
        }
    }

    async fn continue_with(&self, message: OutgoingMessage, title: String) -> SendOutcome {
        match self.ctx.backend.continue_conversation(message).await {
            Ok(()) => {
                // Selecting the still-active title is a no-op; fetch now so the
                // reply shows up without waiting for the next tick.
                if let Err(e) = self.active.refresh_title(&title).await {
                    debug!("Refresh after send failed, next tick retries: {}", e);
                }
                SendOutcome::Continued { title }
            }
            Err(e) => {
                warn!("Error sending message: {}", e);
                SendOutcome::Failed(e)
            }
        }
    }
}
