//! Keeps the selected conversation's messages fresh.
//!
//! Only one conversation is active at a time and only one timer of this role
//! may exist. Each fetch carries the title it was issued for; when the answer
//! arrives after the selection moved on, it is dropped instead of overwriting
//! the new conversation's messages.

use std::sync::{Arc, Weak};

use futures::FutureExt;
use log::{debug, info, warn};

use crate::api::ApiError;
use crate::core::context::SyncContext;
use crate::core::scheduler::PollRole;

#[derive(Clone)]
pub struct ActiveConversationPoller {
    ctx: Arc<SyncContext>,
}

impl ActiveConversationPoller {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }

    /// Makes `title` the active conversation and starts polling it.
    ///
    /// Selecting the title that is already active does nothing and returns false.
    pub fn select(&self, title: &str) -> bool {
        let changed = self.ctx.state.send_if_modified(|state| {
            if state.is_active(title) {
                return false;
            }
            state.active_title = Some(title.to_string());
            state.messages.clear();
            true
        });
        if !changed {
            debug!("Conversation '{}' already active", title);
            return false;
        }

        info!("Selected conversation '{}'", title);
        let weak = Arc::downgrade(&self.ctx);
        let target = title.to_string();
        self.ctx.scheduler.start_repeating(
            PollRole::ActiveConversation,
            self.ctx.timing.conversation_interval,
            move || {
                spawn_refresh(&weak, &target);
                async {}.boxed()
            },
        );
        true
    }

    /// Fetches the active conversation once. Ok(false) when nothing is active
    /// or the selection changed while the request was out.
    pub async fn refresh(&self) -> Result<bool, ApiError> {
        let active = self.ctx.state.borrow().active_title.clone();
        match active {
            Some(title) => refresh_conversation(&self.ctx, &title).await,
            None => Ok(false),
        }
    }

    /// Fetches `title`, applying the result only if it is still the active one.
    pub async fn refresh_title(&self, title: &str) -> Result<bool, ApiError> {
        refresh_conversation(&self.ctx, title).await
    }

    /// Stops polling and clears the active title and its messages.
    pub fn deselect(&self) {
        self.stop();
        self.ctx.state.send_if_modified(|state| {
            let had_selection = state.active_title.is_some() || !state.messages.is_empty();
            state.clear_selection();
            had_selection
        });
    }

    pub fn stop(&self) -> bool {
        self.ctx.scheduler.stop(PollRole::ActiveConversation)
    }

    pub fn is_polling(&self) -> bool {
        self.ctx.scheduler.is_running(PollRole::ActiveConversation)
    }
}

fn spawn_refresh(weak: &Weak<SyncContext>, title: &str) {
    if let Some(ctx) = weak.upgrade() {
        let title = title.to_string();
        tokio::spawn(async move {
            let _ = refresh_conversation(&ctx, &title).await;
        });
    }
}

async fn refresh_conversation(ctx: &SyncContext, title: &str) -> Result<bool, ApiError> {
    match ctx.backend.get_conversation(ctx.username(), title).await {
        Ok(messages) => {
            let applied = ctx.state.send_if_modified(|state| {
                if ctx.is_closed() || !state.is_active(title) {
                    return false;
                }
                state.messages = messages;
                true
            });
            if applied {
                debug!("Conversation '{}' refreshed", title);
            } else {
                debug!("Discarding stale response for '{}'", title);
            }
            Ok(applied)
        }
        Err(e) => {
            warn!("Error refreshing conversation '{}': {}", title, e);
            Err(e)
        }
    }
}
