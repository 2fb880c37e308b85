//! Deletes a conversation after the user confirms it.
//!
//! On success the entry is pruned locally, the selection is dropped if it
//! pointed at the deleted conversation, and one extra list refresh is
//! scheduled in case the local prune and the service disagree.

use std::sync::Arc;

use log::{info, warn};

use crate::api::ApiError;
use crate::core::active_poller::ActiveConversationPoller;
use crate::core::context::SyncContext;
use crate::core::dialog::{Dialog, Prompt};
use crate::core::list_poller::ConversationListPoller;

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// The user said no; nothing was sent.
    Cancelled,
    Deleted,
    Failed(ApiError),
}

#[derive(Clone)]
pub struct DeletionWorkflow {
    ctx: Arc<SyncContext>,
    active: ActiveConversationPoller,
    list: ConversationListPoller,
    dialog: Arc<dyn Dialog>,
}

impl DeletionWorkflow {
    pub fn new(
        ctx: Arc<SyncContext>,
        active: ActiveConversationPoller,
        list: ConversationListPoller,
        dialog: Arc<dyn Dialog>,
    ) -> Self {
        Self {
            ctx,
            active,
            list,
            dialog,
        }
    }

    pub async fn request_delete(&self, title: &str) -> DeleteOutcome {
        if !self.dialog.confirm(&Prompt::confirm_delete(title)).await {
            info!("Deletion of '{}' cancelled", title);
            return DeleteOutcome::Cancelled;
        }
        self.delete(title).await
    }

    pub async fn delete(&self, title: &str) -> DeleteOutcome {
        if let Err(e) = self
            .ctx
            .backend
            .delete_conversation(self.ctx.username(), title)
            .await
        {
            warn!("Error deleting conversation '{}': {}", title, e);
            return DeleteOutcome::Failed(e);
        }

        info!("Deleted conversation '{}'", title);
        self.ctx
            .state
            .send_modify(|state| state.conversations.retain(|c| c.title != title));

        let was_active = self.ctx.state.borrow().is_active(title);
        if was_active {
            self.active.deselect();
        }

        self.dialog.acknowledge(&Prompt::deleted()).await;
        self.list.schedule_resync();
        DeleteOutcome::Deleted
    }
}
