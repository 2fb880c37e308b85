//! # Chat Controller
//!
//! The operations a rendering layer drives: activate the view, pick a
//! conversation, compose and send, delete, tear down. It wires the pollers,
//! the dispatcher and the deletion workflow around one [`SyncContext`].
//!
//! ```text
//! activate() ── Session::load ── list poller (whole lifetime)
//! select()   ── active poller (one at a time)
//! send()     ── dispatcher ── select()
//! delete()   ── deletion ── deselect() + resync
//! ```

use std::io;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::api::{ApiError, Attachment, ChatbotBackend};
use crate::core::active_poller::ActiveConversationPoller;
use crate::core::config::Timing;
use crate::core::context::SyncContext;
use crate::core::deletion::{DeleteOutcome, DeletionWorkflow};
use crate::core::dialog::Dialog;
use crate::core::dispatcher::{MessageDispatcher, SendOutcome};
use crate::core::identity::{IdentityStore, LOGIN_ROUTE, Session, SessionError};
use crate::core::list_poller::ConversationListPoller;
use crate::core::scheduler::PollRole;
use crate::core::state::{Panel, ViewState};

pub struct ChatController {
    ctx: Arc<SyncContext>,
    identity: Arc<dyn IdentityStore>,
    list: ConversationListPoller,
    active: ActiveConversationPoller,
    dispatcher: MessageDispatcher,
    deletion: DeletionWorkflow,
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn ChatbotBackend>,
        dialog: Arc<dyn Dialog>,
        identity: Arc<dyn IdentityStore>,
        timing: Timing,
    ) -> Self {
        let ctx = Arc::new(SyncContext::new(backend, timing));
        let list = ConversationListPoller::new(ctx.clone());
        let active = ActiveConversationPoller::new(ctx.clone());
        let dispatcher = MessageDispatcher::new(ctx.clone(), active.clone());
        let deletion = DeletionWorkflow::new(ctx.clone(), active.clone(), list.clone(), dialog);
        Self {
            ctx,
            identity,
            list,
            active,
            dispatcher,
            deletion,
        }
    }

    /// Resolves the session and starts the list poller. Runs once; later calls are no-ops.
    ///
    /// `Err(IdentityMissing)` means the caller should send the user to [`LOGIN_ROUTE`].
    pub fn activate(&self) -> Result<(), SessionError> {
        if self.ctx.is_closed() {
            debug!("View logged out, activation refused");
            return Err(SessionError::IdentityMissing);
        }
        if self.ctx.session().is_some() {
            debug!("View already active");
            return Ok(());
        }
        let session = Session::load(self.identity.as_ref())?;
        if !self.ctx.set_session(session) {
            debug!("View activated concurrently");
            return Ok(());
        }
        info!("Activating view with backend '{}'", self.ctx.backend.name());
        self.list.start();
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.ctx.session()
    }

    /// True between a successful [`activate`](Self::activate) and [`logout`](Self::logout).
    pub fn is_active(&self) -> bool {
        self.ctx.session().is_some() && !self.ctx.is_closed()
    }

    fn ensure_active(&self, operation: &str) -> bool {
        let active = self.is_active();
        if !active {
            warn!("Ignoring {} outside an active view", operation);
        }
        active
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.ctx.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.ctx.state.borrow().clone()
    }

    pub fn is_polling(&self, role: PollRole) -> bool {
        self.ctx.scheduler.is_running(role)
    }

    /// Fetches the list now, outside the regular schedule.
    pub async fn refresh_conversations(&self) -> Result<(), ApiError> {
        if !self.ensure_active("list refresh") {
            return Ok(());
        }
        self.list.fetch().await
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn select_conversation(&self, title: &str) -> bool {
        self.ensure_active("selection") && self.active.select(title)
    }

    pub fn deselect(&self) {
        self.active.deselect();
    }

    /// Clears the selection and the draft text, and shows the chatbot panel.
    pub fn start_new_conversation(&self) {
        self.active.deselect();
        self.ctx.state.send_modify(|state| {
            state.pending.text.clear();
            state.panel = Panel::Chatbot;
        });
    }

    pub fn select_panel(&self, panel: Panel) {
        self.ctx
            .state
            .send_if_modified(|state| std::mem::replace(&mut state.panel, panel) != panel);
    }

    pub fn toggle_menu(&self) {
        self.ctx
            .state
            .send_modify(|state| state.menu_hidden = !state.menu_hidden);
    }

    // ========================================================================
    // Composing
    // ========================================================================

    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.ctx.state.send_modify(|state| state.pending.text = text);
    }

    pub fn attach(&self, attachment: Attachment) {
        self.ctx
            .state
            .send_modify(|state| state.pending.attachment = Some(attachment));
    }

    pub fn remove_attachment(&self) {
        self.ctx
            .state
            .send_if_modified(|state| state.pending.attachment.take().is_some());
    }

    pub async fn send_message(&self) -> SendOutcome {
        if !self.ensure_active("send") {
            return SendOutcome::Skipped;
        }
        self.dispatcher.send().await
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    pub async fn request_delete(&self, title: &str) -> DeleteOutcome {
        if !self.ensure_active("delete") {
            return DeleteOutcome::Cancelled;
        }
        self.deletion.request_delete(title).await
    }

    /// Deletes without asking.
    pub async fn delete(&self, title: &str) -> DeleteOutcome {
        if !self.ensure_active("delete") {
            return DeleteOutcome::Cancelled;
        }
        self.deletion.delete(title).await
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Cancels every timer. Requests already out still complete.
    pub fn shutdown(&self) {
        self.ctx.scheduler.stop_all();
        debug!("View shut down");
    }

    /// Stops all polling, forgets the stored identity, and returns where to go next.
    pub fn logout(&self) -> io::Result<&'static str> {
        self.ctx.close();
        self.shutdown();
        self.identity.clear()?;
        self.ctx.state.send_modify(|state| {
            state.clear_selection();
            state.conversations.clear();
        });
        info!("Logged out");
        Ok(LOGIN_ROUTE)
    }
}

impl Drop for ChatController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
