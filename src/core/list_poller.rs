//! Keeps the conversation list in step with the service.
//!
//! Runs for the whole life of the view. Every successful fetch replaces the
//! list outright; a failed one leaves the previous list as it was and the next
//! tick tries again.

use std::sync::{Arc, Weak};

use chrono::Utc;
use futures::FutureExt;
use log::{debug, warn};

use crate::api::ApiError;
use crate::core::context::SyncContext;
use crate::core::scheduler::PollRole;

#[derive(Clone)]
pub struct ConversationListPoller {
    ctx: Arc<SyncContext>,
}

impl ConversationListPoller {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }

    /// Fetches now, then every `list_interval` until [`stop`](Self::stop).
    pub fn start(&self) {
        let weak = Arc::downgrade(&self.ctx);
        self.ctx.scheduler.start_repeating(
            PollRole::ConversationList,
            self.ctx.timing.list_interval,
            move || {
                spawn_fetch(&weak);
                async {}.boxed()
            },
        );
    }

    pub fn stop(&self) -> bool {
        self.ctx.scheduler.stop(PollRole::ConversationList)
    }

    pub async fn fetch(&self) -> Result<(), ApiError> {
        fetch_list(&self.ctx).await
    }

    /// One extra fetch after `resync_delay`, for when a local edit may have
    /// drifted from what the service holds.
    pub fn schedule_resync(&self) {
        if self.ctx.is_closed() {
            return;
        }
        let weak = Arc::downgrade(&self.ctx);
        self.ctx.scheduler.start_once(
            PollRole::ListResync,
            self.ctx.timing.resync_delay,
            async move { spawn_fetch(&weak) }.boxed(),
        );
    }
}

/// The request outlives the schedule that issued it.
fn spawn_fetch(weak: &Weak<SyncContext>) {
    if let Some(ctx) = weak.upgrade() {
        tokio::spawn(async move {
            let _ = fetch_list(&ctx).await;
        });
    }
}

async fn fetch_list(ctx: &SyncContext) -> Result<(), ApiError> {
    match ctx.backend.list_conversations(ctx.username()).await {
        Ok(_) if ctx.is_closed() => {
            debug!("Discarding conversation list received after logout");
            Ok(())
        }
        Ok(conversations) => {
            debug!("Conversation list refreshed: {} entries", conversations.len());
            ctx.state.send_modify(|state| {
                state.conversations = conversations;
                state.last_synced = Some(Utc::now());
            });
            Ok(())
        }
        Err(e) => {
            warn!("Error loading conversations: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ConversationSummary;
    use crate::test_support::{FakeBackend, settle, test_context};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test(start_paused = true)]
    async fn test_fetch_replaces_list_wholesale() {
        let backend = Arc::new(FakeBackend::with_conversations(&["A", "B"]));
        let ctx = test_context(backend.clone());
        ctx.state.send_modify(|s| s.conversations = vec![ConversationSummary::new("stale")]);
        let poller = ConversationListPoller::new(ctx.clone());

        assert_ok!(poller.fetch().await);
        assert_eq!(
            ctx.state.borrow().conversations,
            vec![ConversationSummary::new("A"), ConversationSummary::new("B")]
        );
        assert!(ctx.state.borrow().last_synced.is_some());
        assert_eq!(backend.list_calls(), vec!["ana".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_previous_list() {
        let backend = Arc::new(FakeBackend::with_conversations(&["A"]));
        let ctx = test_context(backend.clone());
        let poller = ConversationListPoller::new(ctx.clone());
        assert_ok!(poller.fetch().await);

        backend.fail_list(ApiError::Rejected { code: 500, msg: "down".to_string() });
        assert_err!(poller.fetch().await);
        assert_eq!(ctx.state.borrow().conversations, vec![ConversationSummary::new("A")]);

        backend.fail_list(ApiError::Transport("refused".to_string()));
        assert_err!(poller.fetch().await);
        assert_eq!(ctx.state.borrow().conversations, vec![ConversationSummary::new("A")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fetches_immediately_and_on_every_interval() {
        let backend = Arc::new(FakeBackend::with_conversations(&["A"]));
        let ctx = test_context(backend.clone());
        let poller = ConversationListPoller::new(ctx.clone());

        poller.start();
        settle().await;
        assert_eq!(backend.list_calls().len(), 1);
        assert_eq!(ctx.state.borrow().conversations.len(), 1);

        backend.set_conversations(&["A", "B", "C"]);
        tokio::time::sleep(Duration::from_millis(5000)).await;
        settle().await;
        assert_eq!(backend.list_calls().len(), 2);
        assert_eq!(ctx.state.borrow().conversations.len(), 3);

        assert!(poller.stop());
        assert!(!poller.stop());
        tokio::time::sleep(Duration::from_millis(20_000)).await;
        assert_eq!(backend.list_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_fetches_once_after_delay() {
        let backend = Arc::new(FakeBackend::with_conversations(&["A"]));
        let ctx = test_context(backend.clone());
        let poller = ConversationListPoller::new(ctx.clone());

        poller.schedule_resync();
        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert!(backend.list_calls().is_empty());
        tokio::time::sleep(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(backend.list_calls().len(), 1);
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(backend.list_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_view_ignores_lists_and_skips_resync() {
        let backend = Arc::new(FakeBackend::with_conversations(&["A"]));
        let ctx = test_context(backend.clone());
        let poller = ConversationListPoller::new(ctx.clone());
        ctx.close();

        assert_ok!(poller.fetch().await);
        assert!(ctx.state.borrow().conversations.is_empty());
        assert!(ctx.state.borrow().last_synced.is_none());

        poller.schedule_resync();
        assert!(!ctx.scheduler.is_running(PollRole::ListResync));
    }
}
