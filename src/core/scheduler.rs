//! # Poll Scheduler
//!
//! Owns the cancellable timers of the sync engine, one named handle per role.
//! Starting a role always aborts the previous handle of that role first, so two
//! timers of the same role never run together.
//!
//! Aborting a handle stops the *schedule*. Work a tick already handed off with
//! `tokio::spawn` keeps running and finishes on its own.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use log::debug;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollRole {
    /// Lifetime-scoped refresh of the conversation list.
    ConversationList,
    /// Selection-scoped refresh of the active conversation.
    ActiveConversation,
    /// One-shot list refresh after a deletion.
    ListResync,
}

#[derive(Default)]
pub struct PollScheduler {
    handles: Mutex<HashMap<PollRole, JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<PollRole, JoinHandle<()>>> {
        // A poisoned map still holds valid handles.
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `tick` right away and then every `period` until the role is stopped.
    pub fn start_repeating<F>(&self, role: PollRole, period: Duration, mut tick: F)
    where
        F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let mut handles = self.handles();
        if let Some(previous) = handles.remove(&role) {
            previous.abort();
            debug!("Cancelled previous {:?} timer", role);
        }
        debug_assert!(!handles.contains_key(&role));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick().await;
            }
        });
        handles.insert(role, handle);
        debug!("Started {:?} timer every {:?}", role, period);
    }

    /// Runs `task` once after `delay`, replacing any pending run of the role.
    pub fn start_once(&self, role: PollRole, delay: Duration, task: BoxFuture<'static, ()>) {
        let mut handles = self.handles();
        if let Some(previous) = handles.remove(&role) {
            previous.abort();
            debug!("Cancelled previous {:?} timer", role);
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        handles.insert(role, handle);
        debug!("Scheduled {:?} in {:?}", role, delay);
    }

    /// Cancels the role's timer. Returns whether one was registered.
    pub fn stop(&self, role: PollRole) -> bool {
        match self.handles().remove(&role) {
            Some(handle) => {
                handle.abort();
                debug!("Stopped {:?} timer", role);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, role: PollRole) -> bool {
        self.handles()
            .get(&role)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of live timers across all roles.
    pub fn live_count(&self) -> usize {
        self.handles()
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn stop_all(&self) {
        for (role, handle) in self.handles().drain() {
            handle.abort();
            debug!("Stopped {:?} timer", role);
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_tick(counter: Arc<AtomicUsize>) -> impl FnMut() -> BoxFuture<'static, ()> + Send + 'static {
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_fires_immediately_then_every_period() {
        let scheduler = PollScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.start_repeating(
            PollRole::ConversationList,
            Duration::from_millis(5000),
            counting_tick(counter.clone()),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarting_a_role_cancels_the_previous_timer() {
        let scheduler = PollScheduler::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        scheduler.start_repeating(PollRole::ActiveConversation, Duration::from_secs(5), counting_tick(first.clone()));
        scheduler.start_repeating(PollRole::ActiveConversation, Duration::from_secs(5), counting_tick(second.clone()));
        assert_eq!(scheduler.live_count(), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_roles_are_independent() {
        let scheduler = PollScheduler::new();
        let list = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));
        scheduler.start_repeating(PollRole::ConversationList, Duration::from_secs(5), counting_tick(list.clone()));
        scheduler.start_repeating(PollRole::ActiveConversation, Duration::from_secs(5), counting_tick(active.clone()));
        assert_eq!(scheduler.live_count(), 2);

        assert!(scheduler.stop(PollRole::ActiveConversation));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(list.load(Ordering::SeqCst), 2);
        assert!(scheduler.is_running(PollRole::ConversationList));
        assert!(!scheduler.is_running(PollRole::ActiveConversation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let scheduler = PollScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.start_repeating(PollRole::ConversationList, Duration::from_secs(5), counting_tick(counter.clone()));
        assert!(scheduler.stop(PollRole::ConversationList));
        assert!(!scheduler.stop(PollRole::ConversationList));
        assert_eq!(scheduler.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_once_runs_after_delay() {
        let scheduler = PollScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let mut tick = counting_tick(counter.clone());
        scheduler.start_once(PollRole::ListResync, Duration::from_millis(2000), tick());

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_running(PollRole::ListResync));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_everything() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = PollScheduler::new();
            scheduler.start_repeating(PollRole::ConversationList, Duration::from_secs(5), counting_tick(counter.clone()));
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
