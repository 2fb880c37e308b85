use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use crate::api::ChatbotBackend;
use crate::core::config::Timing;
use crate::core::identity::Session;
use crate::core::scheduler::PollScheduler;
use crate::core::state::ViewState;

/// What every part of the sync engine shares: the service, the state, the timers.
pub struct SyncContext {
    pub backend: Arc<dyn ChatbotBackend>,
    pub state: watch::Sender<ViewState>,
    pub scheduler: PollScheduler,
    pub timing: Timing,
    session: OnceLock<Session>,
    closed: AtomicBool,
}

impl SyncContext {
    pub fn new(backend: Arc<dyn ChatbotBackend>, timing: Timing) -> Self {
        let (state, _) = watch::channel(ViewState::new());
        Self {
            backend,
            state,
            scheduler: PollScheduler::new(),
            timing,
            session: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.get()
    }

    /// Records the session. Returns false if one was already set.
    pub fn set_session(&self, session: Session) -> bool {
        self.session.set(session).is_ok()
    }

    /// Marks the view as logged out. Results that arrive afterwards are dropped.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn username(&self) -> &str {
        self.session().map(|s| s.username.as_str()).unwrap_or_default()
    }
}
