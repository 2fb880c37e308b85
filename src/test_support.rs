//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiError, ChatbotBackend, ConversationSummary, Message, OutgoingMessage};
use crate::core::config::Timing;
use crate::core::context::SyncContext;
use crate::core::controller::ChatController;
use crate::core::dialog::{Dialog, Prompt};
use crate::core::identity::{IdentityStore, Session};

/// A call the fake backend received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { username: String },
    Get { username: String, title: String },
    Start(OutgoingMessage),
    Continue(OutgoingMessage),
    Delete { username: String, title: String },
}

struct FakeState {
    conversations: Result<Vec<ConversationSummary>, ApiError>,
    list_delay: Duration,
    messages: HashMap<String, Vec<Message>>,
    get_error: Option<ApiError>,
    get_delays: HashMap<String, Duration>,
    start_reply: Result<String, ApiError>,
    continue_error: Option<ApiError>,
    send_delay: Duration,
    delete_error: Option<ApiError>,
    calls: Vec<Call>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            conversations: Ok(Vec::new()),
            list_delay: Duration::ZERO,
            messages: HashMap::new(),
            get_error: None,
            get_delays: HashMap::new(),
            start_reply: Ok("New Chat".to_string()),
            continue_error: None,
            send_delay: Duration::ZERO,
            delete_error: None,
            calls: Vec::new(),
        }
    }
}

/// In-memory stand-in for the chatbot service that records every call.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversations(titles: &[&str]) -> Self {
        let backend = Self::new();
        backend.set_conversations(titles);
        backend
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_conversations(&self, titles: &[&str]) {
        self.lock().conversations = Ok(titles.iter().map(|t| ConversationSummary::new(*t)).collect());
    }

    pub fn fail_list(&self, error: ApiError) {
        self.lock().conversations = Err(error);
    }

    /// Makes every list fetch take `delay` before answering.
    pub fn delay_list(&self, delay: Duration) {
        self.lock().list_delay = delay;
    }

    pub fn set_messages(&self, title: &str, messages: Vec<Message>) {
        self.lock().messages.insert(title.to_string(), messages);
    }

    pub fn fail_get(&self, error: Option<ApiError>) {
        self.lock().get_error = error;
    }

    /// Makes every fetch of `title` take `delay` before answering.
    pub fn delay_get(&self, title: &str, delay: Duration) {
        self.lock().get_delays.insert(title.to_string(), delay);
    }

    pub fn set_start_reply(&self, reply: Result<String, ApiError>) {
        self.lock().start_reply = reply;
    }

    pub fn fail_continue(&self, error: Option<ApiError>) {
        self.lock().continue_error = error;
    }

    /// Makes start and continue take `delay` before answering.
    pub fn delay_send(&self, delay: Duration) {
        self.lock().send_delay = delay;
    }

    pub fn fail_delete(&self, error: Option<ApiError>) {
        self.lock().delete_error = error;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn list_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::List { username } => Some(username),
                _ => None,
            })
            .collect()
    }

    /// Titles of every conversation fetch, in call order.
    pub fn get_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Get { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn send_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Start(_) | Call::Continue(_)))
            .collect()
    }
}

#[async_trait]
impl ChatbotBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn list_conversations(&self, username: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        let (result, delay) = {
            let mut state = self.lock();
            state.calls.push(Call::List { username: username.to_string() });
            (state.conversations.clone(), state.list_delay)
        };
        tokio::time::sleep(delay).await;
        result
    }

    async fn get_conversation(&self, username: &str, title: &str) -> Result<Vec<Message>, ApiError> {
        let (result, delay) = {
            let mut state = self.lock();
            state.calls.push(Call::Get {
                username: username.to_string(),
                title: title.to_string(),
            });
            let result = match &state.get_error {
                Some(e) => Err(e.clone()),
                None => Ok(state.messages.get(title).cloned().unwrap_or_default()),
            };
            (result, state.get_delays.get(title).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn start_conversation(&self, message: OutgoingMessage) -> Result<String, ApiError> {
        let (result, delay) = {
            let mut state = self.lock();
            state.calls.push(Call::Start(message));
            (state.start_reply.clone(), state.send_delay)
        };
        tokio::time::sleep(delay).await;
        result
    }

    async fn continue_conversation(&self, message: OutgoingMessage) -> Result<(), ApiError> {
        let (result, delay) = {
            let mut state = self.lock();
            state.calls.push(Call::Continue(message));
            let result = match &state.continue_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            };
            (result, state.send_delay)
        };
        tokio::time::sleep(delay).await;
        result
    }

    async fn delete_conversation(&self, username: &str, title: &str) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(Call::Delete {
            username: username.to_string(),
            title: title.to_string(),
        });
        match &state.delete_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Dialog that answers every confirmation the same way and records prompts.
pub struct ScriptedDialog {
    answer: bool,
    confirms: Mutex<Vec<Prompt>>,
    acknowledgements: Mutex<Vec<Prompt>>,
}

impl ScriptedDialog {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            confirms: Mutex::new(Vec::new()),
            acknowledgements: Mutex::new(Vec::new()),
        }
    }

    pub fn confirms(&self) -> Vec<Prompt> {
        self.confirms.lock().unwrap().clone()
    }

    pub fn acknowledgements(&self) -> Vec<Prompt> {
        self.acknowledgements.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialog for ScriptedDialog {
    async fn confirm(&self, prompt: &Prompt) -> bool {
        self.confirms.lock().unwrap().push(prompt.clone());
        self.answer
    }

    async fn acknowledge(&self, prompt: &Prompt) {
        self.acknowledgements.lock().unwrap().push(prompt.clone());
    }
}

/// Identity store kept in memory.
#[derive(Default)]
pub struct MemoryIdentityStore {
    items: Mutex<HashMap<String, String>>,
}

impl IdentityStore for MemoryIdentityStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        self.items.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.items.lock().unwrap().clear();
        Ok(())
    }
}

pub fn test_session() -> Session {
    Session {
        person_id: "1".to_string(),
        first_name: "Ana".to_string(),
        paternal_surname: "Rojas".to_string(),
        maternal_surname: "Soto".to_string(),
        username: "ana".to_string(),
    }
}

/// Identity store holding the records for [`test_session`].
pub fn test_identity() -> Arc<MemoryIdentityStore> {
    let store = Arc::new(MemoryIdentityStore::default());
    test_session().store(store.as_ref()).unwrap();
    store
}

/// A context whose session is already resolved to [`test_session`].
pub fn test_context(backend: Arc<FakeBackend>) -> Arc<SyncContext> {
    let ctx = Arc::new(SyncContext::new(backend, Timing::default()));
    ctx.set_session(test_session());
    ctx
}

/// A controller over the fake backend, not yet activated.
pub fn test_controller(backend: Arc<FakeBackend>, dialog: Arc<ScriptedDialog>) -> ChatController {
    ChatController::new(backend, dialog, test_identity(), Timing::default())
}

pub fn text_message(role: &str, content: &str) -> Message {
    Message(serde_json::json!({ "role": role, "content": content }))
}

/// Lets spawned tasks run to completion without reaching the next poll tick.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
