use std::fmt;

use async_trait::async_trait;

use super::types::{ConversationSummary, Message, OutgoingMessage};

/// Errors a call to the chatbot service can end with.
/// Every variant is treated the same way by the sync engine: log and keep prior state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The service answered, but with a `status_code` other than 200.
    Rejected { code: i64, msg: String },
    /// Network-level failure or a non-2xx HTTP status.
    Transport(String),
    /// The body could not be decoded into the expected shape.
    Parse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Rejected { code, msg } => write!(f, "rejected (status {code}): {msg}"),
            ApiError::Transport(msg) => write!(f, "transport error: {msg}"),
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// The remote chatbot service as the sync engine sees it.
#[async_trait]
pub trait ChatbotBackend: Send + Sync {
    /// Returns the name of the backend, for logs.
    fn name(&self) -> &str;

    async fn list_conversations(&self, username: &str) -> Result<Vec<ConversationSummary>, ApiError>;

    async fn get_conversation(&self, username: &str, title: &str) -> Result<Vec<Message>, ApiError>;

    /// Starts a new conversation and returns the title the service assigned to it.
    async fn start_conversation(&self, message: OutgoingMessage) -> Result<String, ApiError>;

    async fn continue_conversation(&self, message: OutgoingMessage) -> Result<(), ApiError>;

    async fn delete_conversation(&self, username: &str, title: &str) -> Result<(), ApiError>;
}
