pub mod backend;
pub mod client;
pub mod types;

pub use backend::{ApiError, ChatbotBackend};
pub use client::HttpBackend;
pub use types::{Attachment, ConversationSummary, Message, OutgoingMessage};
