use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::backend::ApiError;

/// Status code the chatbot service uses to signal success inside the body.
pub const STATUS_OK: i64 = 200;

/// One entry of the conversation list. The title is the only key the service has.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    #[serde(rename = "titulo")]
    pub title: String,
}

impl ConversationSummary {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

/// A message of a conversation, kept exactly as the service sent it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Message(pub Value);

impl Message {
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    pub fn content(&self) -> Option<&str> {
        self.0.get("content").and_then(Value::as_str)
    }
}

/// A file the user picked to go along with the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fields of a start/continue request. `title` is empty when starting.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub username: String,
    pub question: String,
    pub title: String,
    pub attachment: Option<Attachment>,
}

#[derive(Serialize, Debug)]
pub(crate) struct UsernameBody<'a> {
    pub username: &'a str,
}

#[derive(Serialize, Debug)]
pub(crate) struct ConversationBody<'a> {
    pub username: &'a str,
    pub titulo: &'a str,
}

// ============================================================================
// Response envelope
// ============================================================================

/// Every response carries `status_code` and usually `msg`; the rest depends
/// on the operation and is decoded only once the status says success.
#[derive(Deserialize, Debug)]
pub(crate) struct Envelope {
    pub status_code: i64,
    #[serde(default)]
    pub msg: Option<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Envelope {
    pub fn into_result<T: for<'de> Deserialize<'de>>(self) -> Result<T, ApiError> {
        if self.status_code != STATUS_OK {
            let msg = match self.msg {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::new(),
            };
            return Err(ApiError::Rejected {
                code: self.status_code,
                msg,
            });
        }
        serde_json::from_value(Value::Object(self.rest)).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct ListReply {
    pub data: Vec<ConversationSummary>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ConversationData {
    pub messages: Vec<Message>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ConversationReply {
    pub data: ConversationData,
}

#[derive(Deserialize, Debug)]
pub(crate) struct StartReply {
    pub titulo: String,
}

/// Success body whose payload the core does not need.
#[derive(Deserialize, Debug)]
pub(crate) struct Ack {}
