//! HTTP implementation of [`ChatbotBackend`] using reqwest.
//!
//! JSON bodies for list/get/delete, multipart forms for start/continue
//! (the service expects the optional image as a file part).

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::backend::{ApiError, ChatbotBackend};
use super::types::{
    Ack, ConversationBody, ConversationReply, ConversationSummary, Envelope, ListReply, Message,
    OutgoingMessage, StartReply, UsernameBody,
};

pub const LIST_CONVERSATIONS_PATH: &str = "/chatbot/list_conversations";
pub const GET_CONVERSATION_PATH: &str = "/chatbot/get_conversation";
pub const START_CONVERSATION_PATH: &str = "/chatbot/start_conversation";
pub const CONTINUE_CONVERSATION_PATH: &str = "/chatbot/continue_conversation";
pub const DELETE_CONVERSATION_PATH: &str = "/chatbot/delete_conversation";

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and decodes the status envelope.
    async fn exchange<T>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("Chatbot response status: {}", status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Chatbot HTTP error: {} - {}", status, body);
            return Err(ApiError::Transport(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        envelope.into_result()
    }
}

/// Builds the multipart form shared by start and continue.
fn message_form(message: OutgoingMessage) -> Result<Form, ApiError> {
    let form = Form::new()
        .text("username", message.username)
        .text("pregunta", message.question)
        .text("titulo", message.title);

    let Some(attachment) = message.attachment else {
        return Ok(form);
    };

    let mut part = Part::bytes(attachment.bytes).file_name(attachment.file_name);
    if let Some(mime) = attachment.mime_type {
        part = part
            .mime_str(&mime)
            .map_err(|e| ApiError::Transport(format!("invalid attachment type {mime}: {e}")))?;
    }
    Ok(form.part("image", part))
}

#[async_trait]
impl ChatbotBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_conversations(&self, username: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        let request = self
            .client
            .post(self.url(LIST_CONVERSATIONS_PATH))
            .json(&UsernameBody { username });
        let reply: ListReply = self.exchange(request).await?;
        Ok(reply.data)
    }

    async fn get_conversation(&self, username: &str, title: &str) -> Result<Vec<Message>, ApiError> {
        let request = self
            .client
            .post(self.url(GET_CONVERSATION_PATH))
            .json(&ConversationBody { username, titulo: title });
        let reply: ConversationReply = self.exchange(request).await?;
        Ok(reply.data.messages)
    }

    async fn start_conversation(&self, message: OutgoingMessage) -> Result<String, ApiError> {
        let form = message_form(message)?;
        let request = self
            .client
            .post(self.url(START_CONVERSATION_PATH))
            .multipart(form);
        let reply: StartReply = self.exchange(request).await?;
        if reply.titulo.is_empty() {
            return Err(ApiError::Parse("service assigned an empty title".to_string()));
        }
        Ok(reply.titulo)
    }

    async fn continue_conversation(&self, message: OutgoingMessage) -> Result<(), ApiError> {
        let form = message_form(message)?;
        let request = self
            .client
            .post(self.url(CONTINUE_CONVERSATION_PATH))
            .multipart(form);
        let _: Ack = self.exchange(request).await?;
        Ok(())
    }

    async fn delete_conversation(&self, username: &str, title: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(DELETE_CONVERSATION_PATH))
            .json(&ConversationBody { username, titulo: title });
        let _: Ack = self.exchange(request).await?;
        Ok(())
    }
}
