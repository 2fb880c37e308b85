//! Turns view state changes into terminal lines.
//!
//! Only what changed is printed: a new list, a new conversation header, or the
//! messages that arrived since the last refresh. When a refresh rewrites
//! history instead of extending it, the whole conversation is printed again.

use tokio::sync::watch;

use crate::api::{ConversationSummary, Message};
use crate::core::state::{Panel, ViewState};

const WRAP_WIDTH: usize = 80;

/// What has already been put on screen.
#[derive(Debug, Default)]
pub struct Renderer {
    titles: Vec<String>,
    active_title: Option<String>,
    messages: Vec<Message>,
    menu_hidden: bool,
    panel: Panel,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print to bring the screen up to `state`.
    pub fn update(&mut self, state: &ViewState) -> Vec<String> {
        let mut lines = Vec::new();

        if state.panel != self.panel {
            self.panel = state.panel;
            if state.panel == Panel::Chatbot && state.active_title.is_none() {
                lines.push("── new conversation: type your first message ──".to_string());
            }
        }

        let titles: Vec<String> = state.conversations.iter().map(|c| c.title.clone()).collect();
        let menu_toggled = state.menu_hidden != self.menu_hidden;
        self.menu_hidden = state.menu_hidden;
        if (titles != self.titles || menu_toggled) && !state.menu_hidden {
            lines.extend(list_lines(&state.conversations, state.active_title.as_deref()));
        }
        self.titles = titles;

        if state.active_title != self.active_title {
            self.active_title = state.active_title.clone();
            self.messages.clear();
            match &state.active_title {
                Some(title) => lines.push(format!("── {} ──", title)),
                None => lines.push("── no conversation open ──".to_string()),
            }
        }

        if state.messages != self.messages {
            let extends = state.messages.starts_with(&self.messages);
            let fresh = if extends {
                &state.messages[self.messages.len()..]
            } else {
                if !self.messages.is_empty() {
                    if let Some(title) = &state.active_title {
                        lines.push(format!("── {} (updated) ──", title));
                    }
                }
                &state.messages[..]
            };
            lines.extend(fresh.iter().map(message_text));
            self.messages = state.messages.clone();
        }

        lines
    }
}

pub fn list_lines(conversations: &[ConversationSummary], active: Option<&str>) -> Vec<String> {
    if conversations.is_empty() {
        return vec!["(no conversations yet)".to_string()];
    }
    let mut lines = vec!["Conversations:".to_string()];
    lines.extend(conversations.iter().map(|c| {
        let marker = if Some(c.title.as_str()) == active { '*' } else { ' ' };
        format!(" {} {}", marker, c.title)
    }));
    lines
}

pub fn message_text(message: &Message) -> String {
    let role = message.role().unwrap_or("?");
    let body = match message.content() {
        Some(content) => content.to_string(),
        None => message.0.to_string(),
    };
    let options = textwrap::Options::new(WRAP_WIDTH)
        .initial_indent("    ")
        .subsequent_indent("    ");
    format!("{}:\n{}", role, textwrap::fill(&body, &options))
}

/// Prints every change of the view until the state sender goes away.
pub async fn follow(mut updates: watch::Receiver<ViewState>) {
    let mut renderer = Renderer::new();
    loop {
        let state = updates.borrow_and_update().clone();
        for line in renderer.update(&state) {
            println!("{}", line);
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
}
