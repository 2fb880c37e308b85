//! User-facing prompts the engine needs but does not render itself.

use async_trait::async_trait;

/// Text of a prompt shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub text: String,
}

impl Prompt {
    pub fn confirm_delete(title: &str) -> Self {
        Self {
            title: "Are you sure?".to_string(),
            text: format!("Do you want to delete the conversation titled \"{}\"?", title),
        }
    }

    pub fn deleted() -> Self {
        Self {
            title: "Deleted!".to_string(),
            text: "The conversation has been deleted.".to_string(),
        }
    }
}

#[async_trait]
pub trait Dialog: Send + Sync {
    /// Asks a yes/no question. Only `true` counts as confirmation.
    async fn confirm(&self, prompt: &Prompt) -> bool;

    /// Shows a notice and returns once the user has seen it.
    async fn acknowledge(&self, prompt: &Prompt);
}
