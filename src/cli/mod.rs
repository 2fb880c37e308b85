//! # Terminal Adapter
//!
//! A line-oriented front end over [`ChatController`]. It prints view changes as
//! they happen and turns typed lines into controller operations.
//!
//! This is the only module that reads stdin or writes stdout. Confirmation
//! prompts share the same line reader as the command loop; the loop never
//! holds it while an operation runs, so a prompt can take the next line.

pub mod command;
pub mod render;

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::api::{Attachment, HttpBackend};
use crate::core::config::ResolvedConfig;
use crate::core::dialog::{Dialog, Prompt};
use crate::core::identity::{IdentityStore, LOGIN_ROUTE};
use crate::core::state::Panel;
use crate::core::{ChatController, DeleteOutcome, SendOutcome};
use command::{Command, HELP};

type InputLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

/// Asks for confirmation on the terminal.
pub struct TerminalDialog {
    input: InputLines,
}

impl TerminalDialog {
    fn new(input: InputLines) -> Self {
        Self { input }
    }
}

/// Yes in English or Spanish; anything else is no.
pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "sí"
    )
}

#[async_trait]
impl Dialog for TerminalDialog {
    async fn confirm(&self, prompt: &Prompt) -> bool {
        print!("{}\n{} [y/N] ", prompt.title, prompt.text);
        let _ = io::stdout().flush();
        let mut input = self.input.lock().await;
        match input.next_line().await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }

    async fn acknowledge(&self, prompt: &Prompt) {
        println!("{} {}", prompt.title, prompt.text);
    }
}

/// Guesses a MIME type from the file extension for the image formats the service takes.
fn guess_mime(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime.to_string())
}

pub async fn load_attachment(path: &Path) -> io::Result<Attachment> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    Ok(Attachment {
        file_name,
        mime_type: guess_mime(path),
        bytes,
    })
}

/// Runs the interactive session until `/quit` or end of input.
pub async fn run(config: ResolvedConfig, identity: Arc<dyn IdentityStore>) -> io::Result<()> {
    let input: InputLines = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
    let backend = Arc::new(HttpBackend::new(config.base_url.clone()));
    let dialog = Arc::new(TerminalDialog::new(input.clone()));
    let controller = ChatController::new(backend, dialog, identity, config.timing);

    if let Err(e) = controller.activate() {
        eprintln!("{e}");
        eprintln!("Redirecting to {LOGIN_ROUTE}: run `charla identify --username <name>` first.");
        return Err(io::Error::new(io::ErrorKind::PermissionDenied, e));
    }

    if let Some(session) = controller.session() {
        println!("Hello, {}! Connected to {}.", session.display_name(), config.base_url);
    }
    println!("{HELP}");
    let renderer = tokio::spawn(render::follow(controller.subscribe()));

    loop {
        let line = {
            let mut lines = input.lock().await;
            lines.next_line().await?
        };
        let Some(line) = line else {
            info!("End of input");
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Invalid(reason) => println!("! {reason}"),
            Command::List => {
                if let Err(e) = controller.refresh_conversations().await {
                    println!("! could not refresh: {e}");
                }
                let state = controller.snapshot();
                for line in render::list_lines(&state.conversations, state.active_title.as_deref()) {
                    println!("{line}");
                }
            }
            Command::Open(title) => {
                controller.select_panel(Panel::Chatbot);
                controller.select_conversation(&title);
            }
            Command::New => controller.start_new_conversation(),
            Command::Delete(title) => match controller.request_delete(&title).await {
                DeleteOutcome::Deleted | DeleteOutcome::Cancelled => {}
                DeleteOutcome::Failed(e) => println!("! could not delete \"{title}\": {e}"),
            },
            Command::Attach(path) => match load_attachment(&path).await {
                Ok(attachment) => {
                    println!("Attached {} ({} bytes)", attachment.file_name, attachment.bytes.len());
                    controller.attach(attachment);
                }
                Err(e) => println!("! could not read {}: {e}", path.display()),
            },
            Command::Detach => controller.remove_attachment(),
            Command::Menu => controller.toggle_menu(),
            Command::Whoami => {
                if let Some(session) = controller.session() {
                    println!("{} ({})", session.display_name(), session.username);
                }
            }
            Command::Send(text) => {
                controller.select_panel(Panel::Chatbot);
                controller.set_input(text);
                if let SendOutcome::Failed(e) = controller.send_message().await {
                    println!("! message not sent: {e}");
                }
            }
        }
    }

    controller.shutdown();
    renderer.abort();
    Ok(())
}
