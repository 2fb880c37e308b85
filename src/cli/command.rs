use std::path::PathBuf;

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: becomes the next message.
    Send(String),
    List,
    Open(String),
    New,
    Delete(String),
    Attach(PathBuf),
    Detach,
    Menu,
    Whoami,
    Help,
    Quit,
    Empty,
    /// A slash command that is not known or is missing its argument.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Send(line.trim_end_matches(['\r', '\n']).to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name, arg) {
            ("list" | "ls", _) => Command::List,
            ("new", _) => Command::New,
            ("detach", _) => Command::Detach,
            ("menu", _) => Command::Menu,
            ("whoami", _) => Command::Whoami,
            ("help" | "?", _) => Command::Help,
            ("quit" | "exit" | "q", _) => Command::Quit,
            ("open" | "delete" | "rm" | "attach", "") => Command::Invalid(format!("/{name} needs an argument")),
            ("open", title) => Command::Open(title.to_string()),
            ("delete" | "rm", title) => Command::Delete(title.to_string()),
            ("attach", path) => Command::Attach(PathBuf::from(path)),
            // "//text" sends text that starts with a slash.
            (_, _) if rest.starts_with('/') => Command::Send(rest.to_string()),
            (other, _) => Command::Invalid(format!("unknown command /{other}")),
        }
    }
}

pub const HELP: &str = "\
Commands:
  /list              refresh and show your conversations
  /open <title>      open a conversation and keep it updated
  /new               start a new conversation (next message creates it)
  /delete <title>    delete a conversation (asks first)
  /attach <path>     attach an image to the next message
  /detach            drop the pending attachment
  /menu              show or hide the conversation list
  /whoami            show who is logged in
  /quit              leave
Anything else is sent as a message.";
