//! # Session Identity
//!
//! Resolves who is using the view from two records kept in an identity store:
//! `personaData` (the person) and `userData` (the account). Both must exist and
//! both must be JSON objects, otherwise the view cannot run and the user is sent
//! to the login route.
//!
//! The on-disk store keeps each record as `<dir>/<key>.json`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use serde::Serialize;
use serde_json::{Map, Value};

pub const PERSONA_RECORD: &str = "personaData";
pub const USER_RECORD: &str = "userData";

/// Where the view redirects when there is no usable identity.
pub const LOGIN_ROUTE: &str = "/login";

/// Key-value storage holding the serialized identity records.
pub trait IdentityStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> io::Result<()>;

    /// Removes every record.
    fn clear(&self) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A record is absent, unparsable, or not an object.
    IdentityMissing,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::IdentityMissing => {
                write!(f, "no user identity found, log in first ({LOGIN_ROUTE})")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// The current user. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub person_id: String,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub username: String,
}

impl Session {
    /// Reads and parses both identity records.
    pub fn load(store: &dyn IdentityStore) -> Result<Session, SessionError> {
        let (Some(persona_raw), Some(user_raw)) =
            (store.get_item(PERSONA_RECORD), store.get_item(USER_RECORD))
        else {
            error!("No persona or user data found in identity store");
            return Err(SessionError::IdentityMissing);
        };

        let persona = parse_record(PERSONA_RECORD, &persona_raw)?;
        let user = parse_record(USER_RECORD, &user_raw)?;

        let session = Session {
            person_id: field(&persona, "id_persona"),
            first_name: field(&persona, "nombres"),
            paternal_surname: field(&persona, "apellido_paterno"),
            maternal_surname: field(&persona, "apellido_materno"),
            username: field(&user, "username"),
        };
        info!("Session loaded for user '{}'", session.username);
        Ok(session)
    }

    /// Writes both records, the way a login flow would leave them.
    pub fn store(&self, store: &dyn IdentityStore) -> io::Result<()> {
        let persona = serde_json::json!({
            "id_persona": self.person_id,
            "nombres": self.first_name,
            "apellido_paterno": self.paternal_surname,
            "apellido_materno": self.maternal_surname,
        });
        let user = serde_json::json!({ "username": self.username });
        store.set_item(PERSONA_RECORD, &persona.to_string())?;
        store.set_item(USER_RECORD, &user.to_string())
    }

    pub fn display_name(&self) -> String {
        [
            self.first_name.as_str(),
            self.paternal_surname.as_str(),
            self.maternal_surname.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn parse_record(key: &str, raw: &str) -> Result<Map<String, Value>, SessionError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => {
            error!("Identity record {} is not an object: {}", key, other);
            Err(SessionError::IdentityMissing)
        }
        Err(e) => {
            error!("Error parsing identity record {}: {}", key, e);
            Err(SessionError::IdentityMissing)
        }
    }
}

/// Reads a sub-field as text; numbers are rendered, anything else falls back to "".
fn field(record: &Map<String, Value>, name: &str) -> String {
    match record.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

// ============================================================================
// File-backed store
// ============================================================================

pub struct FileIdentityStore {
    dir: PathBuf,
}

impl FileIdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns `~/.charla/identity/`.
    pub fn default_dir() -> io::Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
        Ok(home.join(".charla").join("identity"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl IdentityStore for FileIdentityStore {
    fn get_item(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.record_path(key)).ok()
    }

    /// Atomic write (`.tmp` + rename).
    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.record_path(key);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        debug!("Stored identity record {}", key);
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        for key in [PERSONA_RECORD, USER_RECORD] {
            let path = self.record_path(key);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
