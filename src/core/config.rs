//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.charla/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CharlaConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PollingConfig {
    pub list_interval_ms: Option<u64>,
    pub conversation_interval_ms: Option<u64>,
    pub resync_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct IdentityConfig {
    pub dir: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_LIST_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_CONVERSATION_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_RESYNC_DELAY_MS: u64 = 2000;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

/// How often the engine polls, and how long it waits before re-syncing after a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub list_interval: Duration,
    pub conversation_interval: Duration,
    pub resync_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            list_interval: Duration::from_millis(DEFAULT_LIST_INTERVAL_MS),
            conversation_interval: Duration::from_millis(DEFAULT_CONVERSATION_INTERVAL_MS),
            resync_delay: Duration::from_millis(DEFAULT_RESYNC_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub timing: Timing,
    /// None = use the store's default directory.
    pub identity_dir: Option<PathBuf>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.charla/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".charla").join("config.toml"))
}

/// Load config from `path`, or from `~/.charla/config.toml` when `path` is None.
///
/// If the default file doesn't exist, generates a commented-out default and
/// returns `CharlaConfig::default()`. An explicit path that is missing is an error.
pub fn load_config(path: Option<&Path>) -> Result<CharlaConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => {
                if !p.exists() {
                    info!("No config file found, generating default at {}", p.display());
                    generate_default_config(&p);
                    return Ok(CharlaConfig::default());
                }
                p
            }
            None => {
                warn!("Could not determine home directory, using default config");
                return Ok(CharlaConfig::default());
            }
        },
    };

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: CharlaConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Charla Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# base_url = "http://localhost:8000"    # Or set CHARLA_BASE_URL env var

# [polling]
# list_interval_ms = 5000               # Conversation list refresh
# conversation_interval_ms = 5000       # Open conversation refresh
# resync_delay_ms = 2000                # Extra list refresh after a delete

# [identity]
# dir = "/home/me/.charla/identity"     # Or set CHARLA_IDENTITY_DIR env var
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_base_url` is from the `--base-url` flag (None = not specified).
pub fn resolve(config: &CharlaConfig, cli_base_url: Option<&str>) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli_base_url
        .map(|s| s.to_string())
        .or_else(|| std::env::var("CHARLA_BASE_URL").ok())
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Identity dir: env → config
    let identity_dir = std::env::var("CHARLA_IDENTITY_DIR")
        .ok()
        .or_else(|| config.identity.dir.clone())
        .map(PathBuf::from);

    let polling = &config.polling;
    let timing = Timing {
        list_interval: interval(polling.list_interval_ms, DEFAULT_LIST_INTERVAL_MS),
        conversation_interval: interval(
            polling.conversation_interval_ms,
            DEFAULT_CONVERSATION_INTERVAL_MS,
        ),
        resync_delay: Duration::from_millis(
            polling.resync_delay_ms.unwrap_or(DEFAULT_RESYNC_DELAY_MS),
        ),
    };

    ResolvedConfig {
        base_url,
        timing,
        identity_dir,
    }
}

/// Polling intervals must be positive; 0 is clamped to 1 ms.
fn interval(configured: Option<u64>, default_ms: u64) -> Duration {
    Duration::from_millis(configured.unwrap_or(default_ms).max(1))
}
