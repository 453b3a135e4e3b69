//! Configuration for the `chatsim` binary.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/chatsim/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chatsim_proto::room::DataSource;

use crate::chat::SessionConfig;
use crate::reply::ReplyTiming;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    fixtures: FixturesFileConfig,
    reply: ReplyFileConfig,
    chat: ChatFileConfig,
}

/// `[fixtures]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct FixturesFileConfig {
    dir: Option<PathBuf>,
}

/// `[reply]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ReplyFileConfig {
    read_delay_ms: Option<u64>,
    read_jitter_ms: Option<u64>,
    typing_delay_ms: Option<u64>,
    typing_jitter_ms: Option<u64>,
}

/// `[chat]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ChatFileConfig {
    event_buffer: Option<usize>,
    dummy_comment_limit: Option<usize>,
    room_source: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Directory holding `dummy-data.json` and `extended-data.json`.
    pub fixtures_dir: PathBuf,
    /// Data source of the room opened at startup.
    pub room_source: DataSource,

    // -- Reply --
    /// Base delay before the typing indicator.
    pub read_delay: Duration,
    /// Random extra on top of `read_delay`.
    pub read_jitter: Duration,
    /// Base duration of the typing indicator.
    pub typing_delay: Duration,
    /// Random extra on top of `typing_delay`.
    pub typing_jitter: Duration,

    // -- Chat --
    /// Buffer size for the session event channel.
    pub event_buffer: usize,
    /// Number of fixture comments kept for `dummy` rooms.
    pub dummy_comment_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let timing = ReplyTiming::default();
        let session = SessionConfig::default();
        Self {
            fixtures_dir: PathBuf::from("fixtures"),
            room_source: DataSource::Dummy,
            read_delay: timing.read_delay,
            read_jitter: timing.read_jitter,
            typing_delay: timing.typing_delay,
            typing_jitter: timing.typing_jitter,
            event_buffer: session.event_buffer,
            dummy_comment_limit: session.dummy_comment_limit,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path (`~/.config/chatsim/config.toml`)
    /// is tried and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            fixtures_dir: cli
                .fixtures_dir
                .clone()
                .or_else(|| file.fixtures.dir.clone())
                .unwrap_or(defaults.fixtures_dir),
            room_source: cli
                .room_source
                .as_deref()
                .or(file.chat.room_source.as_deref())
                .map_or(defaults.room_source, DataSource::from_tag),
            read_delay: file
                .reply
                .read_delay_ms
                .map_or(defaults.read_delay, Duration::from_millis),
            read_jitter: file
                .reply
                .read_jitter_ms
                .map_or(defaults.read_jitter, Duration::from_millis),
            typing_delay: file
                .reply
                .typing_delay_ms
                .map_or(defaults.typing_delay, Duration::from_millis),
            typing_jitter: file
                .reply
                .typing_jitter_ms
                .map_or(defaults.typing_jitter, Duration::from_millis),
            event_buffer: file.chat.event_buffer.unwrap_or(defaults.event_buffer),
            dummy_comment_limit: file
                .chat
                .dummy_comment_limit
                .unwrap_or(defaults.dummy_comment_limit),
        }
    }

    /// Timing for the auto-reply scheduler.
    #[must_use]
    pub const fn to_reply_timing(&self) -> ReplyTiming {
        ReplyTiming {
            read_delay: self.read_delay,
            read_jitter: self.read_jitter,
            typing_delay: self.typing_delay,
            typing_jitter: self.typing_jitter,
        }
    }

    /// Tuning for the chat session.
    #[must_use]
    pub const fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            event_buffer: self.event_buffer,
            dummy_comment_limit: self.dummy_comment_limit,
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Simulated chat widget with scripted auto-replies")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/chatsim/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing the JSON fixtures.
    #[arg(long, env = "CHATSIM_FIXTURES")]
    pub fixtures_dir: Option<PathBuf>,

    /// Data source of the room opened at startup (new-chat, dummy, extended).
    #[arg(long)]
    pub room_source: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "CHATSIM_LOG")]
    pub log_level: String,

    /// Path to log file (default: stderr).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("chatsim").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
