//! Application configuration.
//!
//! Tunable constants live here alongside the runtime settings loaded from
//! `config.toml`, `.env` and the process environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ==================== SRS Defaults ====================

/// Interval of a newly authored card
pub const DEFAULT_INTERVAL_DAYS: u32 = 0;

/// Starting ease factor of a newly authored card
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

// ==================== Server Configuration ====================

pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0";

pub const DEFAULT_SERVER_PORT: u16 = 3001;

pub const DEFAULT_DATABASE_PATH: &str = "data/flashdeck.db";

/// Header the chat bot sends its shared API key in
pub const BOT_API_KEY_HEADER: &str = "X-Bot-API-Key";

// ==================== Dispatch Configuration ====================

/// How often due chat reviews are polled for
pub const DEFAULT_DISPATCH_INTERVAL_SECS: u64 = 60;

// ==================== Config file ====================

/// Structure of config.toml; every field is optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
  database: Option<DatabaseSection>,
  server: Option<ServerSection>,
  bot: Option<BotSection>,
  dispatch: Option<DispatchSection>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
  path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
  addr: Option<String>,
  port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct BotSection {
  api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DispatchSection {
  interval_secs: Option<u64>,
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_path: PathBuf,
  pub server_addr: String,
  pub server_port: u16,
  /// Shared secret for the bot-facing endpoints; `None` rejects every bot call
  pub bot_api_key: Option<String>,
  pub dispatch_interval: Duration,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
      server_addr: DEFAULT_SERVER_ADDR.to_string(),
      server_port: DEFAULT_SERVER_PORT,
      bot_api_key: None,
      dispatch_interval: Duration::from_secs(DEFAULT_DISPATCH_INTERVAL_SECS),
    }
  }
}

impl AppConfig {
  /// Load settings with priority: config.toml > environment (.env included) > default
  pub fn load() -> Self {
    let _ = dotenvy::dotenv();
    let file = read_file_config(Path::new("config.toml"));
    Self::resolve(file, |key| std::env::var(key).ok())
  }

  fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
    let defaults = Self::default();
    let database = file.database.unwrap_or_default();
    let server = file.server.unwrap_or_default();
    let bot = file.bot.unwrap_or_default();
    let dispatch = file.dispatch.unwrap_or_default();

    let database_path = database
      .path
      .or_else(|| env("DATABASE_PATH"))
      .map(PathBuf::from)
      .unwrap_or(defaults.database_path);

    let server_addr = server
      .addr
      .or_else(|| env("SERVER_ADDR"))
      .unwrap_or(defaults.server_addr);

    let server_port = server
      .port
      .or_else(|| env("SERVER_PORT").and_then(|v| parse_or_warn("SERVER_PORT", &v)))
      .unwrap_or(defaults.server_port);

    let bot_api_key = bot
      .api_key
      .or_else(|| env("BOT_API_KEY"))
      .filter(|key| !key.is_empty());

    let dispatch_interval = dispatch
      .interval_secs
      .or_else(|| {
        env("DISPATCH_INTERVAL_SECS").and_then(|v| parse_or_warn("DISPATCH_INTERVAL_SECS", &v))
      })
      .filter(|secs| *secs > 0)
      .map(Duration::from_secs)
      .unwrap_or(defaults.dispatch_interval);

    if bot_api_key.is_none() {
      tracing::warn!("BOT_API_KEY is not set; bot endpoints will refuse every request");
    }

    Self {
      database_path,
      server_addr,
      server_port,
      bot_api_key,
      dispatch_interval,
    }
  }

  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.server_addr, self.server_port)
  }
}

fn read_file_config(path: &Path) -> FileConfig {
  let Ok(contents) = std::fs::read_to_string(path) else {
    return FileConfig::default();
  };
  match toml::from_str::<FileConfig>(&contents) {
    Ok(config) => {
      tracing::info!("Loaded configuration from {}", path.display());
      config
    }
    Err(e) => {
      tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
      FileConfig::default()
    }
  }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
  match value.parse() {
    Ok(v) => Some(v),
    Err(_) => {
      tracing::warn!("Ignoring invalid {}={}", key, value);
      None
    }
  }
}
