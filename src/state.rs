//! Application state shared by all handlers and background tasks.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::session::ChatSessions;

#[derive(Clone)]
pub struct AppState {
  pub db: DbPool,
  pub config: Arc<AppConfig>,
  /// Per-user chat review queues
  pub sessions: ChatSessions,
}

impl AppState {
  pub fn new(db: DbPool, config: AppConfig) -> Self {
    Self {
      db,
      config: Arc::new(config),
      sessions: ChatSessions::new(),
    }
  }
}
