pub mod cards;
pub mod decks;
pub mod reviews;
pub mod schema;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// Re-export all public items from submodules
pub use cards::*;
pub use decks::*;
pub use reviews::*;
pub use schema::run_migrations;

pub type DbPool = Arc<Mutex<Connection>>;

/// How long a writer waits for another connection's transaction to finish
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
  /// Log the error at warn level and return None
  fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
  fn log_warn(self, context: &str) -> Option<T> {
    match self {
      Ok(v) => Some(v),
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        None
      }
    }
  }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Database unavailable")
  }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    if let Err(e) = std::fs::create_dir_all(parent) {
      tracing::warn!("Could not create database directory {}: {}", parent.display(), e);
    }
  }

  let conn = open_connection(path)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Open a connection that waits on locked writes instead of failing with SQLITE_BUSY
pub fn open_connection(path: &Path) -> Result<Connection> {
  let conn = Connection::open(path)?;
  conn.busy_timeout(BUSY_TIMEOUT)?;
  conn.execute_batch("PRAGMA foreign_keys = ON;")?;
  Ok(conn)
}

/// In-memory database with the full schema, for tests and throwaway runs
pub fn init_memory_db() -> Result<DbPool> {
  let conn = Connection::open_in_memory()?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Fixed-width UTC timestamps so stored values order correctly as text
pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(idx: usize, value: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(value)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_timestamp_text_order_matches_time_order() {
    let whole = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let fractional = whole + chrono::Duration::milliseconds(250);
    assert!(format_timestamp(whole) < format_timestamp(fractional));
    assert_eq!(format_timestamp(whole), "2025-01-01T00:00:00.000000Z");
  }

  #[test]
  fn test_timestamp_roundtrip() {
    let dt = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
    assert_eq!(parse_timestamp(0, &format_timestamp(dt)).unwrap(), dt);
    assert!(parse_timestamp(0, "yesterday").is_err());
  }

  #[test]
  fn test_log_warn() {
    let err: std::result::Result<i64, DbLockError> = Err(DbLockError);
    assert_eq!(err.log_warn("lock"), None);
    let ok: std::result::Result<i64, DbLockError> = Ok(7);
    assert_eq!(ok.log_warn("lock"), Some(7));
  }

  #[test]
  fn test_init_db_creates_parent_dir() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("nested").join("cards.db");
    let pool = init_db(&path).unwrap();
    assert!(path.exists());
    assert!(try_lock(&pool).is_ok());
  }
}
