//! Test utilities for database setup.
//!
//! Reuses the authoritative schema initialization so tests never carry their
//! own copy of the schema.

use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::db::{self, DbPool};

/// File-backed database in a temporary directory.
///
/// Unlike an in-memory database, extra connections to the same file can be
/// opened to simulate independent writers.
pub struct TestEnv {
  /// Temporary directory (kept alive for database file persistence)
  pub temp: TempDir,
  pub db_path: PathBuf,
  pub pool: DbPool,
}

impl TestEnv {
  pub fn new() -> rusqlite::Result<Self> {
    let temp =
      TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let db_path = temp.path().join("flashdeck.db");
    let pool = db::init_db(&db_path)?;
    Ok(Self { temp, db_path, pool })
  }

  /// A separate connection to the same database file
  pub fn open_connection(&self) -> rusqlite::Result<Connection> {
    db::open_connection(&self.db_path)
  }
}
