//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::DatabaseLocation;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated connection plus the schema version it was opened at.
#[derive(Debug)]
pub struct OpenedDb {
    pub conn: Connection,
    /// `0` means the database was created by this open call.
    pub migrated_from: u32,
}

impl OpenedDb {
    pub fn is_fresh(&self) -> bool {
        self.migrated_from == 0
    }
}

/// Opens a SQLite database file and applies all pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let location = DatabaseLocation::File(path.as_ref().to_path_buf());
    open_location(&location, DEFAULT_BUSY_TIMEOUT).map(|opened| opened.conn)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_location(&DatabaseLocation::Memory, DEFAULT_BUSY_TIMEOUT).map(|opened| opened.conn)
}

/// Opens the database at `location`, creating parent directories for file
/// databases.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_location(location: &DatabaseLocation, busy_timeout: Duration) -> DbResult<OpenedDb> {
    let started_at = Instant::now();
    let mode = location.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match location {
        DatabaseLocation::Memory => Connection::open_in_memory().map_err(DbError::from),
        DatabaseLocation::File(path) => ensure_parent_dir(path)
            .and_then(|()| Connection::open(path).map_err(DbError::from)),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err);
        }
    };

    match bootstrap_connection(&mut conn, busy_timeout) {
        Ok(migrated_from) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={} migrated_from={migrated_from}",
                started_at.elapsed().as_millis()
            );
            Ok(OpenedDb {
                conn,
                migrated_from,
            })
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<u32> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)
}
