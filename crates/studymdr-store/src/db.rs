//! Database connection management

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use rusqlite::Connection;
use std::path::Path;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Enable foreign keys and WAL journaling
pub fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(from_rusqlite)?;

    // journal_mode answers with the resulting mode ("memory" for in-memory dbs)
    let mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(from_rusqlite)?;
    tracing::debug!(journal_mode = %mode, "Configured SQLite connection");

    Ok(())
}

/// Open, configure and migrate a database file
pub fn open_store<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let mut conn = open(path)?;
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

/// In-memory counterpart of [`open_store`]
pub fn open_store_in_memory() -> Result<Connection> {
    let mut conn = open_in_memory()?;
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}
