//! Controlled-term labels (`ct_terms`)

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use studymdr_core::flowchart::CodelistLabels;

/// Insert or relabel a term
pub fn upsert_term(conn: &Connection, term_uid: &str, label: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO ct_terms (term_uid, label) VALUES (?1, ?2)
         ON CONFLICT(term_uid) DO UPDATE SET label = excluded.label",
        [term_uid, label],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Every stored label
pub fn load_term_labels(conn: &Connection) -> Result<CodelistLabels> {
    let mut stmt = conn
        .prepare("SELECT term_uid, label FROM ct_terms")
        .map_err(from_rusqlite)?;
    let labels = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<CodelistLabels, _>>()
        .map_err(from_rusqlite)?;
    Ok(labels)
}
