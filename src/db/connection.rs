use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{LibraryResult, StorageContext};

/// Open (or create) the SQLite file backing the store and make sure the
/// schema exists.
pub fn open_database(path: &Path) -> LibraryResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path).storage("open the library database")?;
    ensure_schema(&conn)?;
    debug!(path = %path.display(), "opened library database");
    Ok(conn)
}

/// Each collection is one row holding a whole-collection JSON snapshot, so a
/// single statement replaces it atomically.
pub fn ensure_schema(conn: &Connection) -> LibraryResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            payload TEXT NOT NULL
        )",
        [],
    )
    .storage("create the collections table")?;
    Ok(())
}

pub(crate) fn read_blob(conn: &Connection, name: &str) -> LibraryResult<Option<String>> {
    let payload = conn
        .query_row(
            "SELECT payload FROM collections WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .storage("read a stored collection")?;
    Ok(payload)
}

pub(crate) fn write_blob(conn: &Connection, name: &str, payload: &str) -> LibraryResult<()> {
    conn.execute(
        "INSERT INTO collections (name, payload) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET payload = excluded.payload",
        params![name, payload],
    )
    .storage("write a stored collection")?;
    Ok(())
}
