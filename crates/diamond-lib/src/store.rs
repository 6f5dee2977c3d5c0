//! SQLite record store
//!
//! Every operation opens its own short-lived connection; nothing holds a
//! connection across calls.

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Wait this long for a competing writer before failing with `SQLITE_BUSY`
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS models_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model_name TEXT NOT NULL,
    model_version INTEGER NOT NULL CHECK (model_version > 0),
    training_dataset TEXT NOT NULL,
    metrics TEXT NOT NULL,
    created TEXT NOT NULL,
    model_description TEXT NOT NULL,
    model_pickle_path TEXT NOT NULL,
    UNIQUE (model_name, model_version)
);

CREATE TABLE IF NOT EXISTS api_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    api TEXT NOT NULL,
    request TEXT NOT NULL,
    response TEXT NOT NULL
);
";

/// Open the database at `path`, creating it and its schema on first use
pub fn open(path: &Path) -> Result<Connection, rusqlite::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        // A failure here surfaces as SQLITE_CANTOPEN below
        let _ = fs::create_dir_all(parent);
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(conn)
}

/// Append one request/response pair to `api_history`
pub fn insert_api_history(
    conn: &Connection,
    api: &str,
    request: &str,
    response: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO api_history (api, request, response) VALUES (?1, ?2, ?3)",
        (api, request, response),
    )?;
    Ok(())
}

/// Number of rows in `api_history`
pub fn api_history_len(conn: &Connection) -> Result<u64, rusqlite::Error> {
    conn.query_row("SELECT COUNT(*) FROM api_history", [], |row| row.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_schema_and_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("instance").join("app_db.sqlite");

        let conn = open(&path).unwrap();
        assert!(path.exists());

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(tables.contains(&"models_history".to_string()));
        assert!(tables.contains(&"api_history".to_string()));
    }

    #[test]
    fn test_open_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.sqlite");
        {
            let conn = open(&path).unwrap();
            insert_api_history(&conn, "/predict_price", "{}", "{}").unwrap();
        }
        let conn = open(&path).unwrap();
        assert_eq!(api_history_len(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let conn = open(&dir.path().join("db.sqlite")).unwrap();
        let insert = "INSERT INTO models_history (model_name, model_version, training_dataset, \
                      metrics, created, model_description, model_pickle_path) \
                      VALUES ('m', 1, 'd', '{}', 'now', '', 'p')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
