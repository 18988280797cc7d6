//! Administrative utilities: thin single-statement wrappers over the
//! one-shot exec path.

use crate::driver::Connection;
use crate::error::{QuillError, QuillResult};

/// Auto-vacuum discipline of a database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacuumMode {
    None,
    Full,
    Incremental,
}

impl VacuumMode {
    fn pragma_value(self) -> i64 {
        match self {
            VacuumMode::None => 0,
            VacuumMode::Full => 1,
            VacuumMode::Incremental => 2,
        }
    }

    fn from_pragma(value: i64) -> QuillResult<Self> {
        match value {
            0 => Ok(VacuumMode::None),
            1 => Ok(VacuumMode::Full),
            2 => Ok(VacuumMode::Incremental),
            other => Err(QuillError::UnableToExecuteQuery(format!(
                "unexpected auto_vacuum value {other}"
            ))),
        }
    }
}

fn single_value(conn: &Connection, sql: &str) -> QuillResult<String> {
    let rows = conn.exec(sql)?;
    rows.first()
        .and_then(|row| row.columns().first())
        .and_then(|(_, value)| value.clone())
        .ok_or_else(|| QuillError::UnableToExecuteQuery(format!("'{sql}' produced no value")))
}

fn parse_int(conn: &Connection, sql: &str) -> QuillResult<i64> {
    let text = single_value(conn, sql)?;
    text.parse()
        .map_err(|_| QuillError::UnableToExecuteQuery(format!("'{sql}' produced non-integer '{text}'")))
}

/// Page-cache size of the connection.
pub fn cache_size(conn: &Connection) -> QuillResult<i64> {
    parse_int(conn, "PRAGMA cache_size;")
}

/// Set the page-cache size; negative values are kibibytes.
pub fn set_cache_size(conn: &Connection, size: i64) -> QuillResult<()> {
    conn.exec(&format!("PRAGMA cache_size = {size};")).map(|_| ())
}

/// Run the engine's integrity check; anything but a single `ok` row
/// fails.
pub fn integrity_check(conn: &Connection) -> QuillResult<()> {
    let rows = conn.exec("PRAGMA integrity_check;")?;
    let mut findings = Vec::new();
    for row in &rows {
        for (_, value) in row.columns() {
            match value.as_deref() {
                Some("ok") => {}
                Some(problem) => findings.push(problem.to_owned()),
                None => findings.push("NULL".to_owned()),
            }
        }
    }
    if !findings.is_empty() {
        return Err(QuillError::FailedIntegrityChecks(findings.join("; ")));
    }
    Ok(())
}

/// Current auto-vacuum mode.
pub fn vacuum_mode(conn: &Connection) -> QuillResult<VacuumMode> {
    VacuumMode::from_pragma(parse_int(conn, "PRAGMA auto_vacuum;")?)
}

/// Change the auto-vacuum mode. The engine applies the change to a
/// non-empty database only after a subsequent `VACUUM`, which this
/// runs.
pub fn set_vacuum_mode(conn: &Connection, mode: VacuumMode) -> QuillResult<()> {
    conn.exec(&format!("PRAGMA auto_vacuum = {};", mode.pragma_value()))?;
    conn.exec("VACUUM;").map(|_| ())
}

/// Create a single-field index named `idx_<container>_<field>`.
pub fn create_index(conn: &Connection, container: &str, field: &str) -> QuillResult<()> {
    conn.exec(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{container}_{field} ON {container} ({field});"
    ))
    .map(|_| ())
}

/// Drop the index created by [`create_index`].
pub fn drop_index(conn: &Connection, container: &str, field: &str) -> QuillResult<()> {
    conn.exec(&format!("DROP INDEX IF EXISTS idx_{container}_{field};"))
        .map(|_| ())
}

/// Count the records of a container.
pub fn count_records(conn: &Connection, container: &str) -> QuillResult<u64> {
    let n = parse_int(conn, &format!("SELECT COUNT(*) FROM {container};"))?;
    Ok(n as u64)
}

/// Rename a container.
pub fn rename_container(conn: &Connection, old: &str, new: &str) -> QuillResult<()> {
    conn.exec(&format!("ALTER TABLE {old} RENAME TO {new};"))
        .map(|_| ())
}

/// Drop a container.
pub fn drop_container(conn: &Connection, container: &str) -> QuillResult<()> {
    conn.exec(&format!("DROP TABLE IF EXISTS {container};"))
        .map(|_| ())
}

/// The application-owned schema version (`user_version` pragma).
pub fn schema_version(conn: &Connection) -> QuillResult<i64> {
    parse_int(conn, "PRAGMA user_version;")
}

/// Set the application-owned schema version.
pub fn set_schema_version(conn: &Connection, version: i64) -> QuillResult<()> {
    conn.exec(&format!("PRAGMA user_version = {version};"))
        .map(|_| ())
}
