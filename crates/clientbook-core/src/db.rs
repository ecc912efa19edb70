// Connection setup for the SQLite store backing the registry.

use std::path::Path;

use tracing::debug;

use crate::error::Result;

pub use rusqlite::Connection;

/// Path that opens an ephemeral, private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Open (or create) the SQLite database at `path` and apply the connection
/// pragmas the registry relies on. Pass [`IN_MEMORY`] for a throwaway store.
///
/// Foreign keys are off by default in SQLite and must be enabled per
/// connection, otherwise `phone_number.personal_id` is never checked.
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    let conn = Connection::open(path)?;
    configure(&conn)?;
    debug!("opened client store at {}", path.display());
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA foreign_keys = ON;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_enables_foreign_keys() {
        let conn = open(IN_MEMORY).unwrap();
        let enabled: bool = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }

    #[test]
    fn open_fails_for_unreachable_path() {
        let err = open("/nonexistent-dir/for/sure/clients.db").unwrap_err();
        assert!(
            matches!(err, crate::error::RegistryError::StoreUnavailable { .. }),
            "unexpected: {err:?}"
        );
    }
}
