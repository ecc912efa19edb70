// DDL for the two registry tables.
//
// `phone_number.personal_id` references `personal_information(id)` without an
// ON DELETE action: deleting a client removes its phones explicitly first.

use rusqlite::Connection;

use crate::error::Result;

pub const PERSON_TABLE: &str = "personal_information";
pub const PHONE_TABLE: &str = "phone_number";

const CREATE_PERSON: &str = "
    CREATE TABLE IF NOT EXISTS personal_information (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL CHECK (length(first_name) <= 60),
        last_name  TEXT NOT NULL CHECK (length(last_name) <= 60),
        email      TEXT NOT NULL UNIQUE CHECK (length(email) <= 80)
    );";

const CREATE_PHONE: &str = "
    CREATE TABLE IF NOT EXISTS phone_number (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        personal_id INTEGER NOT NULL REFERENCES personal_information(id),
        number      INTEGER NOT NULL CHECK (number > 1)
    );";

// Dependency order: phones reference people.
const DROP_ALL: &str = "
    DROP TABLE phone_number;
    DROP TABLE personal_information;";

pub(crate) fn create(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_PERSON)?;
    conn.execute_batch(CREATE_PHONE)?;
    Ok(())
}

pub(crate) fn drop_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(DROP_ALL)?;
    Ok(())
}

/// Names of the registry tables currently present, sorted.
pub fn existing_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name IN (?1, ?2)
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([PERSON_TABLE, PHONE_TABLE], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}
