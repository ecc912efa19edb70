// Client registry: CRUD and search over personal_information / phone_number.
//
// Every write runs in its own transaction. Guards that decide whether a write
// happens ("is this email taken?", "does this client exist?") are evaluated
// inside that same transaction, opened IMMEDIATE so SQLite holds the write
// lock from the check through the commit. The public `list_*` helpers are
// plain reads; combining them with a later write from outside the registry
// still races with other writers.

use std::fmt;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{
    Client, ClientChanges, ClientId, ClientQuery, ClientRecord, NewClient, Person, PhoneNumber,
};
use crate::schema;

const INSERT_PERSON: &str = "
    INSERT INTO personal_information (first_name, last_name, email)
    VALUES (?1, ?2, ?3)
    RETURNING id";

const INSERT_PHONE: &str = "
    INSERT INTO phone_number (personal_id, number)
    VALUES (?1, ?2)
    RETURNING id";

const SEARCH: &str = "
    SELECT pi.id, pi.first_name, pi.last_name, pi.email, pn.number
    FROM personal_information pi
    LEFT JOIN phone_number pn ON pi.id = pn.personal_id
    WHERE pi.first_name = ?1 OR pi.last_name = ?2 OR pi.email = ?3 OR pn.number = ?4
    ORDER BY pi.id, pn.id";

const LIST_ALL: &str = "
    SELECT pi.id, pi.first_name, pi.last_name, pi.email, pn.number
    FROM personal_information pi
    LEFT JOIN phone_number pn ON pi.id = pn.personal_id
    ORDER BY pi.id, pn.id";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A soft failure: the operation was skipped and nothing changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    DuplicateEmail { email: String },
    ClientNotFound { client_id: ClientId },
    PhoneNotFound { number: i64 },
    /// A replacement phone was given without the number it replaces.
    MissingPreviousPhone { new_phone: i64 },
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skipped::DuplicateEmail { email } => {
                write!(f, "a client with email {email} already exists")
            }
            Skipped::ClientNotFound { client_id } => {
                write!(f, "client {client_id} does not exist")
            }
            Skipped::PhoneNotFound { number } => {
                write!(f, "phone number {number} is not in the database")
            }
            Skipped::MissingPreviousPhone { new_phone } => write!(
                f,
                "specify the phone number to replace with {new_phone}; nothing changed"
            ),
        }
    }
}

/// Result of an operation that may be skipped for a soft reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Skipped(Skipped),
}

impl<T> Outcome<T> {
    /// A skipped outcome. Logs the reason at warn level.
    pub fn skip(reason: Skipped) -> Self {
        warn!("skipped: {reason}");
        Outcome::Skipped(reason)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Skipped(_) => None,
        }
    }

    pub fn skipped(&self) -> Option<&Skipped> {
        match self {
            Outcome::Done(_) => None,
            Outcome::Skipped(reason) => Some(reason),
        }
    }
}

/// A field change that `update_client` committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    FirstName(String),
    LastName(String),
    Email(String),
    /// `rows` counts the phone rows owned by the client that were rewritten;
    /// it is 0 when `previous` exists but belongs to somebody else.
    Phone { previous: i64, new: i64, rows: usize },
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldChange::FirstName(name) => write!(f, "first name set to {name}"),
            FieldChange::LastName(name) => write!(f, "last name set to {name}"),
            FieldChange::Email(email) => write!(f, "email set to {email}"),
            FieldChange::Phone { previous, new, rows } => {
                write!(f, "phone {previous} changed to {new} ({rows} row(s))")
            }
        }
    }
}

/// Per-field result of `update_client`, in the order the steps ran. Each
/// applied change is already committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub applied: Vec<FieldChange>,
    pub skipped: Vec<Skipped>,
}

impl UpdateReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    fn record(&mut self, step: Outcome<FieldChange>) {
        match step {
            Outcome::Done(change) => self.applied.push(change),
            Outcome::Skipped(reason) => self.skipped.push(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Data-access operations over a caller-owned connection.
///
/// The connection must have been opened with foreign keys enabled (see
/// [`crate::db::open`]); the registry never opens or closes it.
pub struct ClientRegistry<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ClientRegistry<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Read-only access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &*self.conn
    }

    // ------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------

    /// Create both tables if they are absent. Safe to call repeatedly.
    pub fn initialize_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        schema::create(&tx)?;
        tx.commit()?;
        info!("tables phone_number and personal_information created");
        Ok(())
    }

    /// Drop `phone_number` then `personal_information`. Fails with a schema
    /// error, and drops nothing, if either table is missing.
    pub fn drop_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        schema::drop_all(&tx)?;
        tx.commit()?;
        info!("tables phone_number and personal_information dropped");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Every client email, in storage order.
    pub fn list_emails(&self) -> Result<Vec<String>> {
        collect_column(&*self.conn, "SELECT email FROM personal_information ORDER BY id")
    }

    /// Every phone number across all clients, in storage order.
    pub fn list_phone_numbers(&self) -> Result<Vec<i64>> {
        collect_column(&*self.conn, "SELECT number FROM phone_number ORDER BY id")
    }

    /// Every client id, in storage order.
    pub fn list_client_ids(&self) -> Result<Vec<ClientId>> {
        collect_column(&*self.conn, "SELECT id FROM personal_information ORDER BY id")
    }

    /// A client and all of their phones, or `None` if the id is unknown.
    pub fn get_client(&self, client_id: ClientId) -> Result<Option<Client>> {
        let person = self
            .conn
            .query_row(
                "SELECT id, first_name, last_name, email
                 FROM personal_information WHERE id = ?1",
                params![client_id],
                |row| {
                    Ok(Person {
                        id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        email: row.get(3)?,
                    })
                },
            )
            .optional()?;

        let Some(person) = person else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT id, personal_id, number FROM phone_number
             WHERE personal_id = ?1 ORDER BY id",
        )?;
        let phones = stmt
            .query_map(params![client_id], |row| {
                Ok(PhoneNumber {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    number: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(Client { person, phones }))
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a client and their phones atomically. Returns the new id, or
    /// `DuplicateEmail` without touching the store if the email is taken.
    ///
    /// A rejected phone (e.g. `number <= 1`) rolls back the person as well.
    pub fn add_client(&mut self, client: &NewClient) -> Result<Outcome<ClientId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if email_exists(&tx, &client.email)? {
            return Ok(Outcome::skip(Skipped::DuplicateEmail {
                email: client.email.clone(),
            }));
        }

        let client_id: ClientId = tx.query_row(
            INSERT_PERSON,
            params![client.first_name, client.last_name, client.email],
            |row| row.get(0),
        )?;

        {
            let mut insert_phone = tx.prepare(INSERT_PHONE)?;
            for number in client.phones.iter() {
                insert_phone.query_row(params![client_id, number], |row| row.get::<_, i64>(0))?;
            }
        }

        tx.commit()?;
        info!(
            "client {} {} added with id {} ({} phone(s))",
            client.first_name,
            client.last_name,
            client_id,
            client.phones.len()
        );
        Ok(Outcome::Done(client_id))
    }

    /// Attach one phone to an existing client. Returns the phone row id.
    pub fn add_phone(&mut self, client_id: ClientId, phone: i64) -> Result<Outcome<i64>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !client_exists(&tx, client_id)? {
            return Ok(Outcome::skip(Skipped::ClientNotFound { client_id }));
        }

        let phone_id: i64 = tx.query_row(INSERT_PHONE, params![client_id, phone], |row| row.get(0))?;
        tx.commit()?;
        info!("phone {phone} added for client {client_id}");
        Ok(Outcome::Done(phone_id))
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply `changes` to a client, one committed step per field, in the
    /// order first name, last name, email, phone.
    ///
    /// A soft failure in one step (taken email, unknown phone) is recorded
    /// and the remaining steps still run. A hard error stops the call, but
    /// steps committed before it stay committed.
    pub fn update_client(
        &mut self,
        client_id: ClientId,
        changes: &ClientChanges,
    ) -> Result<Outcome<UpdateReport>> {
        if !client_exists(&*self.conn, client_id)? {
            return Ok(Outcome::skip(Skipped::ClientNotFound { client_id }));
        }

        let mut report = UpdateReport::default();

        if let Some(first_name) = &changes.first_name {
            self.conn.execute(
                "UPDATE personal_information SET first_name = ?1 WHERE id = ?2",
                params![first_name, client_id],
            )?;
            info!("first name of client {client_id} changed to {first_name}");
            report.applied.push(FieldChange::FirstName(first_name.clone()));
        }

        if let Some(last_name) = &changes.last_name {
            self.conn.execute(
                "UPDATE personal_information SET last_name = ?1 WHERE id = ?2",
                params![last_name, client_id],
            )?;
            info!("last name of client {client_id} changed to {last_name}");
            report.applied.push(FieldChange::LastName(last_name.clone()));
        }

        if let Some(email) = &changes.email {
            report.record(self.replace_email(client_id, email)?);
        }

        match (changes.previous_phone, changes.new_phone) {
            (Some(previous), Some(new)) => {
                report.record(self.replace_phone(client_id, previous, new)?);
            }
            (None, Some(new_phone)) => {
                report.record(Outcome::skip(Skipped::MissingPreviousPhone { new_phone }));
            }
            // A previous phone alone asks for nothing.
            (_, None) => {}
        }

        Ok(Outcome::Done(report))
    }

    fn replace_email(&mut self, client_id: ClientId, email: &str) -> Result<Outcome<FieldChange>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if email_exists(&tx, email)? {
            return Ok(Outcome::skip(Skipped::DuplicateEmail {
                email: email.to_string(),
            }));
        }

        tx.execute(
            "UPDATE personal_information SET email = ?1 WHERE id = ?2",
            params![email, client_id],
        )?;
        tx.commit()?;
        info!("email of client {client_id} changed to {email}");
        Ok(Outcome::Done(FieldChange::Email(email.to_string())))
    }

    fn replace_phone(
        &mut self,
        client_id: ClientId,
        previous: i64,
        new: i64,
    ) -> Result<Outcome<FieldChange>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !phone_exists(&tx, previous)? {
            return Ok(Outcome::skip(Skipped::PhoneNotFound { number: previous }));
        }

        let rows = tx.execute(
            "UPDATE phone_number SET number = ?1 WHERE personal_id = ?2 AND number = ?3",
            params![new, client_id, previous],
        )?;
        tx.commit()?;
        info!("phone {previous} of client {client_id} changed to {new} ({rows} row(s))");
        Ok(Outcome::Done(FieldChange::Phone { previous, new, rows }))
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove a phone from a client. Returns the number of rows deleted,
    /// which is 0 when the number exists but belongs to another client.
    pub fn delete_phone(&mut self, client_id: ClientId, phone: i64) -> Result<Outcome<usize>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !client_exists(&tx, client_id)? {
            return Ok(Outcome::skip(Skipped::ClientNotFound { client_id }));
        }
        if !phone_exists(&tx, phone)? {
            return Ok(Outcome::skip(Skipped::PhoneNotFound { number: phone }));
        }

        let rows = tx.execute(
            "DELETE FROM phone_number WHERE personal_id = ?1 AND number = ?2",
            params![client_id, phone],
        )?;
        tx.commit()?;
        info!("phone {phone} of client {client_id} deleted ({rows} row(s))");
        Ok(Outcome::Done(rows))
    }

    /// Delete a client's phones and then the client, in one transaction.
    /// Returns how many phones were removed with them.
    pub fn delete_client(&mut self, client_id: ClientId) -> Result<Outcome<usize>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !client_exists(&tx, client_id)? {
            return Ok(Outcome::skip(Skipped::ClientNotFound { client_id }));
        }

        let phones = tx.execute(
            "DELETE FROM phone_number WHERE personal_id = ?1",
            params![client_id],
        )?;
        tx.execute(
            "DELETE FROM personal_information WHERE id = ?1",
            params![client_id],
        )?;
        tx.commit()?;
        info!("client {client_id} deleted along with {phones} phone(s)");
        Ok(Outcome::Done(phones))
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Clients matching ANY of the supplied criteria, one row per phone
    /// (a single row with `phone: None` for clients without phones).
    ///
    /// Matching is an OR across fields, see [`ClientQuery`]. An empty
    /// query matches nothing.
    pub fn find_client(&self, query: &ClientQuery) -> Result<Vec<ClientRecord>> {
        let mut stmt = self.conn.prepare(SEARCH)?;
        let records = stmt
            .query_map(
                params![query.first_name, query.last_name, query.email, query.phone],
                map_record,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("find_client {:?} matched {} row(s)", query, records.len());
        Ok(records)
    }

    /// Every client left-joined to their phones, ordered by client id.
    pub fn list_clients(&self) -> Result<Vec<ClientRecord>> {
        let mut stmt = self.conn.prepare(LIST_ALL)?;
        let records = stmt
            .query_map([], map_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClientRecord> {
    Ok(ClientRecord {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
    })
}

fn collect_column<T: rusqlite::types::FromSql>(conn: &Connection, sql: &str) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let values = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(values)
}

fn exists(conn: &Connection, sql: &str, param: impl rusqlite::ToSql) -> Result<bool> {
    let found: bool = conn.query_row(sql, params![param], |row| row.get(0))?;
    Ok(found)
}

fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM personal_information WHERE email = ?1)",
        email,
    )
}

fn client_exists(conn: &Connection, client_id: ClientId) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM personal_information WHERE id = ?1)",
        client_id,
    )
}

fn phone_exists(conn: &Connection, number: i64) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM phone_number WHERE number = ?1)",
        number,
    )
}
