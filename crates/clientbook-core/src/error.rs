// Hard failures surfaced by the client registry.
//
// Soft outcomes (duplicate email, unknown client, ...) are not errors; see
// `registry::Skipped`.

use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The store could not be reached or used (cannot open, busy, locked, IO).
    #[error("store unavailable: {source}")]
    StoreUnavailable {
        #[source]
        source: rusqlite::Error,
    },

    /// A UNIQUE, FOREIGN KEY, CHECK or NOT NULL constraint fired.
    #[error("constraint violation: {message}")]
    ConstraintViolation {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Tables are missing or already present.
    #[error("schema error: {message}")]
    SchemaError {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("invalid phone number `{input}`: {message}")]
    InvalidPhone { input: String, message: String },

    /// Any other driver failure (type mismatch, bad row, ...).
    #[error("store error: {0}")]
    Store(#[source] rusqlite::Error),
}

impl RegistryError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, RegistryError::ConstraintViolation { .. })
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(self, RegistryError::SchemaError { .. })
    }
}

impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        let (code, message) = match &err {
            rusqlite::Error::SqliteFailure(failure, message) => (
                failure.code,
                message.clone().unwrap_or_else(|| failure.to_string()),
            ),
            // Prepare-time errors that carry a SQL offset.
            rusqlite::Error::SqlInputError { error, msg, .. } => (error.code, msg.clone()),
            _ => return RegistryError::Store(err),
        };

        match code {
            ErrorCode::ConstraintViolation => RegistryError::ConstraintViolation {
                message,
                source: err,
            },
            ErrorCode::CannotOpen
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::ReadOnly
            | ErrorCode::DiskFull
            | ErrorCode::PermissionDenied => RegistryError::StoreUnavailable { source: err },
            _ if is_schema_message(&message) => RegistryError::SchemaError {
                message,
                source: err,
            },
            _ => RegistryError::Store(err),
        }
    }
}

// SQLite reports missing/duplicate tables as a generic SQLITE_ERROR, so the
// message text is the only discriminator.
fn is_schema_message(message: &str) -> bool {
    message.starts_with("no such table") || message.contains("already exists")
}
