// Library root: the client registry and the pieces around it (connection
// setup, schema, input normalization, config).

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod phones;
pub mod registry;
pub mod schema;

pub use error::{RegistryError, Result};
pub use model::{
    Client, ClientChanges, ClientId, ClientQuery, ClientRecord, NewClient, Person, PhoneNumber,
};
pub use phones::PhoneList;
pub use registry::{ClientRegistry, FieldChange, Outcome, Skipped, UpdateReport};
