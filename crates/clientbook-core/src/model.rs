// Record types for the personal_information / phone_number tables and the
// argument structs the registry operations take.

use serde::Serialize;

use crate::phones::PhoneList;

/// Primary key of a `personal_information` row.
pub type ClientId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneNumber {
    pub id: i64,
    pub owner_id: ClientId,
    pub number: i64,
}

/// A person together with every phone they own, ordered by phone id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    #[serde(flatten)]
    pub person: Person,
    pub phones: Vec<PhoneNumber>,
}

/// One row of a search: a person left-joined to one of their phones.
/// `phone` is `None` for people with no phone at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRecord {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phones: PhoneList,
}

impl NewClient {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phones: PhoneList::new(),
        }
    }

    pub fn with_phone(mut self, number: i64) -> Self {
        self.phones.extend([number]);
        self
    }

    pub fn with_phones(mut self, numbers: impl IntoIterator<Item = i64>) -> Self {
        self.phones.extend(numbers);
        self
    }
}

/// Field changes for `update_client`. Unset fields are left alone.
///
/// A phone replacement needs both `previous_phone` and `new_phone`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub previous_phone: Option<i64>,
    pub new_phone: Option<i64>,
}

impl ClientChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Search criteria for `find_client`.
///
/// Matching is disjunctive: a row is returned when ANY supplied field
/// matches, so `{ email: a, first_name: b }` also returns every client named
/// `b` regardless of their email. Callers wanting AND semantics must filter
/// the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<i64>,
}

impl ClientQuery {
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn by_phone(phone: i64) -> Self {
        Self {
            phone: Some(phone),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
