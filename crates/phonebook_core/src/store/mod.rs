//! Entity store contracts for the `person` relation.
//!
//! # Responsibility
//! - Define the durable create/list/delete contract (`PersonStore`).
//! - Provide SQLite and in-memory implementations behind that contract.
//!
//! # Invariants
//! - Write paths must call `Person::validate()` before mutating storage.
//! - Storage failures (`StoreError::Db`) stay distinguishable from semantic
//!   outcomes: delete of a missing record is `Ok(false)`, not an error.
//! - `list_all` returns rows in insertion order.

use crate::db::DbError;
use crate::model::person::{Person, PersonId, PersonValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory_store;
pub mod sqlite_store;

pub use memory_store::MemoryPersonStore;
pub use sqlite_store::SqlitePersonStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure kinds raised by entity store implementations.
#[derive(Debug)]
pub enum StoreError {
    /// Write rejected before reaching storage.
    Validation(PersonValidationError),
    /// Storage-layer I/O or SQLite failure.
    Db(DbError),
    /// Upsert referenced an id with no live row.
    NotFound(PersonId),
    /// Persisted row could not be mapped back to a `Person`.
    InvalidData(String),
}

impl StoreError {
    /// Returns whether this error came from the storage backend itself.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Db(_) | Self::InvalidData(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<PersonValidationError> for StoreError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable storage contract for contact records.
pub trait PersonStore {
    /// Inserts when `person.id` is `None` and returns the assigned id;
    /// otherwise replaces the fields of the existing row with that id.
    ///
    /// # Errors
    /// - `StoreError::Validation` for empty name/phone.
    /// - `StoreError::NotFound` when `person.id` names no live row.
    fn upsert(&self, person: &Person) -> StoreResult<PersonId>;

    /// Removes the record whose fields equal `person`.
    ///
    /// With an id the full record (id, name, phone) must match. Without an id
    /// only the oldest `(name, phone)` match is removed. Returns whether a row
    /// was removed.
    fn delete(&self, person: &Person) -> StoreResult<bool>;

    /// Returns every record ordered by id (insertion order).
    fn list_all(&self) -> StoreResult<Vec<Person>>;
}

impl<S: PersonStore + ?Sized> PersonStore for Box<S> {
    fn upsert(&self, person: &Person) -> StoreResult<PersonId> {
        (**self).upsert(person)
    }

    fn delete(&self, person: &Person) -> StoreResult<bool> {
        (**self).delete(person)
    }

    fn list_all(&self) -> StoreResult<Vec<Person>> {
        (**self).list_all()
    }
}
