//! Person domain model.
//!
//! # Responsibility
//! - Define the contact record rendered by list screens and submitted by
//!   register screens.
//! - Provide field-presence validation used by every write path.
//!
//! # Invariants
//! - `id` is `None` until the store assigns one on insert.
//! - Assigned ids increase monotonically and are never reused.
//! - `name` and `phone` are replaced only as a whole record.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned row identifier (`person.id`).
pub type PersonId = i64;

/// One contact-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    /// Auto-generated primary key; `None` for records not yet persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PersonId>,
    pub name: String,
    pub phone: String,
}

/// Field-presence violations for `Person` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonValidationError {
    EmptyName,
    EmptyPhone,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "person name must not be empty"),
            Self::EmptyPhone => write!(f, "person phone must not be empty"),
        }
    }
}

impl Error for PersonValidationError {}

impl Person {
    /// Creates an unsaved person; the store assigns `id` on insert.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// Creates a person mirroring an already persisted row.
    pub fn with_id(id: PersonId, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// Checks that both fields carry non-whitespace content.
    ///
    /// Values are not trimmed in place; callers decide normalization.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.name.trim().is_empty() {
            return Err(PersonValidationError::EmptyName);
        }
        if self.phone.trim().is_empty() {
            return Err(PersonValidationError::EmptyPhone);
        }
        Ok(())
    }

    /// Returns whether this record has been assigned a store id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns true when `other` carries the same name and phone.
    pub fn same_fields(&self, other: &Person) -> bool {
        self.name == other.name && self.phone == other.phone
    }
}
