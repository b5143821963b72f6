//! In-memory person store for tests and previews.
//!
//! Mirrors `SqlitePersonStore` semantics: ids start at 1, increase
//! monotonically and are not reused after delete.

use super::{PersonStore, StoreError, StoreResult};
use crate::model::person::{Person, PersonId};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    last_id: PersonId,
    rows: Vec<Person>,
}

/// Volatile `PersonStore` backed by a `Vec`.
#[derive(Debug, Default)]
pub struct MemoryPersonStore {
    state: Mutex<MemoryState>,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersonStore for MemoryPersonStore {
    fn upsert(&self, person: &Person) -> StoreResult<PersonId> {
        person.validate()?;
        let mut state = self.lock();
        match person.id {
            None => {
                state.last_id += 1;
                let id = state.last_id;
                state
                    .rows
                    .push(Person::with_id(id, person.name.clone(), person.phone.clone()));
                Ok(id)
            }
            Some(id) => {
                let row = state
                    .rows
                    .iter_mut()
                    .find(|row| row.id == Some(id))
                    .ok_or(StoreError::NotFound(id))?;
                row.name.clone_from(&person.name);
                row.phone.clone_from(&person.phone);
                Ok(id)
            }
        }
    }

    fn delete(&self, person: &Person) -> StoreResult<bool> {
        let mut state = self.lock();
        // Rows are kept in id order, so the first field match is the oldest.
        let position = match person.id {
            Some(_) => state.rows.iter().position(|row| row == person),
            None => state.rows.iter().position(|row| row.same_fields(person)),
        };
        match position {
            Some(index) => {
                state.rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn list_all(&self) -> StoreResult<Vec<Person>> {
        Ok(self.lock().rows.clone())
    }
}
