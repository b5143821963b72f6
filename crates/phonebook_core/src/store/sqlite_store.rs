//! SQLite-backed person store.
//!
//! # Invariants
//! - The owned connection has migrations applied (see `db::open_db`).
//! - Ids come from `AUTOINCREMENT` and are never reused after delete.

use super::{PersonStore, StoreError, StoreResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::person::{Person, PersonId};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PERSON_SELECT_SQL: &str = "SELECT id, name, phone FROM person";

/// Person store owning one SQLite connection.
pub struct SqlitePersonStore {
    conn: Connection,
}

impl SqlitePersonStore {
    /// Wraps a bootstrapped connection.
    ///
    /// # Errors
    /// - `StoreError::InvalidData` when the connection schema is behind or
    ///   ahead of this binary; open it through `db::open_db` first.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let actual = current_user_version(&conn)?;
        let expected = latest_version();
        if actual != expected {
            return Err(StoreError::InvalidData(format!(
                "connection schema version {actual} does not match expected {expected}"
            )));
        }
        Ok(Self { conn })
    }

    /// Gives read access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert(&self, person: &Person) -> StoreResult<PersonId> {
        self.conn.execute(
            "INSERT INTO person (name, phone) VALUES (?1, ?2);",
            params![person.name.as_str(), person.phone.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("event=person_upsert module=store status=ok mode=insert id={id}");
        Ok(id)
    }

    fn replace(&self, id: PersonId, person: &Person) -> StoreResult<PersonId> {
        let changed = self.conn.execute(
            "UPDATE person SET name = ?1, phone = ?2 WHERE id = ?3;",
            params![person.name.as_str(), person.phone.as_str(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        info!("event=person_upsert module=store status=ok mode=update id={id}");
        Ok(id)
    }
}

impl PersonStore for SqlitePersonStore {
    fn upsert(&self, person: &Person) -> StoreResult<PersonId> {
        person.validate()?;
        match person.id {
            None => self.insert(person),
            Some(id) => self.replace(id, person),
        }
    }

    fn delete(&self, person: &Person) -> StoreResult<bool> {
        let changed = match person.id {
            Some(id) => self.conn.execute(
                "DELETE FROM person WHERE id = ?1 AND name = ?2 AND phone = ?3;",
                params![id, person.name.as_str(), person.phone.as_str()],
            )?,
            None => {
                let oldest: Option<PersonId> = self
                    .conn
                    .query_row(
                        "SELECT id FROM person WHERE name = ?1 AND phone = ?2 ORDER BY id ASC LIMIT 1;",
                        params![person.name.as_str(), person.phone.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                match oldest {
                    Some(id) => self
                        .conn
                        .execute("DELETE FROM person WHERE id = ?1;", [id])?,
                    None => 0,
                }
            }
        };

        if changed == 0 {
            debug!("event=person_delete module=store status=noop");
            return Ok(false);
        }
        info!("event=person_delete module=store status=ok removed={changed}");
        Ok(true)
    }

    fn list_all(&self) -> StoreResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }
        Ok(people)
    }
}

fn parse_person_row(row: &Row<'_>) -> StoreResult<Person> {
    let id: PersonId = row.get("id")?;
    let name: Option<String> = row.get("name")?;
    let phone: Option<String> = row.get("phone")?;
    match (name, phone) {
        (Some(name), Some(phone)) => Ok(Person::with_id(id, name, phone)),
        _ => Err(StoreError::InvalidData(format!(
            "person row {id} has NULL name or phone"
        ))),
    }
}
