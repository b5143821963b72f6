//! Core domain logic for the phonebook app.
//! Store, repository and view-model layers live here; UI shells only call in.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod view_model;

pub use config::PhonebookConfig;
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::person::{Person, PersonId, PersonValidationError};
pub use repo::person_repo::{PersonRepository, RepoError, RepoResult, Ticket};
pub use store::{MemoryPersonStore, PersonStore, SqlitePersonStore, StoreError, StoreResult};
pub use view_model::person_view_model::{
    ListPhase, PeopleState, PeopleSubscription, PersonViewModel,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Opens the SQLite database at `path` and wires store, repository and
/// view-model together.
pub fn open_person_view_model(path: impl AsRef<std::path::Path>) -> RepoResult<PersonViewModel> {
    let conn = db::open_db(path).map_err(StoreError::from)?;
    let store = SqlitePersonStore::try_new(conn)?;
    Ok(PersonViewModel::new(PersonRepository::spawn(store)?))
}
