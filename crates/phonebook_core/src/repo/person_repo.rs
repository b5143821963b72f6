//! Person repository backed by a dedicated store worker thread.
//!
//! # Responsibility
//! - Own the entity store on a background thread so storage I/O never runs on
//!   the caller's (UI) thread unless the caller chooses to wait.
//! - Expose `upsert`/`delete`/`list_all` both as blocking calls and as
//!   `Ticket` submissions.
//!
//! # Invariants
//! - A single FIFO channel feeds a single worker: commands never reorder.
//! - Store errors are returned as `RepoError::Store`, never as panics.
//! - Dropping the repository drains queued commands and joins the worker.

use crate::model::person::{Person, PersonId};
use crate::store::{PersonStore, StoreError, StoreResult};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "phonebook-store";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository-level failure.
#[derive(Debug)]
pub enum RepoError {
    /// The store rejected or failed the command.
    Store(StoreError),
    /// The worker thread could not be started.
    WorkerSpawn(std::io::Error),
    /// The worker stopped before answering.
    WorkerGone,
}

impl RepoError {
    /// Returns whether the failure came from storage rather than input.
    pub fn is_storage_failure(&self) -> bool {
        match self {
            Self::Store(err) => err.is_storage_failure(),
            Self::WorkerSpawn(_) | Self::WorkerGone => true,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::WorkerSpawn(err) => write!(f, "failed to start store worker: {err}"),
            Self::WorkerGone => write!(f, "store worker is no longer running"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::WorkerSpawn(err) => Some(err),
            Self::WorkerGone => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

enum Command {
    Upsert {
        person: Person,
        reply: Sender<StoreResult<PersonId>>,
    },
    Delete {
        person: Person,
        reply: Sender<StoreResult<bool>>,
    },
    ListAll {
        reply: Sender<StoreResult<Vec<Person>>>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Upsert { .. } => "upsert",
            Self::Delete { .. } => "delete",
            Self::ListAll { .. } => "list_all",
        }
    }
}

/// Pending result of a submitted repository command.
#[must_use = "a ticket must be waited on or polled to observe the command result"]
pub struct Ticket<T> {
    reply: Receiver<StoreResult<T>>,
}

impl<T> Ticket<T> {
    /// Blocks until the worker has applied the command.
    pub fn wait(self) -> RepoResult<T> {
        match self.reply.recv() {
            Ok(result) => result.map_err(RepoError::from),
            Err(_) => Err(RepoError::WorkerGone),
        }
    }

    /// Returns the result if ready, or hands the ticket back.
    pub fn poll(self) -> Result<RepoResult<T>, Self> {
        match self.reply.try_recv() {
            Ok(result) => Ok(result.map_err(RepoError::from)),
            Err(TryRecvError::Empty) => Err(self),
            Err(TryRecvError::Disconnected) => Ok(Err(RepoError::WorkerGone)),
        }
    }
}

/// Async-capable repository handle over a `PersonStore`.
pub struct PersonRepository {
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl PersonRepository {
    /// Moves `store` onto a new worker thread and returns its handle.
    ///
    /// # Errors
    /// - `RepoError::WorkerSpawn` when the OS refuses the thread.
    pub fn spawn<S>(store: S) -> RepoResult<Self>
    where
        S: PersonStore + Send + 'static,
    {
        let (commands, inbox) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(store, inbox))
            .map_err(RepoError::WorkerSpawn)?;
        info!("event=repo_start module=repo status=ok thread={WORKER_THREAD_NAME}");

        Ok(Self {
            commands: Some(commands),
            worker: Some(worker),
        })
    }

    /// Queues an upsert; see `PersonStore::upsert`.
    pub fn submit_upsert(&self, person: Person) -> RepoResult<Ticket<PersonId>> {
        self.submit(|reply| Command::Upsert { person, reply })
    }

    /// Queues a delete; see `PersonStore::delete`.
    pub fn submit_delete(&self, person: Person) -> RepoResult<Ticket<bool>> {
        self.submit(|reply| Command::Delete { person, reply })
    }

    /// Queues a full listing.
    pub fn submit_list_all(&self) -> RepoResult<Ticket<Vec<Person>>> {
        self.submit(|reply| Command::ListAll { reply })
    }

    /// Inserts or replaces `person` and returns its id.
    pub fn upsert(&self, person: &Person) -> RepoResult<PersonId> {
        self.submit_upsert(person.clone())?.wait()
    }

    /// Removes the matching record; `Ok(false)` when nothing matched.
    pub fn delete(&self, person: &Person) -> RepoResult<bool> {
        self.submit_delete(person.clone())?.wait()
    }

    /// Lists every record in insertion order.
    pub fn list_all(&self) -> RepoResult<Vec<Person>> {
        self.submit_list_all()?.wait()
    }

    fn submit<T>(
        &self,
        build: impl FnOnce(Sender<StoreResult<T>>) -> Command,
    ) -> RepoResult<Ticket<T>> {
        let commands = self.commands.as_ref().ok_or(RepoError::WorkerGone)?;
        let (reply, ticket) = mpsc::channel();
        commands
            .send(build(reply))
            .map_err(|_| RepoError::WorkerGone)?;
        Ok(Ticket { reply: ticket })
    }
}

impl Drop for PersonRepository {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish queued commands and exit.
        drop(self.commands.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=repo_stop module=repo status=error error_code=worker_panicked");
                return;
            }
        }
        info!("event=repo_stop module=repo status=ok");
    }
}

fn run_worker<S: PersonStore>(store: S, inbox: Receiver<Command>) {
    for command in inbox {
        let started_at = Instant::now();
        let name = command.name();
        let delivered = match command {
            Command::Upsert { person, reply } => {
                let result = store.upsert(&person);
                log_outcome(name, &result, started_at);
                reply.send(result).is_ok()
            }
            Command::Delete { person, reply } => {
                let result = store.delete(&person);
                log_outcome(name, &result, started_at);
                reply.send(result).is_ok()
            }
            Command::ListAll { reply } => {
                let result = store.list_all();
                log_outcome(name, &result, started_at);
                reply.send(result).is_ok()
            }
        };
        if !delivered {
            debug!("event=repo_command module=repo status=detached op={name}");
        }
    }
}

fn log_outcome<T>(op: &str, result: &StoreResult<T>, started_at: Instant) {
    match result {
        Ok(_) => debug!(
            "event=repo_command module=repo status=ok op={op} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) if err.is_storage_failure() => error!(
            "event=repo_command module=repo status=error op={op} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=repo_command module=repo status=rejected op={op} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{PersonRepository, RepoError};
    use crate::model::person::Person;
    use crate::store::{MemoryPersonStore, PersonStore, StoreError, StoreResult};

    struct FailingStore;

    impl PersonStore for FailingStore {
        fn upsert(&self, _person: &Person) -> StoreResult<i64> {
            Err(StoreError::InvalidData("broken".to_string()))
        }

        fn delete(&self, _person: &Person) -> StoreResult<bool> {
            Err(StoreError::InvalidData("broken".to_string()))
        }

        fn list_all(&self) -> StoreResult<Vec<Person>> {
            Err(StoreError::InvalidData("broken".to_string()))
        }
    }

    #[test]
    fn submitted_commands_apply_in_order() {
        let repo = PersonRepository::spawn(MemoryPersonStore::new()).unwrap();

        let first = repo.submit_upsert(Person::new("A", "1")).unwrap();
        let second = repo.submit_upsert(Person::new("B", "2")).unwrap();
        let removal = repo.submit_delete(Person::with_id(1, "A", "1")).unwrap();
        let listing = repo.submit_list_all().unwrap();

        assert_eq!(first.wait().unwrap(), 1);
        assert_eq!(second.wait().unwrap(), 2);
        assert!(removal.wait().unwrap());
        assert_eq!(listing.wait().unwrap(), vec![Person::with_id(2, "B", "2")]);
    }

    #[test]
    fn poll_eventually_yields_result() {
        let repo = PersonRepository::spawn(MemoryPersonStore::new()).unwrap();
        let mut ticket = repo.submit_upsert(Person::new("A", "1")).unwrap();
        let result = loop {
            match ticket.poll() {
                Ok(result) => break result,
                Err(pending) => {
                    ticket = pending;
                    std::thread::yield_now();
                }
            }
        };
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn store_failures_surface_as_typed_errors() {
        let repo = PersonRepository::spawn(FailingStore).unwrap();
        let err = repo.list_all().unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::InvalidData(_))));
        assert!(err.is_storage_failure());
    }

    #[test]
    fn boxed_stores_can_be_swapped_in() {
        let store: Box<dyn PersonStore + Send> = Box::new(MemoryPersonStore::new());
        let repo = PersonRepository::spawn(store).unwrap();
        let id = repo.upsert(&Person::new("A", "1")).unwrap();
        assert!(repo.delete(&Person::with_id(id, "A", "1")).unwrap());
        assert!(!repo.delete(&Person::with_id(id, "A", "1")).unwrap());
    }

    #[test]
    fn validation_errors_are_not_storage_failures() {
        let repo = PersonRepository::spawn(MemoryPersonStore::new()).unwrap();
        let err = repo.upsert(&Person::new("", "1")).unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Validation(_))));
        assert!(!err.is_storage_failure());
    }
}
