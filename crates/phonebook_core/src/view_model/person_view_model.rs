//! Observable contact list and the commands that mutate it.
//!
//! # Responsibility
//! - Hold the current `PeopleState` snapshot derived from the repository.
//! - Fan snapshots out to explicit subscriptions (`observe_all`).
//! - Turn repository failures into a user-visible `ListPhase::Failed`.
//!
//! # Invariants
//! - A mutation, its refresh and its publish run under one command lock, so
//!   a caller returning from `upsert_person`/`delete_person` has already had
//!   the fresh list delivered to every subscriber.
//! - `PeopleState::version` increases by one per publish, in command order.
//! - A failure keeps the last good `people` list.

use crate::model::person::{Person, PersonId};
use crate::repo::person_repo::{PersonRepository, RepoError, RepoResult};
use log::{debug, info, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Lifecycle of the published list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    /// No snapshot has been loaded yet.
    Loading,
    /// `people` reflects the store after the latest command.
    Ready,
    /// The latest command or refresh failed; `people` is the last good list.
    Failed { message: String },
}

/// Snapshot delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeopleState {
    pub version: u64,
    pub people: Vec<Person>,
    pub phase: ListPhase,
}

impl PeopleState {
    fn loading() -> Self {
        Self {
            version: 0,
            people: Vec::new(),
            phase: ListPhase::Loading,
        }
    }

    /// Returns the failure message when the phase is `Failed`.
    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            ListPhase::Failed { message } => Some(message.as_str()),
            ListPhase::Loading | ListPhase::Ready => None,
        }
    }
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    senders: Vec<(u64, Sender<PeopleState>)>,
}

struct Shared {
    state: Mutex<PeopleState>,
    subscribers: Mutex<Subscribers>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, PeopleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// View-model for register and list/delete screens.
pub struct PersonViewModel {
    repo: PersonRepository,
    commands: Mutex<()>,
    shared: Arc<Shared>,
}

impl PersonViewModel {
    /// Builds the view-model around an injected repository and loads the
    /// first snapshot.
    ///
    /// A failed initial load is published as `ListPhase::Failed`; it does not
    /// prevent construction.
    pub fn new(repo: PersonRepository) -> Self {
        let view_model = Self {
            repo,
            commands: Mutex::new(()),
            shared: Arc::new(Shared {
                state: Mutex::new(PeopleState::loading()),
                subscribers: Mutex::new(Subscribers::default()),
            }),
        };
        let _ = view_model.refresh();
        view_model
    }

    /// Subscribes to list snapshots.
    ///
    /// The current snapshot is delivered first, followed by every later one.
    pub fn observe_all(&self) -> PeopleSubscription {
        let state = self.shared.state();
        let mut subscribers = self.shared.subscribers();
        let (sender, updates) = mpsc::channel();
        // Receiver is alive here, so the initial send cannot fail.
        let _ = sender.send(state.clone());
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.senders.push((id, sender));
        debug!(
            "event=vm_subscribe module=view_model status=ok subscription={id} subscribers={}",
            subscribers.senders.len()
        );

        PeopleSubscription {
            id,
            updates,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Returns the latest published snapshot.
    pub fn snapshot(&self) -> PeopleState {
        self.shared.state().clone()
    }

    /// Inserts or replaces `person`, then republishes the list.
    ///
    /// Returns the affected id. If the write succeeds but the refresh fails,
    /// the id is still returned and the failure is published as
    /// `ListPhase::Failed`.
    pub fn upsert_person(&self, person: &Person) -> RepoResult<PersonId> {
        let _guard = self.lock_commands();
        let id = self
            .repo
            .upsert(person)
            .map_err(|err| self.publish_failure("upsert", err))?;
        info!("event=vm_upsert module=view_model status=ok id={id}");
        if let Err(err) = self.refresh_locked() {
            warn!("event=vm_upsert module=view_model status=stale id={id} error={err}");
        }
        Ok(id)
    }

    /// Registers a new person from raw form input.
    pub fn add_person(
        &self,
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> RepoResult<PersonId> {
        self.upsert_person(&Person::new(name, phone))
    }

    /// Deletes `person`, then republishes the list.
    ///
    /// Returns `Ok(false)` without publishing when no record matched.
    pub fn delete_person(&self, person: &Person) -> RepoResult<bool> {
        let _guard = self.lock_commands();
        let removed = self
            .repo
            .delete(person)
            .map_err(|err| self.publish_failure("delete", err))?;
        if !removed {
            debug!("event=vm_delete module=view_model status=noop");
            return Ok(false);
        }
        info!(
            "event=vm_delete module=view_model status=ok id={}",
            person.id.map_or_else(|| "none".to_string(), |id| id.to_string())
        );
        if let Err(err) = self.refresh_locked() {
            warn!("event=vm_delete module=view_model status=stale error={err}");
        }
        Ok(true)
    }

    /// Reloads the list from the repository and publishes it.
    pub fn refresh(&self) -> RepoResult<()> {
        let _guard = self.lock_commands();
        self.refresh_locked()
    }

    fn refresh_locked(&self) -> RepoResult<()> {
        let people = self
            .repo
            .list_all()
            .map_err(|err| self.publish_failure("refresh", err))?;
        let count = people.len();
        let version = self.publish(|state| {
            state.people = people;
            state.phase = ListPhase::Ready;
        });
        debug!("event=vm_refresh module=view_model status=ok version={version} count={count}");
        Ok(())
    }

    fn publish_failure(&self, op: &str, err: RepoError) -> RepoError {
        let message = err.to_string();
        warn!("event=vm_{op} module=view_model status=error error={message}");
        self.publish(|state| state.phase = ListPhase::Failed { message });
        err
    }

    fn publish(&self, update: impl FnOnce(&mut PeopleState)) -> u64 {
        let mut state = self.shared.state();
        update(&mut *state);
        state.version += 1;

        let mut subscribers = self.shared.subscribers();
        subscribers
            .senders
            .retain(|(_, sender)| sender.send(state.clone()).is_ok());
        state.version
    }

    fn lock_commands(&self) -> MutexGuard<'_, ()> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live handle on the contact list; unsubscribes on drop.
pub struct PeopleSubscription {
    id: u64,
    updates: Receiver<PeopleState>,
    shared: Weak<Shared>,
}

impl PeopleSubscription {
    /// Blocks for the next snapshot; `None` once the view-model is gone.
    pub fn recv(&self) -> Option<PeopleState> {
        self.updates.recv().ok()
    }

    /// Waits up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<PeopleState, RecvTimeoutError> {
        self.updates.recv_timeout(timeout)
    }

    /// Drains queued snapshots and returns the newest, if any.
    pub fn try_latest(&self) -> Option<PeopleState> {
        self.updates.try_iter().last()
    }

    /// Reads the view-model's current snapshot without consuming the queue.
    pub fn current(&self) -> Option<PeopleState> {
        self.shared.upgrade().map(|shared| shared.state().clone())
    }

    /// Ends the subscription explicitly; equivalent to dropping it.
    pub fn unsubscribe(self) {}
}

impl Drop for PeopleSubscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            let id = self.id;
            shared
                .subscribers()
                .senders
                .retain(|(subscription, _)| *subscription != id);
            debug!("event=vm_unsubscribe module=view_model status=ok subscription={id}");
        }
    }
}
