//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Own the process composition root: one explicitly opened view-model.
//! - Expose register/list/delete/observe use-cases as plain envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Nothing touches storage before `people_open` succeeds.
//! - Contact fields are never written to logs.

use log::info;
use phonebook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    open_person_view_model, ping as ping_inner, ListPhase, PeopleState, Person, PersonViewModel,
    PhonebookConfig,
};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

const WAIT_TIMEOUT_MAX_MS: u32 = 60_000;

static PHONEBOOK: OnceLock<Phonebook> = OnceLock::new();

struct Phonebook {
    db_path: PathBuf,
    view_model: PersonViewModel,
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path for rolling logs.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One contact row for list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonItem {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

/// Snapshot envelope for list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeopleListResponse {
    /// Rows in insertion order.
    pub items: Vec<PersonItem>,
    /// Monotonic snapshot version; pass back to `people_wait_for_change`.
    pub version: u64,
    /// `loading|ready|failed|closed`.
    pub phase: String,
    /// User-visible failure message; empty unless `phase == "failed"`.
    pub message: String,
}

impl PeopleListResponse {
    fn closed(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            version: 0,
            phase: "closed".to_string(),
            message: message.into(),
        }
    }
}

/// Result envelope for register/delete commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonActionResponse {
    pub ok: bool,
    /// Id of the created or deleted record, when known.
    pub person_id: Option<i64>,
    /// Delete only: whether a record was actually removed.
    pub removed: bool,
    pub message: String,
}

impl PersonActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            person_id: None,
            removed: false,
            message: message.into(),
        }
    }
}

/// Opens the contact database and builds the view-model.
///
/// Path resolution: `db_path` argument, then `PHONEBOOK_DB_PATH`, then
/// `<temp_dir>/pessoa.db`.
///
/// # FFI contract
/// - Sync call; performs file-system and migration work on first call.
/// - Idempotent for the same path; a different path is rejected.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn people_open(db_path: Option<String>) -> String {
    let requested = resolve_db_path(db_path);
    if let Some(existing) = PHONEBOOK.get() {
        return check_same_path(existing, &requested);
    }

    let view_model = match open_person_view_model(&requested) {
        Ok(view_model) => view_model,
        Err(err) => return format!("people_open failed: {err}"),
    };
    let opened = PHONEBOOK.get_or_init(|| Phonebook {
        db_path: requested.clone(),
        view_model,
    });
    info!("event=ffi_open module=ffi status=ok");
    check_same_path(opened, &requested)
}

/// Returns the current contact list snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn people_list() -> PeopleListResponse {
    match PHONEBOOK.get() {
        Some(phonebook) => to_list_response(phonebook.view_model.snapshot()),
        None => PeopleListResponse::closed(not_open_message()),
    }
}

/// Registers a person from form input (fields are trimmed).
#[flutter_rust_bridge::frb(sync)]
pub fn people_add(name: String, phone: String) -> PersonActionResponse {
    let Some(phonebook) = PHONEBOOK.get() else {
        return PersonActionResponse::failure(not_open_message());
    };
    match phonebook
        .view_model
        .add_person(name.trim(), phone.trim())
    {
        Ok(id) => PersonActionResponse {
            ok: true,
            person_id: Some(id),
            removed: false,
            message: "Person registered.".to_string(),
        },
        Err(err) => PersonActionResponse::failure(format!("people_add failed: {err}")),
    }
}

/// Deletes the row exactly as rendered by the list screen.
///
/// A row that no longer exists is reported as `ok=true, removed=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn people_delete(id: i64, name: String, phone: String) -> PersonActionResponse {
    let Some(phonebook) = PHONEBOOK.get() else {
        return PersonActionResponse::failure(not_open_message());
    };
    match phonebook
        .view_model
        .delete_person(&Person::with_id(id, name, phone))
    {
        Ok(removed) => PersonActionResponse {
            ok: true,
            person_id: Some(id),
            removed,
            message: if removed {
                "Person deleted.".to_string()
            } else {
                "Person was already removed.".to_string()
            },
        },
        Err(err) => PersonActionResponse::failure(format!("people_delete failed: {err}")),
    }
}

/// Blocks until a snapshot newer than `since_version` is published or the
/// timeout (capped at 60s) elapses, then returns the latest snapshot.
///
/// # FFI contract
/// - Async (worker-pool) call; never run on the UI isolate synchronously.
pub fn people_wait_for_change(since_version: u64, timeout_ms: u32) -> PeopleListResponse {
    let Some(phonebook) = PHONEBOOK.get() else {
        return PeopleListResponse::closed(not_open_message());
    };

    let subscription = phonebook.view_model.observe_all();
    let deadline =
        Instant::now() + Duration::from_millis(u64::from(timeout_ms.min(WAIT_TIMEOUT_MAX_MS)));
    let mut latest = phonebook.view_model.snapshot();
    while latest.version <= since_version {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match subscription.recv_timeout(remaining) {
            Ok(state) => latest = state,
            Err(_) => break,
        }
    }
    to_list_response(latest)
}

fn resolve_db_path(db_path: Option<String>) -> PathBuf {
    match db_path.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PhonebookConfig::from_env().db_path,
    }
}

fn check_same_path(phonebook: &Phonebook, requested: &Path) -> String {
    if phonebook.db_path.as_path() == requested {
        String::new()
    } else {
        format!(
            "phonebook already open at `{}`; refusing to switch to `{}`",
            phonebook.db_path.display(),
            requested.display()
        )
    }
}

fn not_open_message() -> &'static str {
    "phonebook is not open; call people_open first"
}

fn to_list_response(state: PeopleState) -> PeopleListResponse {
    let (phase, message) = match state.phase {
        ListPhase::Loading => ("loading", String::new()),
        ListPhase::Ready => ("ready", String::new()),
        ListPhase::Failed { message } => ("failed", message),
    };
    PeopleListResponse {
        items: state
            .people
            .into_iter()
            .filter_map(|person| {
                person.id.map(|id| PersonItem {
                    id,
                    name: person.name,
                    phone: person.phone,
                })
            })
            .collect(),
        version: state.version,
        phase: phase.to_string(),
        message,
    }
}
