//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `phonebook_core` linkage and the store -> repository ->
//!   view-model wiring without any UI runtime.
//! - Keep output deterministic for quick local sanity checks.

use phonebook_core::{
    init_from_config, MemoryPersonStore, PeopleState, PersonRepository, PersonViewModel,
    PhonebookConfig, RepoResult,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("phonebook_core ping={}", phonebook_core::ping());
    println!("phonebook_core version={}", phonebook_core::core_version());

    if let Err(err) = init_from_config(&PhonebookConfig::from_env()) {
        eprintln!("logging disabled: {err}");
    }

    match run_scenario() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scenario failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_scenario() -> RepoResult<()> {
    let view_model = PersonViewModel::new(PersonRepository::spawn(MemoryPersonStore::new())?);
    let subscription = view_model.observe_all();

    view_model.add_person("Ana", "111")?;
    view_model.add_person("Bob", "222")?;
    let listed = view_model.snapshot();
    print_state("after insert", &listed);

    if let Some(ana) = listed.people.first() {
        view_model.delete_person(ana)?;
    }
    print_state("after delete", &view_model.snapshot());

    let delivered = subscription.try_latest().map_or(0, |state| state.version);
    println!("observer last_version={delivered}");
    Ok(())
}

fn print_state(label: &str, state: &PeopleState) {
    println!("{label} version={} count={}", state.version, state.people.len());
    for person in &state.people {
        println!(
            "  id={} name={} phone={}",
            person.id.unwrap_or_default(),
            person.name,
            person.phone
        );
    }
}
