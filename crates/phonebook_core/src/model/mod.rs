//! Contact-book domain model.
//!
//! # Responsibility
//! - Define the single persisted entity (`Person`) shared by store, repository
//!   and view-model layers.
//!
//! # Invariants
//! - `Person::id` is assigned by storage, never invented by callers.
//! - Name/phone duplicates are legal; identity is carried by `id` only.

pub mod person;
