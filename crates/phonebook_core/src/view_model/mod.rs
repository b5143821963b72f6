//! Presentation-facing state holders.
//!
//! # Responsibility
//! - Mediate between UI collaborators and the repository.
//! - Publish observable snapshots after every mutating command.
//!
//! # Invariants
//! - UI layers never talk to stores directly.

pub mod person_view_model;
