//! Repository layer between the view-model and entity stores.
//!
//! # Responsibility
//! - Hide the storage technology behind a stable, async-capable handle.
//! - Serialize every store command through one background worker.
//!
//! # Invariants
//! - Commands are applied in the order they are submitted.
//! - No store logic lives here; every call forwards one-to-one.

pub mod person_repo;
