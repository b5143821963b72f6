//! Mobile-facing bindings for the phonebook core.

pub mod api;
