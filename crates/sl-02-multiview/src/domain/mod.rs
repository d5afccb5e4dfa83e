//! Domain layer for the multiview store.

pub mod errors;
pub mod invariants;
