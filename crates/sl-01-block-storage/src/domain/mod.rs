//! Domain layer for block storage.

pub mod entities;
pub mod errors;
pub mod keys;
