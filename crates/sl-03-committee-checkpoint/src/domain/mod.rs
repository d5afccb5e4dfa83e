//! Domain layer for committee checkpoints.

pub mod checkpoint;
pub mod errors;
