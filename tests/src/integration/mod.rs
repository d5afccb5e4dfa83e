//! # Integration Tests
//!
//! Each module drives two or more subsystems together, mostly through a
//! [`crate::fixtures::TestNode`].

pub mod checkpoints;
pub mod lifecycle;
pub mod relay;
pub mod replay;
