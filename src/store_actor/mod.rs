//! Stores and their administrative status transitions.

mod actions;
pub mod entity;

pub use actions::*;
