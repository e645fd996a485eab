//! Order lifecycle state machine.

mod actions;
pub mod entity;

pub use actions::*;
