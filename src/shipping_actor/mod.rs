//! Shipping request state machine. Acceptance is exclusive: the first
//! transporter to be processed wins.

mod actions;
pub mod entity;

pub use actions::*;
