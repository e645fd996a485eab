//! User accounts. Registration and profile edits only; users never trade.

pub mod entity;
