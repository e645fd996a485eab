//! Subscription records, one per store.

pub mod entity;
