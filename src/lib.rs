//! Transaction and entitlement engine for a produce marketplace.
//!
//! Farmers and retailers list produce, wholesalers and retailers buy it,
//! transport stores carry it. Every store trades under a time-boxed
//! subscription checked lazily on each gated command.
//!
//! Each entity family is owned by one [`actor_framework::ResourceActor`];
//! the typed clients in [`clients`] orchestrate them and
//! [`app_system::MarketSystem`] wires everything together.

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod error;

pub mod order_actor;
pub mod product_actor;
pub mod shipping_actor;
pub mod store_actor;
pub mod subscription_actor;
pub mod user_actor;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;
#[cfg(test)]
mod test_support;
