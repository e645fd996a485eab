//! Typed clients over the repository actors.
//!
//! Each client owns the cross-entity checks for its commands and only then
//! sends the mutation to its actor, so a rejected command leaves no trace.

use std::sync::Arc;

use mockable::Clock;

use crate::actor_framework::ResourceClient;
use crate::domain::{Order, Product, ShippingRequest, Store, Subscription, User};

#[macro_use]
mod macros;

mod cart_session;
mod cascade;
mod entitlement_client;
mod order_client;
mod product_client;
mod shipping_client;
mod store_client;
mod subscription_client;
mod user_client;

pub use cart_session::{CartSession, CheckoutReceipt, FailedLine};
pub use entitlement_client::EntitlementClient;
pub use order_client::OrderClient;
pub use product_client::ProductClient;
pub use shipping_client::ShippingClient;
pub use store_client::StoreClient;
pub use subscription_client::SubscriptionClient;
pub use user_client::UserClient;

/// Time source shared by every client.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Handles to every repository actor.
#[derive(Clone)]
pub struct Repositories {
    pub users: ResourceClient<User>,
    pub stores: ResourceClient<Store>,
    pub products: ResourceClient<Product>,
    pub orders: ResourceClient<Order>,
    pub shipping: ResourceClient<ShippingRequest>,
    pub subscriptions: ResourceClient<Subscription>,
}

impl Repositories {
    pub async fn shutdown(&self) {
        self.users.shutdown().await;
        self.stores.shutdown().await;
        self.products.shutdown().await;
        self.orders.shutdown().await;
        self.shipping.shutdown().await;
        self.subscriptions.shutdown().await;
    }
}
