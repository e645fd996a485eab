use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mockable::DefaultClock;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::actor_framework::{Entity, ResourceActor, ResourceClient};
use crate::app_system::MarketConfig;
use crate::clients::{
    CartSession, EntitlementClient, OrderClient, ProductClient, Repositories, SharedClock, ShippingClient,
    StoreClient, SubscriptionClient, UserClient,
};
use crate::error::{MarketError, MarketResult};

/// The main application system that orchestrates all actors.
///
/// Responsible for starting up actors, wiring the clients together, and
/// handling shutdown. Must be created inside a tokio runtime.
pub struct MarketSystem {
    pub users: UserClient,
    pub stores: StoreClient,
    pub products: ProductClient,
    pub orders: OrderClient,
    pub shipping: ShippingClient,
    pub subscriptions: SubscriptionClient,
    pub entitlement: EntitlementClient,
    repositories: Repositories,
    handles: Vec<JoinHandle<()>>,
}

impl MarketSystem {
    pub fn new(config: &MarketConfig) -> Self {
        Self::with_clock(config, Arc::new(DefaultClock))
    }

    pub fn with_clock(config: &MarketConfig, clock: SharedClock) -> Self {
        let mut handles = Vec::with_capacity(6);
        let buffer = config.channel_buffer;

        // 1. Repositories
        let repositories = Repositories {
            users: spawn_repository(buffer, "user", &mut handles),
            stores: spawn_repository(buffer, "store", &mut handles),
            products: spawn_repository(buffer, "product", &mut handles),
            orders: spawn_repository(buffer, "order", &mut handles),
            shipping: spawn_repository(buffer, "shipping", &mut handles),
            subscriptions: spawn_repository(buffer, "subscription", &mut handles),
        };

        // 2. Clients, leaves first
        let entitlement = EntitlementClient::new(&repositories, clock.clone());
        let users = UserClient::new(repositories.users.clone(), clock);
        let subscriptions = SubscriptionClient::new(&repositories, entitlement.clone());
        let products = ProductClient::new(&repositories, entitlement.clone());
        let orders = OrderClient::new(&repositories, products.clone(), entitlement.clone());
        let shipping = ShippingClient::new(&repositories, orders.clone(), entitlement.clone());
        let stores = StoreClient::new(
            &repositories,
            users.clone(),
            subscriptions.clone(),
            entitlement.clone(),
            config.max_stores_per_user,
        );

        info!(channel_buffer = buffer, "Market system started");
        Self {
            users,
            stores,
            products,
            orders,
            shipping,
            subscriptions,
            entitlement,
            repositories,
            handles,
        }
    }

    /// Starts an empty cart for a buyer store.
    pub fn open_cart(&self, buyer_store_id: impl Into<String>) -> CartSession {
        CartSession::new(
            buyer_store_id,
            self.products.clone(),
            self.orders.clone(),
            self.entitlement.clone(),
        )
    }

    pub async fn shutdown(self) -> MarketResult<()> {
        info!("Shutting down system...");
        self.repositories.shutdown().await;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Actor task failed");
                return Err(MarketError::ActorCommunication(format!("Actor task failed: {e}")));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

fn spawn_repository<T>(buffer: usize, prefix: &'static str, handles: &mut Vec<JoinHandle<()>>) -> ResourceClient<T>
where
    T: Entity<Id = String>,
{
    let counter = Arc::new(AtomicU64::new(1));
    let next_id = move || {
        let id = counter.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}_{id}")
    };
    let (actor, client) = ResourceActor::<T>::new(buffer, next_id);
    handles.push(tokio::spawn(actor.run()));
    client
}
