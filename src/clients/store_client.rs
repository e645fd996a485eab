use std::collections::HashMap;

use tracing::{error, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{cascade, EntitlementClient, Repositories, SubscriptionClient, UserClient};
use crate::domain::{
    NewStore, Order, Product, ShippingRequest, Store, StoreCreate, StorePatch, StoreType, Subscription,
};
use crate::error::{MarketError, MarketResult};
use crate::store_actor::StoreAction;

/// Client for the Store actor.
///
/// Creating a store also opens its free trial. Deleting one removes
/// everything that references it.
#[derive(Clone)]
pub struct StoreClient {
    inner: ResourceClient<Store>,
    products: ResourceClient<Product>,
    orders: ResourceClient<Order>,
    shipping: ResourceClient<ShippingRequest>,
    subscription_records: ResourceClient<Subscription>,
    users: UserClient,
    subscriptions: SubscriptionClient,
    entitlement: EntitlementClient,
    max_stores_per_user: usize,
}

impl StoreClient {
    pub fn new(
        repositories: &Repositories,
        users: UserClient,
        subscriptions: SubscriptionClient,
        entitlement: EntitlementClient,
        max_stores_per_user: usize,
    ) -> Self {
        Self {
            inner: repositories.stores.clone(),
            products: repositories.products.clone(),
            orders: repositories.orders.clone(),
            shipping: repositories.shipping.clone(),
            subscription_records: repositories.subscriptions.clone(),
            users,
            subscriptions,
            entitlement,
            max_stores_per_user,
        }
    }

    /// Opens a store for `owner_user_id` with a 30 day free trial.
    ///
    /// A user holds at most one store of each type and at most
    /// `max_stores_per_user` in total.
    #[instrument(skip(self, store), fields(name = %store.name, store_type = %store.store_type))]
    pub async fn create_store(&self, owner_user_id: &str, store: NewStore) -> MarketResult<Store> {
        let owner = self.users.get_user(owner_user_id).await?;

        let store_type = store.store_type;
        let owner_id = owner.id.clone();
        let max = self.max_stores_per_user;
        let payload = StoreCreate {
            owner_user_id: owner.id,
            store,
            created_at: self.entitlement.now(),
        };
        // Cap and one-per-type are checked in the Store actor's turn.
        let scope_owner = owner_id.clone();
        let created = match self
            .inner
            .create_within(
                payload,
                move |s: &Store| s.owner_user_id == scope_owner,
                max,
                move |s: &Store| s.store_type == store_type,
            )
            .await
        {
            Ok(created) => created,
            Err(MarketError::Validation { field: "Store", .. }) => {
                warn!(max, "Store limit reached");
                return Err(MarketError::StoreLimitReached {
                    user_id: owner_id,
                    max,
                });
            }
            Err(MarketError::Duplicate { .. }) => {
                warn!("Owner already has a store of this type");
                return Err(MarketError::Duplicate {
                    field: "store_type".to_string(),
                    value: store_type.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self.subscriptions.start_trial(&created.id).await {
            error!(error = %e, store_id = %created.id, "Trial could not start, removing store");
            if let Err(cleanup) = self.inner.delete(created.id.clone()).await {
                error!(error = %cleanup, "Store cleanup failed");
            }
            return Err(e);
        }

        info!(store_id = %created.id, "Store created");
        Ok(created)
    }

    /// The store with `status` reconciled against its subscription now.
    #[instrument(skip(self))]
    pub async fn get_store(&self, store_id: &str) -> MarketResult<Store> {
        let store = self.inner.require(store_id.to_string()).await?;
        let subscription = match self.entitlement.subscription_for(store_id).await {
            Ok(subscription) => Some(subscription),
            Err(MarketError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(self.reconcile(store, subscription.as_ref()))
    }

    #[instrument(skip(self))]
    pub async fn list_stores(&self) -> MarketResult<Vec<Store>> {
        self.list_reconciled(|_| true).await
    }

    #[instrument(skip(self))]
    pub async fn list_stores_by_owner(&self, owner_user_id: &str) -> MarketResult<Vec<Store>> {
        let id = owner_user_id.to_string();
        self.list_reconciled(move |s: &Store| s.owner_user_id == id).await
    }

    /// Stores shown in the public directory. Admin stores are never listed.
    #[instrument(skip(self))]
    pub async fn list_public_stores(&self) -> MarketResult<Vec<Store>> {
        self.list_reconciled(|s: &Store| s.store_type != StoreType::Admin).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_store(&self, store_id: &str, patch: StorePatch) -> MarketResult<Store> {
        self.inner.update(store_id.to_string(), patch).await
    }

    /// Deletes a store with its products, subscription, every order it is
    /// party to and those orders' shipping requests.
    #[instrument(skip(self))]
    pub async fn delete_store(&self, store_id: &str) -> MarketResult<Store> {
        self.inner.require(store_id.to_string()).await?;

        let id = store_id.to_string();
        let orders = cascade::purge_orders(&self.orders, &self.shipping, move |o: &Order| {
            o.buyer_store_id == id || o.seller_store_id == id
        })
        .await?;
        let id = store_id.to_string();
        let products = self.products.delete_where(move |p: &Product| p.store_id == id).await?;
        let id = store_id.to_string();
        self.subscription_records
            .delete_where(move |s: &Subscription| s.store_id == id)
            .await?;

        let removed = self.inner.delete(store_id.to_string()).await?;
        info!(products = products.len(), orders = orders.len(), "Store deleted");
        Ok(removed)
    }

    /// Admin moderation. The suspended store is blocked from every gated
    /// operation until reinstated; renewing its plan does not lift this.
    #[instrument(skip(self))]
    pub async fn suspend_store(&self, store_id: &str, admin_store_id: &str) -> MarketResult<Store> {
        self.require_admin(admin_store_id, "suspend stores").await?;
        let store = self
            .inner
            .perform_action(store_id.to_string(), StoreAction::Suspend)
            .await?;
        warn!("Store suspended");
        Ok(store)
    }

    #[instrument(skip(self))]
    pub async fn reinstate_store(&self, store_id: &str, admin_store_id: &str) -> MarketResult<Store> {
        self.require_admin(admin_store_id, "reinstate stores").await?;
        let subscription = self.entitlement.status(store_id).await?;
        let store = self
            .inner
            .perform_action(store_id.to_string(), StoreAction::Reinstate { subscription })
            .await?;
        info!(status = %store.status, "Store reinstated");
        Ok(store)
    }

    async fn require_admin(&self, admin_store_id: &str, action: &'static str) -> MarketResult<()> {
        let admin = self.inner.require(admin_store_id.to_string()).await?;
        if admin.store_type != StoreType::Admin {
            warn!(store_type = %admin.store_type, "Moderation requires an admin store");
            return Err(MarketError::denied(admin.id, action));
        }
        Ok(())
    }

    async fn list_reconciled(&self, filter: impl Fn(&Store) -> bool + Send + 'static) -> MarketResult<Vec<Store>> {
        let stores = self.inner.list(filter).await?;
        let subscriptions: HashMap<String, Subscription> = self
            .subscription_records
            .list_all()
            .await?
            .into_iter()
            .map(|s| (s.store_id.clone(), s))
            .collect();
        Ok(stores
            .into_iter()
            .map(|store| {
                let subscription = subscriptions.get(&store.id);
                self.reconcile(store, subscription)
            })
            .collect())
    }

    fn reconcile(&self, mut store: Store, subscription: Option<&Subscription>) -> Store {
        if let Some(subscription) = subscription {
            let status = subscription.effective_status(self.entitlement.now());
            store.status = store.status.reflecting(status);
        }
        store
    }
}
