use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{Repositories, SharedClock};
use crate::domain::{Operation, Store, StoreStatus, Subscription, SubscriptionStatus};
use crate::error::{MarketError, MarketResult};

/// Decides whether a store may perform a gated operation right now.
///
/// Expiry is computed from the injected clock on every call; nothing
/// needs to run in the background for a lapsed subscription to block.
#[derive(Clone)]
pub struct EntitlementClient {
    subscriptions: ResourceClient<Subscription>,
    stores: ResourceClient<Store>,
    clock: SharedClock,
}

impl EntitlementClient {
    pub fn new(repositories: &Repositories, clock: SharedClock) -> Self {
        Self {
            subscriptions: repositories.subscriptions.clone(),
            stores: repositories.stores.clone(),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// The stored subscription of a store, without status reconciliation.
    pub async fn subscription_for(&self, store_id: &str) -> MarketResult<Subscription> {
        let id = store_id.to_string();
        self.subscriptions
            .list(move |s: &Subscription| s.store_id == id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketError::not_found("Subscription", store_id))
    }

    #[instrument(skip(self))]
    pub async fn status(&self, store_id: &str) -> MarketResult<SubscriptionStatus> {
        Ok(self.subscription_for(store_id).await?.effective_status(self.now()))
    }

    /// Admits `store_id` to `operation` or returns the denial.
    ///
    /// Returns the store so callers can apply role checks without a second
    /// lookup.
    #[instrument(skip(self))]
    pub async fn guard(&self, store_id: &str, operation: Operation) -> MarketResult<Store> {
        let result = self.check(store_id).await;
        match &result {
            Ok(_) => debug!("Entitlement granted"),
            Err(e) => warn!(error = %e, "Entitlement denied"),
        }
        result
    }

    /// True when `store_id` is currently blocked from gated operations.
    #[instrument(skip(self))]
    pub async fn is_gated(&self, store_id: &str) -> MarketResult<bool> {
        match self.check(store_id).await {
            Ok(_) => Ok(false),
            Err(e) if e.is_entitlement_denial() => Ok(true),
            Err(e) => Err(e),
        }
    }

    async fn check(&self, store_id: &str) -> MarketResult<Store> {
        let store = self.stores.require(store_id.to_string()).await?;
        if store.status == StoreStatus::Suspended {
            return Err(MarketError::StoreSuspended {
                store_id: store.id,
            });
        }
        if store.policy().entitlement_exempt {
            return Ok(store);
        }

        let subscription = self.subscription_for(store_id).await?;
        match subscription.effective_status(self.now()) {
            SubscriptionStatus::Active => Ok(store),
            SubscriptionStatus::Expired => Err(MarketError::SubscriptionExpired {
                store_id: store.id,
                end_date: subscription.end_date,
            }),
            SubscriptionStatus::PendingPayment => Err(MarketError::SubscriptionPendingPayment {
                store_id: store.id,
            }),
        }
    }
}
