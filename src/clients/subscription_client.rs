use tracing::{error, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{EntitlementClient, Repositories};
use crate::domain::{
    Plan, PlanId, Store, Subscription, SubscriptionCreate, SubscriptionPatch, PLANS,
};
use crate::error::{MarketError, MarketResult};
use crate::store_actor::StoreAction;

/// Client for the Subscription actor.
///
/// Reads come back with `status` reconciled against the current time.
#[derive(Clone)]
pub struct SubscriptionClient {
    inner: ResourceClient<Subscription>,
    stores: ResourceClient<Store>,
    entitlement: EntitlementClient,
}

impl SubscriptionClient {
    pub fn new(repositories: &Repositories, entitlement: EntitlementClient) -> Self {
        Self {
            inner: repositories.subscriptions.clone(),
            stores: repositories.stores.clone(),
            entitlement,
        }
    }

    pub fn list_plans(&self) -> Vec<Plan> {
        PLANS.to_vec()
    }

    /// Opens the free trial for a newly created store.
    #[instrument(skip(self))]
    pub(crate) async fn start_trial(&self, store_id: &str) -> MarketResult<Subscription> {
        let payload = SubscriptionCreate {
            store_id: store_id.to_string(),
            plan_id: PlanId::Free30,
            now: self.entitlement.now(),
        };
        let wanted = store_id.to_string();
        match self
            .inner
            .create_unique(payload, move |s: &Subscription| s.store_id == wanted)
            .await
        {
            Ok(subscription) => {
                info!(subscription_id = %subscription.id, end_date = %subscription.end_date, "Trial started");
                Ok(subscription)
            }
            Err(MarketError::Duplicate { .. }) => Err(MarketError::Duplicate {
                field: "subscription".to_string(),
                value: store_id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_subscription(&self, store_id: &str) -> MarketResult<Subscription> {
        let subscription = self.entitlement.subscription_for(store_id).await?;
        Ok(subscription.as_of(self.entitlement.now()))
    }

    #[instrument(skip(self))]
    pub async fn list_subscriptions(&self) -> MarketResult<Vec<Subscription>> {
        let now = self.entitlement.now();
        let all = self.inner.list_all().await?;
        Ok(all.into_iter().map(|s| s.as_of(now)).collect())
    }

    /// Whole days left on the store's current period.
    #[instrument(skip(self))]
    pub async fn days_remaining(&self, store_id: &str) -> MarketResult<i64> {
        let subscription = self.entitlement.subscription_for(store_id).await?;
        Ok(subscription.days_remaining(self.entitlement.now()))
    }

    /// Replaces the store's subscription with a fresh period of `plan_id`
    /// starting now. Unused time is not carried over.
    ///
    /// A suspended store stays suspended.
    #[instrument(skip(self))]
    pub async fn select_plan(&self, store_id: &str, plan_id: PlanId) -> MarketResult<Subscription> {
        let store = self.stores.require(store_id.to_string()).await?;
        let current = self.entitlement.subscription_for(store_id).await?;
        let renewed = Subscription::starting(current.id, store.id.clone(), plan_id, self.entitlement.now());

        self.inner.upsert(renewed.clone()).await?;
        self.reflect_on_store(&renewed).await?;

        info!(end_date = %renewed.end_date, "Plan selected");
        Ok(renewed)
    }

    /// Administrative override of end date or stored status.
    #[instrument(skip(self))]
    pub async fn update_subscription(
        &self,
        store_id: &str,
        patch: SubscriptionPatch,
    ) -> MarketResult<Subscription> {
        let current = self.entitlement.subscription_for(store_id).await?;
        let updated = self.inner.update(current.id, patch).await?;
        self.reflect_on_store(&updated).await?;
        warn!(end_date = %updated.end_date, status = %updated.status, "Subscription overridden");
        Ok(updated.as_of(self.entitlement.now()))
    }

    async fn reflect_on_store(&self, subscription: &Subscription) -> MarketResult<()> {
        let status = subscription.effective_status(self.entitlement.now());
        self.stores
            .perform_action(subscription.store_id.clone(), StoreAction::ReflectSubscription(status))
            .await
            .map(|_| ())
            .map_err(|e| {
                error!(error = %e, "Store status sync failed");
                e
            })
    }
}
