use crate::actor_framework::Entity;
use crate::domain::{Subscription, SubscriptionCreate, SubscriptionPatch};
use crate::error::MarketError;

impl Entity for Subscription {
    type Id = String;
    type CreatePayload = SubscriptionCreate;
    type Patch = SubscriptionPatch;
    type Action = ();
    type ActionResult = ();
    type Error = MarketError;

    const KIND: &'static str = "Subscription";

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create(id: String, params: SubscriptionCreate) -> Result<Self, MarketError> {
        Ok(Self::starting(id, params.store_id, params.plan_id, params.now))
    }

    /// Administrative override. Dates are taken as given; an end date in the
    /// past simply makes the subscription read as expired.
    fn on_update(&mut self, patch: SubscriptionPatch) -> Result<(), MarketError> {
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), MarketError> {
        Ok(())
    }
}
